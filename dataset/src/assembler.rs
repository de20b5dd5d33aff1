use std::path::Path;

use log::{info, warn};
use structures::{LabelError, LabelTable, ModelManifest, TrainingExample};

use crate::{
    batches::Batches,
    categories::{discover_categories, CategorySource},
    config::{AssemblyConfig, ReshufflePolicy},
    errors::{AssemblyError, Result},
    examples::Examples,
    report::AssemblyReport,
    shuffle::Shuffled,
};

/// Which side of the train/validation split a [`SplitIter`] yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Validation,
    Training,
}

/// Builds the example streams for one set of category files.
///
/// Every stream re-reads the files from the start, so two streams built from
/// the same assembler see exactly the same examples in the same order.
///
/// ```no_run
/// use dataset::{AssemblyConfig, Assembler};
///
/// let assembler = Assembler::from_directory("data/", AssemblyConfig::default())?;
/// for batch in assembler.batches(assembler.train_epoch(0)) {
///     println!("{} examples", batch.len());
/// }
/// # Ok::<(), dataset::AssemblyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Assembler {
    sources: Vec<CategorySource>,
    labels: LabelTable,
    config: AssemblyConfig,
}

impl Assembler {
    /// Labels the sources by sorted category name. With a configured class
    /// count, the number of sources must match it.
    pub fn new(sources: Vec<CategorySource>, config: AssemblyConfig) -> Result<Self> {
        config.validate()?;

        let names = sources.iter().map(|s| s.name.clone());
        let labels = match config.class_count {
            Some(class_count) => LabelTable::with_class_count(names, class_count)?,
            None => LabelTable::new(names)?,
        };
        let mut sources = sources;
        sources.sort();

        Ok(Self {
            sources,
            labels,
            config,
        })
    }

    /// Labels the sources with a table persisted by an earlier run, so class
    /// indices stay put when categories are added or removed on disk.
    ///
    /// Every source must be in `labels`. Categories of the table with no
    /// file are logged; they simply get no examples.
    pub fn with_labels(
        sources: Vec<CategorySource>,
        labels: LabelTable,
        config: AssemblyConfig,
    ) -> Result<Self> {
        config.validate()?;

        if let Some(expected) = config.class_count {
            if labels.len() != expected {
                return Err(LabelError::ClassCountMismatch {
                    expected,
                    actual: labels.len(),
                }
                .into());
            }
        }
        if let Some(source) = sources
            .iter()
            .find(|s| labels.index_of(&s.name).known().is_none())
        {
            return Err(AssemblyError::UnlabeledCategory(source.name.clone()));
        }

        for name in labels.names() {
            if !sources.iter().any(|s| &s.name == name) {
                warn!("category {} has a class index but no drawing file", name);
            }
        }

        let mut sources = sources;
        sources.sort();

        Ok(Self {
            sources,
            labels,
            config,
        })
    }

    /// Uses every drawing file in `dir` as a category.
    pub fn from_directory(dir: impl AsRef<Path>, config: AssemblyConfig) -> Result<Self> {
        Self::new(discover_nonempty(dir.as_ref())?, config)
    }

    /// Like [`from_directory`](Self::from_directory), keeping the class
    /// indices of `labels`.
    pub fn from_directory_with_labels(
        dir: impl AsRef<Path>,
        labels: LabelTable,
        config: AssemblyConfig,
    ) -> Result<Self> {
        Self::with_labels(discover_nonempty(dir.as_ref())?, labels, config)
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn sources(&self) -> &[CategorySource] {
        &self.sources
    }

    /// Encoding and labels a model trained on these streams must be served
    /// with.
    pub fn manifest(&self) -> ModelManifest {
        ModelManifest::new(self.config.encoding, self.labels.clone())
    }

    /// The interleaved stream before shuffling.
    pub fn examples(&self) -> Examples {
        Examples::new(&self.sources, &self.labels, &self.config)
    }

    pub fn validation_len(&self) -> usize {
        self.config.validation_len(self.sources.len())
    }

    /// The held-out examples. Identical on every call.
    pub fn validation(&self) -> SplitIter {
        self.split(Split::Validation)
    }

    /// Everything after the validation split, in base shuffle order.
    pub fn training(&self) -> SplitIter {
        self.split(Split::Training)
    }

    /// Training examples for `epoch`, ordered according to the reshuffle
    /// policy.
    pub fn train_epoch(&self, epoch: u64) -> Shuffled<SplitIter> {
        let (capacity, seed) = match self.config.reshuffle {
            ReshufflePolicy::Stable => (1, self.config.seed),
            ReshufflePolicy::PerEpoch => (
                self.config.shuffle_buffer,
                self.config.seed.wrapping_add(epoch),
            ),
        };

        Shuffled::new(self.training(), capacity, seed)
    }

    pub fn batches<I>(&self, examples: I) -> Batches<I>
    where
        I: Iterator<Item = TrainingExample>,
    {
        Batches::new(examples, self.config.batch_size, self.config.drop_remainder)
    }

    fn split(&self, split: Split) -> SplitIter {
        let stream = Shuffled::new(
            self.examples(),
            self.config.shuffle_buffer,
            self.config.seed,
        );

        let validation_len = self.validation_len();
        let (to_skip, remaining) = match split {
            Split::Validation => (0, Some(validation_len)),
            Split::Training => (validation_len, None),
        };

        SplitIter {
            stream,
            split,
            to_skip,
            remaining,
        }
    }
}

fn discover_nonempty(dir: &Path) -> Result<Vec<CategorySource>> {
    let sources = discover_categories(dir)?;
    if sources.is_empty() {
        return Err(AssemblyError::NoCategories(dir.to_path_buf()));
    }

    info!("assembling {} categories from {}", sources.len(), dir.display());
    Ok(sources)
}

/// One side of the split over the shuffled example stream.
pub struct SplitIter {
    stream: Shuffled<Examples>,
    split: Split,
    to_skip: usize,
    remaining: Option<usize>,
}

impl SplitIter {
    pub fn split(&self) -> Split {
        self.split
    }

    /// Counters for everything the underlying stream has read so far.
    pub fn report(&self) -> AssemblyReport {
        self.stream.get_ref().report()
    }
}

impl Iterator for SplitIter {
    type Item = TrainingExample;

    fn next(&mut self) -> Option<TrainingExample> {
        while self.to_skip > 0 {
            if self.stream.next().is_none() {
                warn!(
                    "validation split took all {} examples, training split is empty",
                    self.stream.get_ref().emitted()
                );
                self.to_skip = 0;
                self.remaining = Some(0);
                return None;
            }
            self.to_skip -= 1;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        self.stream.next()
    }
}
