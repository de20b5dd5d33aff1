use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;

use log::{debug, warn};
use renderer::render_batch;
use structures::{Drawing, LabelTable, RasterEncoding, TrainingExample};
use strokes::{DrawingReader, Pull};

use crate::{
    categories::CategorySource,
    config::AssemblyConfig,
    report::{AssemblyReport, CategoryReport},
};

/// Interleaving rounds rendered together in one parallel batch.
const ROUNDS_PER_RENDER: usize = 16;

struct CategoryStream {
    label: u16,
    reader: Option<DrawingReader<BufReader<File>>>,
    report: CategoryReport,
}

impl CategoryStream {
    fn open(source: &CategorySource, labels: &LabelTable) -> Self {
        let mut report = CategoryReport::new(source.name.clone());

        let label = match labels.index_of(&source.name).known() {
            Some(label) => label,
            None => {
                warn!("category {} has no class index, skipping", source.name);
                report.failed = true;
                return Self {
                    label: 0,
                    reader: None,
                    report,
                };
            }
        };

        let reader = match DrawingReader::open(&source.path) {
            Ok(reader) => Some(reader),
            Err(err) => {
                warn!("skipping category {}: {}", source.name, err);
                report.failed = true;
                None
            }
        };

        Self {
            label,
            reader,
            report,
        }
    }

    fn is_active(&self) -> bool {
        self.reader.is_some()
    }

    /// Next recognized drawing, or `None` once the file is done.
    fn next_recognized(&mut self) -> Option<Drawing> {
        let reader = self.reader.as_mut()?;

        loop {
            match reader.pull() {
                Pull::Drawing(drawing) => {
                    self.report.decoded += 1;
                    if drawing.recognized {
                        return Some(drawing);
                    }
                    self.report.unrecognized += 1;
                }
                Pull::End => {
                    debug!(
                        "category {} exhausted after {} records",
                        self.report.name, self.report.decoded
                    );
                    self.reader = None;
                    return None;
                }
                Pull::Failed(err) => {
                    warn!(
                        "stopping category {} after {} records: {}",
                        self.report.name, self.report.decoded, err
                    );
                    self.report.failed = true;
                    self.reader = None;
                    return None;
                }
            }
        }
    }
}

/// Rendered, labeled examples from every category, interleaved round-robin.
///
/// Each round takes at most one recognized drawing from each category that
/// has not reached its cap, in category order. A drawing that fails to
/// render does not count toward the cap; the next round pulls a replacement.
pub struct Examples {
    streams: Vec<CategoryStream>,
    encoding: RasterEncoding,
    cap: usize,
    limit: Option<usize>,
    emitted: usize,
    pending: VecDeque<TrainingExample>,
}

impl Examples {
    pub fn new(sources: &[CategorySource], labels: &LabelTable, config: &AssemblyConfig) -> Self {
        let streams = sources
            .iter()
            .map(|source| CategoryStream::open(source, labels))
            .collect();

        Self {
            streams,
            encoding: config.encoding,
            cap: config.per_category_cap,
            limit: config.epoch_size,
            emitted: 0,
            pending: VecDeque::new(),
        }
    }

    /// Counters for everything read so far.
    pub fn report(&self) -> AssemblyReport {
        AssemblyReport {
            categories: self.streams.iter().map(|s| s.report.clone()).collect(),
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Reads a batch of rounds and renders them. Returns `false` once every
    /// category is exhausted or capped.
    fn fill(&mut self) -> bool {
        let mut drawings = Vec::new();
        let mut owners = Vec::new();
        let mut claimed = vec![0usize; self.streams.len()];

        for _ in 0..ROUNDS_PER_RENDER {
            let mut took_any = false;

            for (i, stream) in self.streams.iter_mut().enumerate() {
                if !stream.is_active() || stream.report.rendered as usize + claimed[i] >= self.cap
                {
                    continue;
                }
                if let Some(drawing) = stream.next_recognized() {
                    drawings.push(drawing);
                    owners.push(i);
                    claimed[i] += 1;
                    took_any = true;
                }
            }

            if !took_any {
                break;
            }
        }

        if drawings.is_empty() {
            return false;
        }

        let results = render_batch(&drawings, &self.encoding);
        for ((result, owner), drawing) in results.into_iter().zip(owners).zip(&drawings) {
            let stream = &mut self.streams[owner];
            match result {
                Ok(image) => {
                    stream.report.rendered += 1;
                    self.pending.push_back(TrainingExample {
                        image,
                        label: stream.label,
                    });
                }
                Err(err) => {
                    debug!(
                        "could not render drawing {} of {}: {}",
                        drawing.id, stream.report.name, err
                    );
                    stream.report.render_failed += 1;
                }
            }
        }

        true
    }
}

impl Iterator for Examples {
    type Item = TrainingExample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit.map_or(false, |limit| self.emitted >= limit) {
            return None;
        }

        loop {
            if let Some(example) = self.pending.pop_front() {
                self.emitted += 1;
                return Some(example);
            }
            if !self.fill() {
                return None;
            }
        }
    }
}
