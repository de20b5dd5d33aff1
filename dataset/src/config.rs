//! Assembly configuration.

use structures::RasterEncoding;

use crate::errors::{AssemblyError, Result};

/// How the training split is ordered from one epoch to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReshufflePolicy {
    /// Every epoch sees the training examples in the same order.
    Stable,
    /// The training split is passed through a second shuffle window seeded
    /// per epoch. The validation split never changes.
    PerEpoch,
}

/// Knobs for [`Assembler`](crate::Assembler).
///
/// # Example
///
/// ```
/// use dataset::{AssemblyConfig, ReshufflePolicy};
///
/// let config = AssemblyConfig::default()
///     .with_cap(500)
///     .with_seed(7)
///     .with_reshuffle(ReshufflePolicy::PerEpoch);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.per_category_cap, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Render parameters and ink convention of every example.
    pub encoding: RasterEncoding,

    /// At most this many examples per category, taken from the start of the
    /// file.
    pub per_category_cap: usize,

    /// Fraction of the epoch held out for validation, in `[0, 1)`.
    pub validation_fraction: f64,

    /// Optional limit on the combined interleaved stream.
    pub epoch_size: Option<usize>,

    /// Size of the shuffle window.
    pub shuffle_buffer: usize,

    /// Seed for every shuffle.
    pub seed: u64,

    /// Training order between epochs.
    pub reshuffle: ReshufflePolicy,

    /// Examples per batch.
    pub batch_size: usize,

    /// Drop a final batch smaller than `batch_size`.
    pub drop_remainder: bool,

    /// Number of categories the model's output layer expects. Assembly
    /// fails when the discovered categories disagree.
    #[serde(default)]
    pub class_count: Option<usize>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            encoding: RasterEncoding::QUICKDRAW_28,
            per_category_cap: 10_000,
            validation_fraction: 0.2,
            epoch_size: None,
            shuffle_buffer: 10_000,
            seed: 42,
            reshuffle: ReshufflePolicy::Stable,
            batch_size: 64,
            drop_remainder: true,
            class_count: None,
        }
    }
}

impl AssemblyConfig {
    #[must_use]
    pub fn with_encoding(mut self, encoding: RasterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_cap(mut self, per_category_cap: usize) -> Self {
        self.per_category_cap = per_category_cap;
        self
    }

    #[must_use]
    pub fn with_validation_fraction(mut self, fraction: f64) -> Self {
        self.validation_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_epoch_size(mut self, epoch_size: usize) -> Self {
        self.epoch_size = Some(epoch_size);
        self
    }

    #[must_use]
    pub fn with_shuffle_buffer(mut self, shuffle_buffer: usize) -> Self {
        self.shuffle_buffer = shuffle_buffer;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_reshuffle(mut self, reshuffle: ReshufflePolicy) -> Self {
        self.reshuffle = reshuffle;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_drop_remainder(mut self, drop_remainder: bool) -> Self {
        self.drop_remainder = drop_remainder;
        self
    }

    #[must_use]
    pub fn with_class_count(mut self, class_count: usize) -> Self {
        self.class_count = Some(class_count);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.encoding
            .validate()
            .map_err(|err| AssemblyError::invalid_config(err.to_string()))?;

        if self.per_category_cap == 0 {
            return Err(AssemblyError::invalid_config(
                "per-category cap must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(AssemblyError::invalid_config(format!(
                "validation fraction must be in [0, 1), got {}",
                self.validation_fraction
            )));
        }
        if self.epoch_size == Some(0) {
            return Err(AssemblyError::invalid_config(
                "epoch size must be at least 1",
            ));
        }
        if self.shuffle_buffer == 0 {
            return Err(AssemblyError::invalid_config(
                "shuffle buffer must hold at least 1 example",
            ));
        }
        if self.batch_size == 0 {
            return Err(AssemblyError::invalid_config(
                "batch size must be at least 1",
            ));
        }
        if self.class_count == Some(0) {
            return Err(AssemblyError::invalid_config(
                "class count must be at least 1",
            ));
        }

        Ok(())
    }

    /// Size of the validation split for a run over `categories` files.
    ///
    /// The stream length is not known up front, so the split is computed
    /// from the configured epoch size, or from the cap when there is none.
    /// If the files run out early the training split shrinks, never the
    /// validation split's definition.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn validation_len(&self, categories: usize) -> usize {
        let expected = self
            .epoch_size
            .unwrap_or_else(|| self.per_category_cap.saturating_mul(categories));

        (expected as f64 * self.validation_fraction).floor() as usize
    }
}
