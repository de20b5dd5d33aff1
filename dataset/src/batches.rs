use structures::{RasterImage, TrainingExample};

/// A group of examples handed to the trainer together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub images: Vec<RasterImage>,
    pub labels: Vec<u16>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All images' pixels back to back, `len * side * side` bytes.
    pub fn pixels(&self) -> Vec<u8> {
        self.images
            .iter()
            .flat_map(|image| image.pixels().iter().copied())
            .collect()
    }

    fn push(&mut self, example: TrainingExample) {
        self.images.push(example.image);
        self.labels.push(example.label);
    }
}

/// Groups a stream of examples into fixed-size batches.
pub struct Batches<I> {
    inner: I,
    size: usize,
    drop_remainder: bool,
}

impl<I> Batches<I>
where
    I: Iterator<Item = TrainingExample>,
{
    pub fn new(inner: I, size: usize, drop_remainder: bool) -> Self {
        Self {
            inner,
            size: size.max(1),
            drop_remainder,
        }
    }
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = TrainingExample>,
{
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let mut batch = Batch {
            images: Vec::with_capacity(self.size),
            labels: Vec::with_capacity(self.size),
        };

        for example in self.inner.by_ref().take(self.size) {
            batch.push(example);
        }

        if batch.is_empty() || (self.drop_remainder && batch.len() < self.size) {
            return None;
        }

        Some(batch)
    }
}
