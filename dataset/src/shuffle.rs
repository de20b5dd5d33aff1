use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Bounded-window shuffle over an iterator.
///
/// Keeps up to `capacity` items in memory and emits a uniformly chosen one
/// each step, refilling from the inner iterator. A window of one item keeps
/// the input order. The order is a pure function of the input and the
/// seed.
pub struct Shuffled<I: Iterator> {
    inner: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: ChaCha8Rng,
    exhausted: bool,
}

impl<I: Iterator> Shuffled<I> {
    pub fn new(inner: I, capacity: usize, seed: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buffer: Vec::with_capacity(capacity.min(4096)),
            capacity,
            rng: ChaCha8Rng::seed_from_u64(seed),
            exhausted: false,
        }
    }

    pub fn get_ref(&self) -> &I {
        &self.inner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<I: Iterator> Iterator for Shuffled<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted && self.buffer.len() < self.capacity {
            match self.inner.next() {
                Some(item) => self.buffer.push(item),
                None => self.exhausted = true,
            }
        }

        if self.buffer.is_empty() {
            return None;
        }
        if self.capacity == 1 {
            return self.buffer.pop();
        }

        let i = self.rng.gen_range(0..self.buffer.len());
        Some(self.buffer.swap_remove(i))
    }
}
