//! Turns a directory of per-category drawing files into training and
//! validation streams of rendered, labeled examples.
//!
//! The pipeline is lazy end to end:
//!
//! 1. each category file is decoded record by record, keeping only
//!    recognized drawings, up to a per-category cap;
//! 2. categories are interleaved round-robin and each round is rendered in
//!    parallel;
//! 3. the interleaved stream goes through a bounded shuffle window;
//! 4. the first examples of the shuffled stream are the validation split,
//!    the rest is the training split;
//! 5. examples are grouped into batches for the trainer.
//!
//! Unreadable or corrupt files and drawings that fail to render are logged
//! and skipped; they never abort the run.

#[macro_use]
extern crate serde_derive;

mod assembler;
mod batches;
mod categories;
mod config;
mod errors;
mod examples;
mod report;
mod shuffle;

pub use crate::assembler::{Assembler, Split, SplitIter};
pub use crate::batches::{Batch, Batches};
pub use crate::categories::{discover_categories, CategorySource, DRAWING_FILE_EXTENSION};
pub use crate::config::{AssemblyConfig, ReshufflePolicy};
pub use crate::errors::{AssemblyError, Result};
pub use crate::examples::Examples;
pub use crate::report::{AssemblyReport, CategoryReport};
pub use crate::shuffle::Shuffled;
