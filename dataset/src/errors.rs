//! Error types for dataset assembly.

use std::io;
use std::path::PathBuf;

use structures::LabelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A configuration value is out of range.
    #[error("invalid assembly config: {0}")]
    InvalidConfig(String),

    /// The data directory could not be listed.
    #[error("could not list {}: {source}", path.display())]
    Discovery { path: PathBuf, source: io::Error },

    /// No drawing files were found.
    #[error("no .bin drawing files in {}", .0.display())]
    NoCategories(PathBuf),

    /// A drawing file names a category the persisted label table lacks.
    #[error("category {0:?} has no class index in the label table")]
    UnlabeledCategory(String),

    #[error(transparent)]
    Labels(#[from] LabelError),
}

impl AssemblyError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
