use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::{AssemblyError, Result};

/// Extension of the per-category drawing files, e.g. `cat.bin`.
pub const DRAWING_FILE_EXTENSION: &str = "bin";

/// One category and the file its drawings live in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CategorySource {
    pub name: String,
    pub path: PathBuf,
}

impl CategorySource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// `<dir>/<name>.bin`
    pub fn in_directory(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = dir
            .as_ref()
            .join(format!("{name}.{DRAWING_FILE_EXTENSION}"));
        Self { name, path }
    }
}

/// Lists every `*.bin` file directly inside `dir`, sorted by category name.
///
/// Entries that cannot be inspected are logged and skipped. Subdirectories
/// and files with other extensions are ignored.
pub fn discover_categories(dir: impl AsRef<Path>) -> Result<Vec<CategorySource>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| AssemblyError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(DRAWING_FILE_EXTENSION) {
            continue;
        }

        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => continue,
            Ok(_) => {}
            Err(err) => {
                warn!("skipping {}: {}", path.display(), err);
                continue;
            }
        }

        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!("skipping {}: name is not valid UTF-8", path.display());
            continue;
        };

        sources.push(CategorySource::new(name, path.clone()));
    }

    sources.sort();
    debug!("found {} categories in {}", sources.len(), dir.display());

    Ok(sources)
}
