use std::fmt;

/// What happened to one category's file during assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub name: String,
    /// Records decoded from the file, recognized or not.
    pub decoded: u64,
    /// Records dropped because the recognizer did not accept them.
    pub unrecognized: u64,
    /// Examples emitted for this category.
    pub rendered: u64,
    pub render_failed: u64,
    /// The file could not be opened, or stopped on a corrupt record.
    pub failed: bool,
}

impl CategoryReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Per-category counters for one pass over the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub categories: Vec<CategoryReport>,
}

impl AssemblyReport {
    pub fn total_rendered(&self) -> u64 {
        self.categories.iter().map(|c| c.rendered).sum()
    }

    pub fn total_decoded(&self) -> u64 {
        self.categories.iter().map(|c| c.decoded).sum()
    }

    pub fn total_render_failed(&self) -> u64 {
        self.categories.iter().map(|c| c.render_failed).sum()
    }

    pub fn failed_categories(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(|c| c.failed)
            .map(|c| c.name.as_str())
    }

    pub fn category(&self, name: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.categories {
            writeln!(
                f,
                "{:<24} decoded {:>8}  unrecognized {:>8}  rendered {:>8}  render failures {:>4}{}",
                c.name,
                c.decoded,
                c.unrecognized,
                c.rendered,
                c.render_failed,
                if c.failed { "  (file failed)" } else { "" }
            )?;
        }
        write!(
            f,
            "total: {} decoded, {} rendered",
            self.total_decoded(),
            self.total_rendered()
        )
    }
}
