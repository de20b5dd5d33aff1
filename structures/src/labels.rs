use std::collections::HashMap;

use crate::errors::LabelError;

/// Category name reported for any class index the table does not know.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Result of looking a category up in a [`LabelTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    Known(u16),
    Unknown,
}

impl ClassLabel {
    pub const UNKNOWN_SENTINEL: i64 = -1;

    pub fn known(self) -> Option<u16> {
        match self {
            ClassLabel::Known(index) => Some(index),
            ClassLabel::Unknown => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ClassLabel::Known(index) => i64::from(index),
            ClassLabel::Unknown => Self::UNKNOWN_SENTINEL,
        }
    }
}

/// Immutable bijection between category names and dense class indices.
///
/// Serialized as the list of names in index order, so a table loaded from a
/// model manifest keeps exactly the indices the model was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelTable {
    names: Vec<String>,
    index: HashMap<String, u16>,
}

impl LabelTable {
    /// Builds a table with indices assigned in lexicographic (byte) order of
    /// the category names, independent of the order they were discovered in.
    pub fn new<I, S>(names: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        Self::from_ordered(names)
    }

    /// Same as [`LabelTable::new`], but the number of categories must equal
    /// the class count the model is built for.
    pub fn with_class_count<I, S>(names: I, class_count: usize) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = Self::new(names)?;
        if table.len() != class_count {
            return Err(LabelError::ClassCountMismatch {
                expected: class_count,
                actual: table.len(),
            });
        }

        Ok(table)
    }

    /// Keeps `names` in the given order; position is the class index.
    pub fn from_ordered(names: Vec<String>) -> Result<Self, LabelError> {
        if names.len() > usize::from(u16::MAX) {
            return Err(LabelError::TooManyCategories(names.len()));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i as u16).is_some() {
                return Err(LabelError::DuplicateCategory(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> ClassLabel {
        match self.index.get(name) {
            Some(&i) => ClassLabel::Known(i),
            None => ClassLabel::Unknown,
        }
    }

    /// Accepts any integer so that a raw argmax, or the `-1` sentinel, can be
    /// passed straight through.
    pub fn name_of(&self, index: i64) -> Option<&str> {
        let index = usize::try_from(index).ok()?;
        self.names.get(index).map(String::as_str)
    }

    pub fn describe(&self, index: i64) -> &str {
        self.name_of(index).unwrap_or(UNKNOWN_CATEGORY)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i as u16, name.as_str()))
    }
}

impl TryFrom<Vec<String>> for LabelTable {
    type Error = LabelError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_ordered(names)
    }
}

impl From<LabelTable> for Vec<String> {
    fn from(table: LabelTable) -> Self {
        table.names
    }
}
