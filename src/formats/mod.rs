/*!
 * Resource file formats.
 *
 * Both supported formats are exposed to the translation pipeline the same way:
 * an ordered list of key/text entries on the way in, and a "write back" step
 * that takes the translated mapping on the way out.
 *
 * - `resx`: .NET XML resource files
 * - `json`: flat JSON key/value maps
 */

use std::collections::HashMap;
use std::path::Path;

use crate::errors::FormatError;

pub mod json;
pub mod resx;

/// One key/source-text pair from a resource file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub text: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Ordered collection of entries with unique keys.
///
/// Encounter order is the only thing linking a translated value back to its key,
/// so it is preserved exactly as read.
#[derive(Debug, Clone, Default)]
pub struct ResourceEntries {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl PartialEq for ResourceEntries {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ResourceEntries {}

impl ResourceEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing the text in place if the key was already seen
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        let key = key.into();
        let text = text.into();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].text = text,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(Entry { key, text });
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Keys in encounter order
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceEntries {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries = Self::new();
        for (key, text) in iter {
            entries.insert(key, text);
        }
        entries
    }
}

impl<'a> IntoIterator for &'a ResourceEntries {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Supported resource file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    Resx,
    Json,
}

impl ResourceFormat {
    /// Detect format from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "resx" => Some(Self::Resx),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Parse a file of this format into ordered entries
    pub fn parse(&self, path: &Path) -> Result<ResourceEntries, FormatError> {
        match self {
            Self::Resx => resx::parse(path),
            Self::Json => json::parse(path),
        }
    }

    /// Write the translated mapping to `output_path`.
    ///
    /// ResX output is the original document with the translated values patched in,
    /// so it needs the original path. JSON output is the mapping alone.
    pub fn reconstruct(
        &self,
        original_path: &Path,
        translated: &ResourceEntries,
        output_path: &Path,
    ) -> Result<(), FormatError> {
        match self {
            Self::Resx => resx::reconstruct(original_path, translated, output_path),
            Self::Json => json::reconstruct(translated, output_path),
        }
    }
}
