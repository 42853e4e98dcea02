use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoEntry {
    pub key: String,
    pub value: String,
}

impl InfoEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything collected about one file, in the order it was collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoReport {
    pub path: PathBuf,
    pub entries: Vec<InfoEntry>,
}

impl InfoReport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(InfoEntry::new(key, value));
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = InfoEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[InfoEntry] {
        &self.entries
    }

    /// First value recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Width of the longest key, in characters.
    pub fn max_key_width(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.key.chars().count())
            .max()
            .unwrap_or(0)
    }
}
