use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::inspect::traits::{FileHandler, HandlerError};
use crate::model::InfoEntry;
use crate::traits::CommandRunner;

const READ_CHUNK: usize = 64 * 1024;

/// Counts lines, words and characters without any external tool.
pub struct TextHandler;

/// Running counts over a byte stream.
///
/// Characters are bytes; a word starts at any byte that follows a space,
/// newline or tab (or the start of input).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextCounts {
    pub lines: u64,
    pub words: u64,
    pub chars: u64,
    in_word: bool,
}

impl TextCounts {
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.chars += 1;
            if byte == b'\n' {
                self.lines += 1;
            }
            if matches!(byte, b' ' | b'\n' | b'\t') {
                self.in_word = false;
            } else if !self.in_word {
                self.in_word = true;
                self.words += 1;
            }
        }
    }

    pub fn of(bytes: &[u8]) -> Self {
        let mut counts = Self::default();
        counts.feed(bytes);
        counts
    }

    fn into_entries(self) -> Vec<InfoEntry> {
        vec![
            InfoEntry::new("Lines", self.lines.to_string()),
            InfoEntry::new("Words", self.words.to_string()),
            InfoEntry::new("Characters", self.chars.to_string()),
        ]
    }
}

pub async fn count_file(path: &Path) -> std::io::Result<TextCounts> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut counts = TextCounts::default();
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        counts.feed(&buffer[..read]);
    }
    Ok(counts)
}

#[async_trait]
impl FileHandler for TextHandler {
    fn name(&self) -> &'static str {
        "text"
    }

    fn can_handle(&self, description: &str) -> bool {
        description.contains("text") || description.contains("ASCII")
    }

    fn handles_mime(&self, mime: &str) -> bool {
        mime.starts_with("text/")
    }

    async fn inspect(
        &self,
        path: &Path,
        _runner: &dyn CommandRunner,
    ) -> Result<Vec<InfoEntry>, HandlerError> {
        Ok(count_file(path).await?.into_entries())
    }
}
