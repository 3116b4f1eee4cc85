use crate::error::{Result, SyncError};
use std::path::Path;
use tracing::info;

/// Languages that produced output, with their completion percentages.
///
/// Starts with the source language at 100%. Each language is listed once,
/// in the order it first produced a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, u8)>,
}

impl Manifest {
    pub fn new(source_language: &str) -> Self {
        Self {
            entries: vec![(source_language.to_string(), 100)],
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == code)
    }

    /// Record a language. Returns false if it was already listed.
    pub fn push(&mut self, code: &str, percentage: u8) -> bool {
        if self.contains(code) {
            return false;
        }
        self.entries.push((code.to_string(), percentage));
        true
    }

    pub fn entries(&self) -> &[(String, u8)] {
        &self.entries
    }

    pub fn languages(&self) -> String {
        self.entries
            .iter()
            .map(|(code, _)| code.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn percentages(&self) -> String {
        self.entries
            .iter()
            .map(|(code, pct)| format!("{}.{}", code, pct))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `languages=...` and `percentages=...`, no trailing newline.
    pub fn render(&self) -> String {
        format!(
            "languages={}\npercentages={}",
            self.languages(),
            self.percentages()
        )
    }

    /// Write the manifest as ISO-8859-1.
    pub async fn write(&self, path: &Path) -> Result<()> {
        info!("languages: {}", self.languages());

        // Language codes are ASCII, so Latin-1 encoding is a byte-for-byte copy
        let bytes: Vec<u8> = self
            .render()
            .chars()
            .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
            .collect();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SyncError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| SyncError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}
