//! Top-level driver: every configured resource in every project language.
//!
//! A failure on one (resource, language) pair is logged and recorded in the
//! report; the run moves on to the next pair. Only language discovery,
//! cancellation and failing to prepare the output directory or manifest
//! abort the run.

use crate::cancel::CancelToken;
use crate::client::TransifexClient;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::filter;
use crate::languages::list_languages;
use crate::manifest::Manifest;
use crate::model::{Language, Project, ResourceModule, TranslationFile};
use crate::poller::{JobPoller, PollConfig};
use crate::stats::StatsAggregator;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A pair that was skipped because of an error.
#[derive(Debug)]
pub struct PairFailure {
    pub resource: String,
    pub language: String,
    pub error: SyncError,
}

/// What a run produced.
#[derive(Debug)]
pub struct SyncReport {
    /// Files written, in processing order
    pub written: Vec<PathBuf>,
    /// Pairs whose export held no translations
    pub empty: Vec<PathBuf>,
    pub failures: Vec<PairFailure>,
    /// Present when a manifest file was requested
    pub manifest: Option<Manifest>,
}

pub struct Synchronizer {
    client: TransifexClient,
    project: Project,
    resources: Vec<ResourceModule>,
    source_language: String,
    output_dir: PathBuf,
    languages_file: Option<PathBuf>,
    poll: PollConfig,
    concurrency: usize,
}

impl Synchronizer {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: TransifexClient::from_config(config)?,
            project: config.project(),
            resources: config.resources(),
            source_language: config.source_language.clone(),
            output_dir: config.output_dir.clone(),
            languages_file: config.languages_file.clone(),
            poll: PollConfig::new(config.poll_attempts, config.poll_interval),
            concurrency: config.concurrency.max(1),
        })
    }

    pub async fn run(&self, cancel: CancelToken) -> Result<SyncReport> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| SyncError::Write {
                path: self.output_dir.clone(),
                source,
            })?;

        let languages = list_languages(&self.client, &self.project, &self.source_language).await?;

        let pairs: Vec<(&ResourceModule, &Language)> = self
            .resources
            .iter()
            .flat_map(|r| languages.iter().map(move |l| (r, l)))
            .collect();
        let total = pairs.len();
        info!(
            "Exporting {} resources x {} languages ({} pairs)",
            self.resources.len(),
            languages.len(),
            total
        );

        let poller = JobPoller::new(&self.client, &self.project, self.poll.clone(), cancel.clone());
        let stats = StatsAggregator::new(&self.client, &self.project);

        let mut report = SyncReport {
            written: Vec::new(),
            empty: Vec::new(),
            failures: Vec::new(),
            manifest: self
                .languages_file
                .as_ref()
                .map(|_| Manifest::new(&self.source_language)),
        };

        // `buffered` keeps results in pair order, so the manifest order does
        // not depend on the concurrency level
        let poller = &poller;
        let mut results = stream::iter(pairs)
            .map(|(resource, language)| async move {
                let result = self.process_pair(poller, resource, language).await;
                (resource, language, result)
            })
            .buffered(self.concurrency);

        // Several modules may share a base name; an empty export must not
        // remove a file another module wrote earlier in this run
        let mut written_paths = HashSet::new();

        let mut done = 0;
        while let Some((resource, language, result)) = results.next().await {
            done += 1;
            let result = match result {
                Ok(file) => {
                    let path = self.output_dir.join(resource.file_name(&file.language));
                    store(&file, &path, &written_paths).await.map(|()| (file, path))
                }
                Err(error) => Err(error),
            };

            match result {
                Ok((file, path)) if file.non_empty => {
                    info!(
                        "[{}/{}] ✓ {} {} -> {}",
                        done,
                        total,
                        file.resource,
                        file.language.code,
                        path.display()
                    );
                    written_paths.insert(path.clone());
                    report.written.push(path);

                    if let Some(manifest) = report.manifest.as_mut() {
                        if !manifest.contains(&file.language.code) {
                            let pct = stats.percentage_for(&file.language).await;
                            manifest.push(&file.language.code, pct);
                        }
                    }
                }
                Ok((file, path)) => {
                    info!(
                        "[{}/{}] - {} {}: no translations",
                        done, total, file.resource, file.language.code
                    );
                    report.empty.push(path);
                }
                Err(error) if error.is_fatal() => {
                    warn!("[{}/{}] {}, stopping without manifest", done, total, error);
                    return Err(error);
                }
                Err(error) => {
                    warn!(
                        "[{}/{}] ✗ {} {}: {}",
                        done, total, resource.slug, language.code, error
                    );
                    report.failures.push(PairFailure {
                        resource: resource.slug.clone(),
                        language: language.code.clone(),
                        error,
                    });
                }
            }

            if cancel.is_cancelled() {
                warn!("Cancellation requested, stopping after {}/{} pairs", done, total);
                return Err(SyncError::Cancelled);
            }
        }

        info!(
            "Sync complete: {} written, {} empty, {} failed",
            report.written.len(),
            report.empty.len(),
            report.failures.len()
        );

        if let (Some(manifest), Some(path)) = (&report.manifest, &self.languages_file) {
            manifest.write(path).await?;
        }

        Ok(report)
    }

    /// Export, download and normalize one (resource, language) pair.
    async fn process_pair(
        &self,
        poller: &JobPoller<'_>,
        resource: &ResourceModule,
        language: &Language,
    ) -> Result<TranslationFile> {
        let location = poller.export(resource, language).await?;
        debug!("Downloading {} {} from {}", resource.slug, language.code, location);

        let read_error = |reason: String| SyncError::Read {
            location: location.to_string(),
            reason,
        };

        let response = self
            .client
            .download(location.clone())
            .send()
            .await
            .map_err(|e| read_error(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(read_error(format!("HTTP {}", response.status())));
        }
        let raw = response
            .bytes()
            .await
            .map_err(|e| read_error(format!("failed to read body: {}", e)))?;

        let normalized = filter::normalize(&raw);
        Ok(TranslationFile {
            language: language.clone(),
            resource: resource.slug.clone(),
            body: normalized.body,
            non_empty: normalized.non_empty,
        })
    }
}

/// Write a non-empty file. For an empty one, remove any stale file unless
/// this run already wrote that path.
async fn store(file: &TranslationFile, path: &Path, written: &HashSet<PathBuf>) -> Result<()> {
    let write_error = |source| SyncError::Write {
        path: path.to_path_buf(),
        source,
    };

    if file.non_empty {
        return tokio::fs::write(path, &file.body).await.map_err(write_error);
    }

    if written.contains(path) {
        debug!("Keeping {}, written earlier in this run", path.display());
        return Ok(());
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(write_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(non_empty: bool, body: &[u8]) -> TranslationFile {
        TranslationFile {
            language: Language::from_code("fr"),
            resource: "core".to_string(),
            body: body.to_vec(),
            non_empty,
        }
    }

    #[tokio::test]
    async fn test_store_writes_non_empty_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("messages_fr.properties");

        store(&file(true, b"key=valeur\n"), &path, &HashSet::new()).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"key=valeur\n");
    }

    #[tokio::test]
    async fn test_store_removes_stale_file_when_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("messages_fr.properties");
        std::fs::write(&path, "old=content\n").unwrap();

        store(&file(false, b""), &path, &HashSet::new()).await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_empty_without_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("messages_fr.properties");

        store(&file(false, b""), &path, &HashSet::new()).await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_write_failure_is_pair_scoped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing").join("messages_fr.properties");

        let err = store(&file(true, b"a=b\n"), &path, &HashSet::new()).await.unwrap_err();

        assert!(matches!(err, SyncError::Write { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_store_keeps_file_written_this_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("messages_fr.properties");
        std::fs::write(&path, "a=1\n").unwrap();
        let written = HashSet::from([path.clone()]);

        store(&file(false, b""), &path, &written).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"a=1\n");
    }
}
