//! Core domain types shared by the discovery, export and aggregation steps.
//!
//! Remote identifiers follow the Transifex API v3 conventions:
//! `o:{org}:p:{project}` for projects, `...:r:{slug}` for resources and
//! `l:{code}` for languages.

use serde::Deserialize;
use std::fmt;

/// Base name used when no explicit one is configured for a resource.
pub const DEFAULT_BASE_NAME: &str = "messages";

/// Remote translation project identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub organization: String,
    pub project: String,
}

impl Project {
    pub fn new(organization: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
        }
    }

    /// Remote project id, e.g. `o:acme:p:viewer`
    pub fn remote_id(&self) -> String {
        format!("o:{}:p:{}", self.organization, self.project)
    }
}

/// One translatable resource and the base name of its output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceModule {
    pub slug: String,
    pub base_name: String,
}

impl ResourceModule {
    pub fn new(slug: impl Into<String>, base_name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            base_name: base_name.into(),
        }
    }

    /// Remote resource id, e.g. `o:acme:p:viewer:r:core`
    pub fn remote_id(&self, project: &Project) -> String {
        format!("{}:r:{}", project.remote_id(), self.slug)
    }

    /// Output file name for one language, e.g. `messages_fr_CA.properties`
    pub fn file_name(&self, language: &Language) -> String {
        format!("{}_{}.properties", self.base_name, language.code)
    }
}

/// A locale exposed by the project.
///
/// `id` is what the remote service calls it (`l:pt-BR`), `code` is the
/// local form used in file names and the manifest (`pt_BR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    pub id: String,
    pub code: String,
}

impl Language {
    pub fn from_remote_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let code = id.strip_prefix("l:").unwrap_or(&id).replace('-', "_");
        Self { id, code }
    }

    /// Build a language from a local code such as `fr_CA`.
    pub fn from_code(code: &str) -> Self {
        Self {
            id: format!("l:{}", code.replace('_', "-")),
            code: code.to_string(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Id assigned by the remote service to an export job. Never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Export job status as reported in `data.attributes.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Position in `pending -> processing -> {succeeded, failed}`.
    pub fn stage(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Succeeded | JobStatus::Failed => 2,
        }
    }
}

/// What a single status request told us.
///
/// The remote contract answers either with a redirect to the finished file or
/// with a status document; both are checked on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Redirect(reqwest::Url),
    Status { status: JobStatus, body: String },
}

/// Normalized output for one (resource, language) pair.
///
/// `body` holds ISO-8859-1 bytes, one byte per character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationFile {
    pub language: Language,
    pub resource: String,
    pub body: Vec<u8>,
    pub non_empty: bool,
}

/// Translated/untranslated string counts for one language across all resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionStat {
    pub translated: u64,
    pub untranslated: u64,
}

impl CompletionStat {
    pub fn add(&mut self, translated: u64, untranslated: u64) {
        self.translated = self.translated.saturating_add(translated);
        self.untranslated = self.untranslated.saturating_add(untranslated);
    }

    pub fn percentage(&self) -> u8 {
        crate::stats::percentage(self.translated, self.untranslated)
    }
}
