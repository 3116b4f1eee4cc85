use std::path::PathBuf;

/// Errors raised while synchronizing language packs.
///
/// A pair error aborts the run only when [`SyncError::is_fatal`] says so;
/// everything else ends up in the run report. Failing to create the output
/// directory or to write the manifest is returned from the run directly.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The project's language list could not be fetched or parsed
    #[error("cannot list languages of {project}: {reason}")]
    Discovery { project: String, reason: String },

    /// The export job could not be created
    #[error("cannot submit export of {resource} ({language}): {reason}")]
    Submission {
        resource: String,
        language: String,
        reason: String,
    },

    /// A status request failed at the transport level or returned garbage
    #[error("status request for export job {job_id} failed: {reason}")]
    Poll { job_id: String, reason: String },

    /// The remote service reported the job as failed
    #[error("export job {job_id} failed: {body}")]
    JobFailed { job_id: String, body: String },

    /// The job never reached a terminal state within the poll bound
    #[error("export job {job_id} still running after {attempts} status checks")]
    JobTimeout { job_id: String, attempts: u32 },

    #[error("synchronization cancelled")]
    Cancelled,

    /// The exported file could not be downloaded or read
    #[error("cannot read exported file {location}: {reason}")]
    Read { location: String, reason: String },

    /// Completion stats could not be fetched; callers degrade to 0%
    #[error("cannot fetch stats for {language}: {reason}")]
    Stats { language: String, reason: String },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Whether a pair error stops the whole run instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Discovery { .. } | SyncError::Cancelled)
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
