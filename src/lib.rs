//! Download Transifex translations into per-language `.properties` packs.
//!
//! For every configured resource and every language of the project an
//! export job is submitted, polled until the file is ready, downloaded,
//! stripped of comments and blank lines, and written only if it actually
//! contains translations. Languages that produced output are listed in an
//! optional manifest together with their completion percentage.

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod languages;
pub mod manifest;
pub mod model;
pub mod poller;
pub mod stats;
pub mod sync;

pub use error::SyncError;
pub use sync::{SyncReport, Synchronizer};
