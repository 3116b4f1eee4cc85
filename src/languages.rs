use crate::client::TransifexClient;
use crate::error::{Result, SyncError};
use crate::model::{Language, Project};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct LanguagesResponse {
    data: Vec<LanguageEntry>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    id: String,
}

/// Fetch the languages a project is translated into, in the order the
/// service lists them, without the source language.
///
/// Any failure here is fatal for the run: nothing can be exported without
/// knowing the languages.
pub async fn list_languages(
    client: &TransifexClient,
    project: &Project,
    source_language: &str,
) -> Result<Vec<Language>> {
    let discovery_error = |reason: String| SyncError::Discovery {
        project: project.remote_id(),
        reason,
    };

    let url = client
        .endpoint(&format!("projects/{}/languages", project.remote_id()))
        .map_err(|e| discovery_error(e.to_string()))?;
    debug!("Languages URL: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| discovery_error(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(discovery_error(format!("HTTP {}: {}", status, body)));
    }

    let languages: LanguagesResponse = response
        .json()
        .await
        .map_err(|e| discovery_error(format!("invalid response: {}", e)))?;

    let languages: Vec<Language> = languages
        .data
        .into_iter()
        .map(|entry| Language::from_remote_id(entry.id))
        .filter(|language| language.code != source_language)
        .collect();

    info!(
        "Project {} has {} target languages",
        project.remote_id(),
        languages.len()
    );

    Ok(languages)
}
