//! Per-language completion, summed across every resource of the project.
//!
//! The percentage only feeds the manifest, so fetch failures are logged and
//! reported as 0% instead of failing the language.

use crate::client::TransifexClient;
use crate::error::{Result, SyncError};
use crate::model::{CompletionStat, Language, Project};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Upper bound on followed `links.next` pages.
const MAX_PAGES: usize = 50;

/// `floor(100 * translated / (translated + untranslated))`, or 0 when the
/// language has no strings at all.
pub fn percentage(translated: u64, untranslated: u64) -> u8 {
    let total = u128::from(translated) + u128::from(untranslated);
    if total == 0 {
        return 0;
    }
    // fits: translated <= total
    (u128::from(translated) * 100 / total) as u8
}

#[derive(Debug, Deserialize)]
struct StatsPage {
    data: Vec<ResourceStats>,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct ResourceStats {
    attributes: StatsAttributes,
}

#[derive(Debug, Deserialize)]
struct StatsAttributes {
    translated_strings: u64,
    untranslated_strings: u64,
}

#[derive(Debug, Deserialize)]
struct Links {
    next: Option<String>,
}

pub struct StatsAggregator<'a> {
    client: &'a TransifexClient,
    project: &'a Project,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(client: &'a TransifexClient, project: &'a Project) -> Self {
        Self { client, project }
    }

    /// Sum translated/untranslated counts over all resources for a language.
    pub async fn fetch_counts(&self, language: &Language) -> Result<CompletionStat> {
        let stats_error = |reason: String| SyncError::Stats {
            language: language.code.clone(),
            reason,
        };

        let mut url = self
            .client
            .endpoint("resource_language_stats")
            .map_err(|e| stats_error(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("filter[language]", &language.id)
            .append_pair("filter[project]", &self.project.remote_id());

        let mut stat = CompletionStat::default();
        for _ in 0..MAX_PAGES {
            debug!("Fetching resource stats for {} from {}", language.code, url);

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| stats_error(format!("request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(stats_error(format!("HTTP {}: {}", status, body)));
            }

            let page: StatsPage = response
                .json()
                .await
                .map_err(|e| stats_error(format!("invalid response: {}", e)))?;

            for resource in &page.data {
                stat.add(
                    resource.attributes.translated_strings,
                    resource.attributes.untranslated_strings,
                );
            }

            match page.links.and_then(|l| l.next) {
                Some(next) => {
                    url = url
                        .join(&next)
                        .map_err(|e| stats_error(format!("invalid next link {}: {}", next, e)))?;
                }
                None => return Ok(stat),
            }
        }

        Err(stats_error(format!("more than {} pages of stats", MAX_PAGES)))
    }

    /// Completion percentage for a language; 0 if the stats can't be fetched.
    pub async fn percentage_for(&self, language: &Language) -> u8 {
        match self.fetch_counts(language).await {
            Ok(stat) => {
                let pct = stat.percentage();
                info!(
                    "Stats for {}: {} translated, {} untranslated ({}%)",
                    language.code, stat.translated, stat.untranslated, pct
                );
                pct
            }
            Err(e) => {
                warn!("{} - reporting 0%", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Percentage Tests ====================

    #[test]
    fn test_percentage_no_strings() {
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_percentage_half() {
        assert_eq!(percentage(50, 50), 50);
    }

    #[test]
    fn test_percentage_complete() {
        assert_eq!(percentage(1, 0), 100);
    }

    #[test]
    fn test_percentage_nothing_translated() {
        assert_eq!(percentage(0, 12), 0);
    }

    #[test]
    fn test_percentage_truncates() {
        assert_eq!(percentage(2, 1), 66);
        assert_eq!(percentage(999, 1), 99);
        // 29% exactly, no floating point drift
        assert_eq!(percentage(29, 71), 29);
    }

    #[test]
    fn test_percentage_large_counts() {
        assert_eq!(percentage(u32::MAX as u64, u32::MAX as u64), 50);
        assert_eq!(percentage(u64::MAX, u64::MAX), 50);
        assert_eq!(percentage(u64::MAX, 0), 100);
    }

    // ==================== Fetch Tests ====================

    fn client_for(server: &MockServer) -> TransifexClient {
        TransifexClient::new(&format!("{}/", server.uri()), "test-token", None)
            .expect("Should build client")
    }

    fn stats_entry(resource: &str, translated: u64, untranslated: u64) -> serde_json::Value {
        serde_json::json!({
            "id": format!("o:acme:p:viewer:r:{}:l:fr", resource),
            "type": "resource_language_stats",
            "attributes": {
                "translated_strings": translated,
                "untranslated_strings": untranslated,
                "reviewed_strings": 0
            },
            "relationships": {
                "resource": { "data": { "id": format!("o:acme:p:viewer:r:{}", resource), "type": "resources" } }
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_counts_sums_resources() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resource_language_stats"))
            .and(query_param("filter[language]", "l:fr"))
            .and(query_param("filter[project]", "o:acme:p:viewer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [stats_entry("core", 30, 10), stats_entry("dicom", 15, 45)],
                "links": { "next": null }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let project = Project::new("acme", "viewer");
        let stats = StatsAggregator::new(&client, &project);

        let stat = stats
            .fetch_counts(&Language::from_remote_id("l:fr"))
            .await
            .expect("Should fetch stats");

        assert_eq!(stat.translated, 45);
        assert_eq!(stat.untranslated, 55);
        assert_eq!(stat.percentage(), 45);
    }

    #[tokio::test]
    async fn test_fetch_counts_follows_next_link() {
        let mock_server = MockServer::start().await;
        let next = format!(
            "{}/resource_language_stats?filter[language]=l:fr&page[cursor]=abc",
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/resource_language_stats"))
            .and(query_param("page[cursor]", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [stats_entry("dicom", 10, 0)],
                "links": {}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resource_language_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [stats_entry("core", 10, 20)],
                "links": { "next": next }
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let project = Project::new("acme", "viewer");
        let stats = StatsAggregator::new(&client, &project);

        let stat = stats
            .fetch_counts(&Language::from_remote_id("l:fr"))
            .await
            .unwrap();

        assert_eq!(stat.translated, 20);
        assert_eq!(stat.untranslated, 20);
    }

    #[tokio::test]
    async fn test_empty_stats_is_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resource_language_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let project = Project::new("acme", "viewer");
        let stats = StatsAggregator::new(&client, &project);

        assert_eq!(stats.percentage_for(&Language::from_remote_id("l:fr")).await, 0);
    }

    #[tokio::test]
    async fn test_http_error_degrades_to_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resource_language_stats"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let project = Project::new("acme", "viewer");
        let stats = StatsAggregator::new(&client, &project);
        let language = Language::from_remote_id("l:fr");

        let err = stats.fetch_counts(&language).await.unwrap_err();
        assert!(matches!(err, SyncError::Stats { .. }));
        assert_eq!(stats.percentage_for(&language).await, 0);
    }

    #[tokio::test]
    async fn test_malformed_stats_degrade_to_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resource_language_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "attributes": { "translated_strings": "many" } }]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let project = Project::new("acme", "viewer");
        let stats = StatsAggregator::new(&client, &project);

        assert_eq!(stats.percentage_for(&Language::from_remote_id("l:fr")).await, 0);
    }
}
