//! Authenticated HTTP context for the Transifex REST API.
//!
//! Redirects are never followed automatically: a `303 See Other` from the
//! export status endpoint is the signal that the file is ready, and the
//! poller needs to see it.

use crate::config::{Config, ProxyConfig};
use anyhow::{Context, Result};
use reqwest::{redirect, Client, RequestBuilder, Url};

pub type ParseError = <Url as std::str::FromStr>::Err;

/// Content type of JSON:API request bodies.
pub const JSON_API: &str = "application/vnd.api+json";

#[derive(Debug, Clone)]
pub struct TransifexClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl TransifexClient {
    pub fn new(base_url: &str, token: &str, proxy: Option<&ProxyConfig>) -> Result<Self> {
        let mut builder = Client::builder().redirect(redirect::Policy::none());

        if let Some(proxy) = proxy {
            let mut p = reqwest::Proxy::all(&proxy.url)
                .with_context(|| format!("Invalid proxy URL: {}", proxy.url))?;
            if let Some((user, password)) = &proxy.credentials {
                p = p.basic_auth(user, password);
            }
            builder = builder.proxy(p);
        }

        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

        Ok(Self {
            http: builder.build().context("Failed to build HTTP client")?,
            base_url,
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, &config.token, config.proxy.as_ref())
    }

    /// Resolve an API path relative to the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ParseError> {
        self.base_url.join(path)
    }

    /// GET an API path with the bearer token.
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.token)
    }

    /// POST a JSON:API document with the bearer token.
    pub fn post_json_api(&self, url: Url, body: &serde_json::Value) -> RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, JSON_API)
            .body(body.to_string())
    }

    /// GET an exported file.
    ///
    /// The token only travels to the API's own origin; presigned storage
    /// locations are fetched anonymously.
    pub fn download(&self, location: Url) -> RequestBuilder {
        if location.origin() == self.base_url.origin() {
            self.get(location)
        } else {
            self.http.get(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, header_exists, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_endpoint_joins_relative_paths() {
        let client = TransifexClient::new("https://rest.api.transifex.com/", "t", None)
            .expect("Should build client");

        let url = client
            .endpoint("projects/o:acme:p:viewer/languages")
            .expect("Should join");
        assert_eq!(
            url.as_str(),
            "https://rest.api.transifex.com/projects/o:acme:p:viewer/languages"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(TransifexClient::new("not a url", "t", None).is_err());
    }

    #[test]
    fn test_proxy_is_accepted() {
        let proxy = ProxyConfig {
            url: "http://proxy.internal:3128".to_string(),
            credentials: Some(("jdoe".to_string(), "hunter2".to_string())),
        };

        assert!(TransifexClient::new("https://rest.api.transifex.com/", "t", Some(&proxy)).is_ok());
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/jobs/1"))
            .respond_with(
                ResponseTemplate::new(303).insert_header("location", "https://files.example/x"),
            )
            .mount(&mock_server)
            .await;

        let client =
            TransifexClient::new(&format!("{}/", mock_server.uri()), "t", None).unwrap();
        let response = client
            .get(client.endpoint("jobs/1").unwrap())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 303);
    }

    #[tokio::test]
    async fn test_bearer_token_sent_to_api() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/fr"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a=b\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            TransifexClient::new(&format!("{}/", mock_server.uri()), "secret", None).unwrap();
        let location = client.endpoint("files/fr").unwrap();
        let response = client.download(location).send().await.unwrap();

        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_bearer_token_not_sent_to_foreign_origin() {
        let api = MockServer::start().await;
        let storage = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bucket/fr"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&storage)
            .await;
        Mock::given(method("GET"))
            .and(path("/bucket/fr"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a=b\n"))
            .mount(&storage)
            .await;

        let client = TransifexClient::new(&format!("{}/", api.uri()), "secret", None).unwrap();
        let location = Url::parse(&format!("{}/bucket/fr", storage.uri())).unwrap();
        let response = client.download(location).send().await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
    }
}
