// # HTTP Backend Client
//
// This crate provides the HTTP/JSON backend client for the WDNS
// reconciliation core.
//
// ## Behaviour
//
// - One HTTP request per backend call
// - No retry, backoff or caching (a failed call surfaces immediately)
// - HTTP timeout configured (30 seconds by default)
// - Dry-run mode: GET requests run, mutating requests are only logged
// - TLS verification can be disabled for self-signed backends
//
// ## Security Requirements
//
// - API token and secret NEVER appear in logs or `Debug` output
// - Construction fails if either credential is empty
//
// ## API Reference
//
// All paths are resolved against the configured base URL.
//
// - List zones: GET `domain`
// - List owned records: GET `record?own`
// - Create record: POST `record`
// - Update record: PUT `record`
// - Delete record: DELETE `record`
//
// Requests carry `X-API-Token` and `X-API-Secret` headers. Mutations send
// `{"domain": zone, "record": [{"target", "type", "view", "ttl", "data"}]}`.

pub mod coerce;
pub mod envelope;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use wdns_core::config::BackendConfig;
use wdns_core::traits::Backend;
use wdns_core::{Error, Record, RecordChange, Result, Zone};

/// Header carrying the API token
pub const TOKEN_HEADER: &str = "X-API-Token";

/// Header carrying the API secret
pub const SECRET_HEADER: &str = "X-API-Secret";

const ZONES_PATH: &str = "domain";
const RECORDS_PATH: &str = "record?own";
const RECORD_PATH: &str = "record";

/// Body of a mutating request
#[derive(Debug, Serialize)]
struct MutationBody<'a> {
    domain: &'a str,
    record: [RecordBody<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    target: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    view: &'a str,
    ttl: u32,
    data: &'a [String],
}

impl<'a> MutationBody<'a> {
    fn new(change: &'a RecordChange) -> Self {
        Self {
            domain: &change.zone,
            record: [RecordBody {
                target: change.name.as_str(),
                record_type: &change.record_type,
                view: change.view.as_str(),
                ttl: change.ttl,
                data: &change.values,
            }],
        }
    }
}

/// HTTP/JSON DNS management backend
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all GET requests (zone and record listing)
/// - Log the intended mutation payload
/// - **NOT** send POST/PUT/DELETE requests
pub struct HttpBackend {
    /// Base URL request paths are resolved against
    base_url: Url,

    /// ⚠️ NEVER log this value
    api_token: String,

    /// ⚠️ NEVER log this value
    api_secret: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl HttpBackend {
    /// Create a backend client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(HttpBackend)`: Ready to use client
    /// - `Err(Error::Config)`: Invalid URL, empty credential or client build failure
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.url)
            .map_err(|e| Error::config(format!("Invalid backend URL '{}': {}", config.url, e)))?;

        if !config.verify_tls {
            tracing::warn!("TLS certificate verification is disabled for {}", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("Backend running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            api_secret: config.api_secret.clone(),
            client,
            dry_run: config.dry_run,
        })
    }

    /// Whether mutations are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Resolve `path` against the base URL
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("Invalid request path '{}': {}", path, e)))
    }

    /// Send one request and return the envelope's `data`
    ///
    /// # Errors
    ///
    /// - `Transport`: the request failed or the status was not 200
    /// - `Parse`: the body is not a valid envelope
    /// - `Backend`: the envelope status is not SUCCESS
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.url(path)?;
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(TOKEN_HEADER, &self.api_token)
            .header(SECRET_HEADER, &self.api_secret)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::transport(format!("HTTP code {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {}", e)))?;

        envelope::parse_envelope(&text)
    }

    /// Send a mutation, or log it in dry-run mode
    async fn mutate(&self, method: Method, change: &RecordChange) -> Result<()> {
        let body = serde_json::to_value(MutationBody::new(change))?;

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send {} {} with payload: {}", method, RECORD_PATH, body);
            return Ok(());
        }

        self.request(method, RECORD_PATH, Some(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let data = self.request(Method::GET, ZONES_PATH, None).await?;
        envelope::decode_zones(&data)
    }

    async fn list_records(&self) -> Result<Vec<Record>> {
        let data = self.request(Method::GET, RECORDS_PATH, None).await?;
        envelope::decode_records(&data)
    }

    async fn create_record(&self, change: &RecordChange) -> Result<()> {
        self.mutate(Method::POST, change).await
    }

    async fn update_record(&self, change: &RecordChange) -> Result<()> {
        self.mutate(Method::PUT, change).await
    }

    async fn delete_record(&self, change: &RecordChange) -> Result<()> {
        self.mutate(Method::DELETE, change).await
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
