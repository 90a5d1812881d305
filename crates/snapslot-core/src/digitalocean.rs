//! DigitalOcean v2 API client for volumes and volume snapshots.
//!
//! Implements [`SnapshotSource`] and [`SnapshotSink`]. Every request carries
//! the bearer token. Lookups, listings and deletes go through [`with_retry`],
//! so transient failures are retried while auth and not-found errors surface
//! immediately. Snapshot creation is never retried.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError, Result};
use crate::provider::{SnapshotSink, SnapshotSource};
use crate::retry::{RetryPolicy, with_retry};
use crate::snapshot::{Snapshot, Volume};

/// Public API root.
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com/v2/";

/// Snapshots requested per listing page (the API maximum).
pub const PAGE_SIZE: u32 = 200;

/// Upper bound on followed pagination links.
const MAX_PAGES: usize = 1_000;

/// HTTP client for the DigitalOcean volumes API.
#[derive(Debug, Clone)]
pub struct DigitalOceanClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl DigitalOceanClient {
    /// Creates a client from provider configuration.
    ///
    /// Fails when no token is configured or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::ValidationError("provider token is not set".into()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("snapslot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.api_url),
            token: token.to_string(),
            retry: RetryPolicy::provider_api(),
        })
    }

    /// Replace the retry policy used for every request.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str) -> String {
        format!("{}{resource}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body, what).into())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(request, what).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        decode(&body)
    }

    async fn fetch_snapshot_page(&self, url: &str, volume_id: &str) -> Result<SnapshotsPage> {
        let what = format!("volume {volume_id}");
        with_retry(&self.retry, || self.send_json(self.client.get(url), &what)).await
    }
}

#[async_trait]
impl SnapshotSource for DigitalOceanClient {
    async fn find_volume(&self, name: &str) -> Result<Volume> {
        let url = self.url("volumes");
        let what = format!("volume {name}");
        let response: VolumesPage = with_retry(&self.retry, || {
            let request = self
                .client
                .get(&url)
                .query(&[("name", name), ("per_page", "1"), ("page", "1")]);
            self.send_json(request, &what)
        })
        .await?;

        let volume = response
            .volumes
            .into_iter()
            .next()
            .ok_or(ProviderError::NotFound(what))?;
        debug!(volume = %volume.name, volume_id = %volume.id, "Resolved volume");
        Ok(volume)
    }

    async fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        let mut next = Some(format!(
            "{}?per_page={PAGE_SIZE}",
            self.url(&format!("volumes/{volume_id}/snapshots"))
        ));
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let page = self.fetch_snapshot_page(&url, volume_id).await?;
            pages += 1;
            snapshots.extend(page.snapshots);

            next = page
                .links
                .pages
                .and_then(|p| p.next)
                .filter(|n| *n != url && pages < MAX_PAGES);
        }

        debug!(volume_id, pages, count = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }
}

#[async_trait]
impl SnapshotSink for DigitalOceanClient {
    /// Sent exactly once. A repeated POST after a lost response could create a
    /// second snapshot or fail on the name already being taken.
    async fn create_snapshot(&self, volume_id: &str, name: &str) -> Result<Snapshot> {
        let url = self.url(&format!("volumes/{volume_id}/snapshots"));
        let what = format!("volume {volume_id}");
        let request = self.client.post(&url).json(&CreateSnapshotRequest { name });
        let created: SnapshotEnvelope = self.send_json(request, &what).await?;

        info!(
            volume_id,
            snapshot_id = %created.snapshot.id,
            snapshot_name = %created.snapshot.name,
            "Created snapshot"
        );
        Ok(created.snapshot)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let url = self.url(&format!("snapshots/{snapshot_id}"));
        let what = format!("snapshot {snapshot_id}");
        let result = with_retry(&self.retry, || self.send(self.client.delete(&url), &what)).await;

        match result {
            Ok(_) => Ok(()),
            Err(crate::Error::Provider(ProviderError::NotFound(_))) => {
                debug!(snapshot_id, "Snapshot already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Map a non-success status to the provider error taxonomy.
pub(crate) fn status_error(status: StatusCode, body: String, what: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Auth(format!("HTTP {}: {}", status.as_u16(), api_message(&body)))
        }
        StatusCode::NOT_FOUND => ProviderError::NotFound(what.to_string()),
        _ => ProviderError::Api {
            status: status.as_u16(),
            body: api_message(&body),
        },
    }
}

/// Pull `message` out of a DigitalOcean error body, falling back to the raw text.
fn api_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()).into())
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateSnapshotRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    snapshot: Snapshot,
}

#[derive(Debug, Deserialize)]
struct VolumesPage {
    #[serde(default)]
    volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct SnapshotsPage {
    #[serde(default)]
    snapshots: Vec<Snapshot>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
