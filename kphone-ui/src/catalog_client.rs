//! HTTP client for the server-fed lists
//!
//! `GET /ids` returns a JSON array of `{id, name}` objects and `GET /scales`
//! a JSON array of scale names. Both are fetched once at startup and again on
//! retry after a failure.

use std::time::Duration;

use kphone_common::CatalogEntry;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::{Result, UiError};
use crate::events::{CatalogList, UiEvent};

const USER_AGENT: &str = concat!("keplerphone-ui/", env!("CARGO_PKG_VERSION"));

/// Catalog API client
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| UiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the object list, in server order
    pub async fn fetch_ids(&self) -> Result<Vec<CatalogEntry>> {
        self.get_json("/ids").await
    }

    /// Fetch the scale names, in server order
    pub async fn fetch_scales(&self) -> Result<Vec<String>> {
        self.get_json("/scales").await
    }

    /// Fetch `list` and deliver the outcome as a [`UiEvent`]
    pub async fn load_into(&self, list: CatalogList, events: &UnboundedSender<UiEvent>) {
        let event = match list {
            CatalogList::Ids => UiEvent::CatalogLoaded(self.fetch_ids().await),
            CatalogList::Scales => UiEvent::ScalesLoaded(self.fetch_scales().await),
        };
        if events.send(event).is_err() {
            debug!(%list, "Event loop closed before list arrived");
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fetching list");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| UiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UiError::Status(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UiError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| UiError::Decode(format!("{}: {}", path, e)))
    }
}
