use async_trait::async_trait;
use history_sync_config::SourceConfig;
use history_sync_models::RawHistoryRecord;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use crate::tautulli::api::parse_history_response;
use crate::{HistorySource, SourceError};

const API_PATH: &str = "/api/v2";
const HISTORY_COMMAND: &str = "get_history";

/// HTTP client for the Tautulli v2 API
pub struct TautulliClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl TautulliClient {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        Self::with_base_url(config.base_url(), config.api_key.clone(), config.request_timeout())
    }

    pub fn with_base_url(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn api_url(&self) -> String {
        format!("{}{}", self.base_url, API_PATH)
    }

    /// Fetch the newest `length` history rows
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn get_history(&self, length: u32) -> Result<Vec<RawHistoryRecord>, SourceError> {
        let length = length.to_string();
        let response = self
            .client
            .get(self.api_url())
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("cmd", HISTORY_COMMAND),
                ("length", length.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::from_transport(e, self.timeout))?;
        debug!(bytes = body.len(), "Tautulli: received history response");

        parse_history_response(&body)
    }
}

#[async_trait]
impl HistorySource for TautulliClient {
    fn source_name(&self) -> &str {
        "tautulli"
    }

    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawHistoryRecord>, SourceError> {
        self.get_history(limit).await
    }
}
