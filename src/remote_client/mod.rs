use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ReadProgressRecord;

/// Client for a remote progress store holding replicas of the local records.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteClient {
    /// Create a new client with the given base URL (e.g. "https://sync.example.org/reader").
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating RemoteClient");
        Ok(RemoteClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            api_key: None,
            client,
        })
    }

    /// Return a client with the provided API key set (Bearer). Empty keys are ignored.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn auth_header(&self) -> Option<(String, String)> {
        self.api_key
            .as_ref()
            .map(|k| ("Authorization".to_string(), format!("Bearer {}", k)))
    }

    fn pull_query(since: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
        since
            .map(|s| vec![("since", s.to_rfc3339_opts(SecondsFormat::Millis, true))])
            .unwrap_or_default()
    }

    /// GET /api/progress?since=...
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn pull(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<PullResponse> {
        let url = self.url("/api/progress");
        tracing::debug!(%url, since = ?since, "GET progress");
        let mut req = self.client.get(&url).query(&Self::pull_query(since));
        if let Some((k, v)) = self.auth_header() {
            req = req.header(&k, &v);
        }
        let resp = req.send().await?;
        let status = resp.error_for_status()?;
        let body = status.text().await?;
        match serde_json::from_str::<PullResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                let snippet_len = body.len().min(2000);
                let snippet = body.get(..snippet_len).unwrap_or(body.as_str());
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse PullResponse");
                Err(e.into())
            }
        }
    }

    /// POST /api/progress
    #[tracing::instrument(level = "debug", skip(self, records), fields(count = records.len()))]
    pub async fn push(&self, records: &[ReadProgressRecord]) -> anyhow::Result<PushResponse> {
        let url = self.url("/api/progress");
        tracing::debug!(%url, "POST progress");
        let mut req = self.client.post(&url).json(&PushRequest { records });
        if let Some((k, v)) = self.auth_header() {
            req = req.header(&k, &v);
        }
        let resp = req.send().await?;
        let status = resp.error_for_status()?;
        let body = status.text().await?;
        let parsed: PushResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    records: &'a [ReadProgressRecord],
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub records: Vec<ReadProgressRecord>,
    /// Remote clock at the time of the response; next pull cursor
    pub server_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub accepted: usize,
}
