// src/sink.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;

use crate::geojson::FeatureCollection;
use crate::ingest::config::RuntimeSettings;

/// Receives the merged collection once per run.
#[async_trait::async_trait]
pub trait FeatureSink: Send + Sync {
    async fn submit(&self, fc: &FeatureCollection) -> Result<()>;
}

/// Pick the sink configured for this process: HTTP when `SPOT_SUBMIT_URL` is
/// set, stdout otherwise.
pub fn from_settings(settings: &RuntimeSettings) -> Box<dyn FeatureSink> {
    match &settings.submit_url {
        Some(url) => {
            let sink = HttpSink::new(url.clone());
            match &settings.submit_token {
                Some(token) => Box::new(sink.with_token(token.clone())),
                None => Box::new(sink),
            }
        }
        None => Box::new(StdoutSink),
    }
}

/// Prints the collection as one line of GeoJSON.
pub struct StdoutSink;

#[async_trait::async_trait]
impl FeatureSink for StdoutSink {
    async fn submit(&self, fc: &FeatureCollection) -> Result<()> {
        let line = serde_json::to_string(fc).context("encoding feature collection")?;
        println!("{line}");
        Ok(())
    }
}

/// POSTs the collection as JSON, optionally with a bearer token.
pub struct HttpSink {
    url: String,
    token: Option<String>,
    client: Client,
}

impl HttpSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            token: None,
            client: Client::new(),
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

#[async_trait::async_trait]
impl FeatureSink for HttpSink {
    async fn submit(&self, fc: &FeatureCollection) -> Result<()> {
        let mut req = self.client.post(&self.url).json(fc);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.send()
            .await
            .context("submit post")?
            .error_for_status()
            .context("submit non-2xx")?;
        tracing::debug!(url = %self.url, features = fc.len(), "collection submitted");
        Ok(())
    }
}

// --- Test helper ---
pub struct MemorySink {
    pub submissions: std::sync::Mutex<Vec<FeatureCollection>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            submissions: std::sync::Mutex::new(vec![]),
        }
    }

    pub fn take(&self) -> Vec<FeatureCollection> {
        let mut guard = self.submissions.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FeatureSink for MemorySink {
    async fn submit(&self, fc: &FeatureCollection) -> Result<()> {
        self.submissions
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?
            .push(fc.clone());
        Ok(())
    }
}
