// src/ingest/types.rs
use serde::Deserialize;

use crate::error::FeedError;
use crate::ingest::config::ShareConfig;

/// One `<message>` entry of a share feed, before mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub messenger_name: String,
    pub messenger_id: String,
    pub model_id: String,
    pub battery_state: String,
    pub date_time: String, // upstream format, e.g. 2025-09-06T09:00:00+0000
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
}

/// Source of raw feed bodies, one request per share.
#[async_trait::async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, share: &ShareConfig) -> Result<String, FeedError>;
}
