// src/ingest/providers/fixture.rs
use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::FeedError;
use crate::ingest::config::ShareConfig;
use crate::ingest::types::FeedClient;

/// Serves canned XML bodies keyed by share id. Unknown shares answer with an
/// empty body, which is how SPOT reports a share without traffic.
#[derive(Debug, Clone, Default)]
pub struct StaticFeedClient {
    bodies: HashMap<String, String>,
}

impl StaticFeedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, share_id: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(share_id.into(), body.into());
        self
    }
}

#[async_trait]
impl FeedClient for StaticFeedClient {
    async fn fetch(&self, share: &ShareConfig) -> Result<String, FeedError> {
        tracing::info!(share_id = %share.share_id, "requesting share (fixture)");
        Ok(self
            .bodies
            .get(&share.share_id)
            .cloned()
            .unwrap_or_default())
    }
}
