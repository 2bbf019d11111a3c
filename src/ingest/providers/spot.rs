// src/ingest/providers/spot.rs
use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::ingest::config::ShareConfig;
use crate::ingest::types::FeedClient;

const FEED_PATH: [&str; 6] = [
    "spot-main-web",
    "consumer",
    "rest-api",
    "2.0",
    "public",
    "feed",
];
const FEED_DOCUMENT: &str = "latest.xml";
const PASSWORD_PARAM: &str = "feedPassword";

/// Fetches `latest.xml` for a share from the SPOT public feed API.
#[derive(Clone)]
pub struct SpotFeedClient {
    base: Url,
    client: Client,
}

impl SpotFeedClient {
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        let base = Url::parse(base_url)
            .map_err(|e| FeedError::Config(format!("invalid feed base url {base_url:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FeedError::Config(format!(
                "feed base url {base_url:?} cannot carry a path"
            )));
        }
        Ok(Self {
            base,
            client: Client::new(),
        })
    }

    /// Swap in a preconfigured client (proxies, custom TLS roots).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// `{base}/spot-main-web/consumer/rest-api/2.0/public/feed/{ShareId}/latest.xml[?feedPassword=..]`
    pub fn feed_url(&self, share: &ShareConfig) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(FEED_PATH)
                .push(&share.share_id)
                .push(FEED_DOCUMENT);
        }
        if let Some(password) = &share.password {
            url.query_pairs_mut().append_pair(PASSWORD_PARAM, password);
        }
        url
    }
}

#[async_trait]
impl FeedClient for SpotFeedClient {
    async fn fetch(&self, share: &ShareConfig) -> Result<String, FeedError> {
        let url = self.feed_url(share);
        tracing::info!(share_id = %share.share_id, "requesting share");
        counter!("spot_share_requests_total").increment(1);

        // Drop the URL from transport errors, it may carry the feed password.
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.without_url()))?;

        // SPOT reports failures inside the XML body, so the status is informational.
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(share_id = %share.share_id, %status, "feed answered with non-success status");
        }

        resp.text()
            .await
            .map_err(|e| FeedError::Transport(e.without_url()))
    }
}
