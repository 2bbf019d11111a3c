// src/error.rs
use thiserror::Error;

/// Upstream error code meaning "no displayable messages for this feed".
pub const NO_MESSAGES_CODE: &str = "E-0195";

/// One entry of the feed's `<errors>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub code: String,
    pub description: String,
}

impl UpstreamError {
    pub fn is_no_messages(&self) -> bool {
        self.code.trim() == NO_MESSAGES_CODE
    }
}

/// Everything that can abort a feed run.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid share configuration: {0}")]
    Config(String),
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("XML parse error: {0}")]
    Parse(String),
    #[error("upstream feed error: {}", join_descriptions(.0))]
    Upstream(Vec<UpstreamError>),
    #[error("share {share_id}: {source}")]
    Share {
        share_id: String,
        #[source]
        source: Box<FeedError>,
    },
    #[error("feature submission failed: {0:#}")]
    Submit(anyhow::Error),
}

impl FeedError {
    /// Short label used for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Config(_) => "config",
            FeedError::Transport(_) => "transport",
            FeedError::Parse(_) => "parse",
            FeedError::Upstream(_) => "upstream",
            FeedError::Share { source, .. } => source.kind(),
            FeedError::Submit(_) => "submit",
        }
    }
}

fn join_descriptions(errors: &[UpstreamError]) -> String {
    errors
        .iter()
        .map(|e| e.description.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
