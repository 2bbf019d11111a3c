// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod error;
pub mod geojson;
pub mod ingest;
pub mod schema;
pub mod sink;

// ---- Re-exports for stable public API ----
pub use crate::error::{FeedError, UpstreamError};
pub use crate::geojson::{FeatureCollection, NormalizedFeature};
pub use crate::ingest::config::{ShareConfig, TaskConfig};
pub use crate::ingest::types::{FeedClient, RawMessage};
pub use crate::ingest::{collect, run};
