// src/ingest/mod.rs
pub mod config;
pub mod mapper;
pub mod parser;
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use tracing::Instrument;

use crate::error::FeedError;
use crate::geojson::{FeatureCollection, NormalizedFeature};
use crate::ingest::config::{ShareConfig, TaskConfig};
use crate::ingest::types::FeedClient;
use crate::sink::FeatureSink;

/// One-time metrics registration (so series carry descriptions once a recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("spot_share_requests_total", "Feed requests issued.");
        describe_counter!(
            "spot_messages_parsed_total",
            "Messages extracted from feed documents."
        );
        describe_counter!(
            "spot_messages_stale_total",
            "Messages dropped by the freshness window."
        );
        describe_counter!(
            "spot_features_emitted_total",
            "Features placed into submitted collections."
        );
        describe_counter!("spot_share_errors_total", "Share pipelines that failed.");
        describe_counter!("spot_runs_total", "Runs submitted to the sink.");
        describe_histogram!("spot_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("spot_last_run_ts", "Unix ts of the last submitted run.");
    });
}

/// fetch → parse → map for a single share.
pub async fn run_share<C: FeedClient + ?Sized>(
    share: &ShareConfig,
    client: &C,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedFeature>, FeedError> {
    let body = client.fetch(share).await?;
    let messages = parser::parse_feed(&body)?;
    let mut features = mapper::map_all(&messages, now)?;

    counter!("spot_messages_stale_total")
        .increment(messages.len().saturating_sub(features.len()) as u64);

    if let Some(call_sign) = &share.call_sign {
        for f in &mut features {
            f.properties.callsign = call_sign.clone();
        }
    }
    Ok(features)
}

/// Run every share concurrently and merge the results in configuration order.
/// The first failing share fails the whole batch.
pub async fn collect<C: FeedClient + ?Sized>(
    shares: &[ShareConfig],
    client: &C,
    now: DateTime<Utc>,
) -> Result<FeatureCollection, FeedError> {
    ensure_metrics_described();

    let pipelines = shares.iter().map(|share| async move {
        run_share(share, client, now)
            .instrument(tracing::info_span!("share", share_id = %share.share_id))
            .await
            .map_err(|e| {
                counter!("spot_share_errors_total", "kind" => e.kind()).increment(1);
                FeedError::Share {
                    share_id: share.share_id.clone(),
                    source: Box::new(e),
                }
            })
    });
    let per_share = try_join_all(pipelines).await?;

    let mut fc = FeatureCollection::default();
    for features in per_share {
        if features.is_empty() {
            continue;
        }
        fc.features.extend(features);
    }
    Ok(fc)
}

/// Collect all shares as of now and hand the result to `sink` exactly once.
pub async fn run<C, S>(task: &TaskConfig, client: &C, sink: &S) -> Result<FeatureCollection, FeedError>
where
    C: FeedClient + ?Sized,
    S: FeatureSink + ?Sized,
{
    let fc = collect(&task.shares, client, Utc::now()).await?;

    if task.debug {
        match serde_json::to_string(&fc) {
            Ok(json) => tracing::info!(features = fc.len(), collection = %json, "feature collection"),
            Err(e) => tracing::warn!(error = ?e, "could not encode collection for debug log"),
        }
    }

    sink.submit(&fc).await.map_err(FeedError::Submit)?;

    counter!("spot_runs_total").increment(1);
    counter!("spot_features_emitted_total").increment(fc.len() as u64);
    gauge!("spot_last_run_ts").set(Utc::now().timestamp() as f64);
    Ok(fc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::fixture::StaticFeedClient;
    use chrono::TimeZone;

    fn feed(messages: &[(&str, &str)]) -> String {
        let body: String = messages
            .iter()
            .map(|(id, at)| {
                format!(
                    "<message><messengerId>{id}</messengerId><messengerName>{id}</messengerName>\
                     <latitude>1.5</latitude><longitude>2.5</longitude><altitude>3</altitude>\
                     <modelId>SPOT3</modelId><dateTime>{at}</dateTime><batteryState>GOOD</batteryState></message>"
                )
            })
            .collect();
        format!(
            "<response><feedMessageResponse><count>{}</count><messages>{body}</messages></feedMessageResponse></response>",
            messages.len()
        )
    }

    #[tokio::test]
    async fn call_sign_overrides_messenger_name() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let client =
            StaticFeedClient::new().with_body("abc", feed(&[("0-1", "2025-09-06T08:55:00+0000")]));
        let share = ShareConfig::new("abc").with_call_sign("RESCUE 1");

        let features = run_share(&share, &client, now).await.unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].properties.callsign, "RESCUE 1");
        assert_eq!(features[0].properties.metadata.messenger_name, "0-1");
    }

    #[tokio::test]
    async fn failing_share_names_itself() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let client = StaticFeedClient::new()
            .with_body("good", feed(&[]))
            .with_body("bad", "<html/>");
        let shares = vec![ShareConfig::new("good"), ShareConfig::new("bad")];

        match collect(&shares, &client, now).await {
            Err(FeedError::Share { share_id, source }) => {
                assert_eq!(share_id, "bad");
                assert!(matches!(*source, FeedError::Parse(_)));
            }
            other => panic!("expected share failure, got {other:?}"),
        }
    }
}
