// src/ingest/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::config::TaskConfig;
use crate::ingest::types::FeedClient;
use crate::sink::FeatureSink;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
}

/// Re-run the whole batch every `interval_secs`. The first tick fires
/// immediately; a failed run is logged and the loop keeps going.
pub fn spawn_scheduler(
    cfg: SchedulerCfg,
    task: TaskConfig,
    client: Arc<dyn FeedClient>,
    sink: Arc<dyn FeatureSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match crate::ingest::run(&task, client.as_ref(), sink.as_ref()).await {
                Ok(fc) => tracing::info!(
                    target: "ingest",
                    shares = task.shares.len(),
                    features = fc.len(),
                    "scheduled run submitted"
                ),
                Err(e) => {
                    counter!("spot_run_failures_total").increment(1);
                    tracing::error!(target: "ingest", error = %e, "scheduled run failed");
                }
            }
        }
    })
}
