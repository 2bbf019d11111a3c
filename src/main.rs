//! SPOT share feed task — binary entrypoint.
//!
//! `spot-feed [run|watch|schema:input|schema:output]`
//!
//! `run` (default) polls every configured share once and submits the merged
//! collection; `watch` repeats that every `SPOT_POLL_INTERVAL_SECS`.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spot_feed::ingest::{
    self,
    config::{self, RuntimeSettings},
    providers::spot::SpotFeedClient,
    scheduler::{spawn_scheduler, SchedulerCfg},
};
use spot_feed::schema::{schema, SchemaType};

/// Logs go to stderr; stdout carries the collection when no submit URL is set.
/// `SPOT_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spot_feed=info,warn"));
    let json = std::env::var("SPOT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let event = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    if let Some(kind) = SchemaType::from_event(&event) {
        println!("{}", serde_json::to_string_pretty(&schema(kind))?);
        return Ok(());
    }

    let task = config::load_default().context("loading share configuration")?;
    let settings = RuntimeSettings::from_env();
    let client = SpotFeedClient::new(&settings.feed_base_url)?;
    let sink = spot_feed::sink::from_settings(&settings);

    match event.as_str() {
        "run" => {
            let fc = ingest::run(&task, &client, sink.as_ref())
                .await
                .context("spot feed run failed")?;
            tracing::info!(shares = task.shares.len(), features = fc.len(), "run submitted");
        }
        "watch" => {
            let cfg = SchedulerCfg {
                interval_secs: settings.poll_interval_secs,
            };
            let handle = spawn_scheduler(cfg, task, Arc::new(client), Arc::from(sink));
            tokio::select! {
                res = handle => res.context("scheduler task ended")?,
                _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
            }
        }
        other => bail!(
            "unknown command {other:?}; expected run, watch, schema:input or schema:output"
        ),
    }
    Ok(())
}
