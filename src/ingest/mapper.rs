// src/ingest/mapper.rs
use chrono::{DateTime, Utc};

use crate::error::FeedError;
use crate::geojson::{FeatureProperties, MessageMetadata, NormalizedFeature, Point};
use crate::ingest::types::RawMessage;

/// Positions older than this many whole minutes are dropped.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 30;

/// SPOT timestamps look like `2025-09-06T09:00:00+0000`; RFC 3339 is accepted too.
pub fn parse_spot_time(raw: &str) -> Result<DateTime<Utc>, FeedError> {
    let s = raw.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FeedError::Parse(format!("invalid dateTime {raw:?}: {e}")))
}

/// At most 30 whole minutes old; elapsed time truncates toward zero.
pub fn is_fresh(reported_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(reported_at).num_minutes() <= FRESHNESS_WINDOW_MINUTES
}

fn coordinate(field: &str, raw: &str) -> Result<f64, FeedError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FeedError::Parse(format!("invalid {field} {raw:?}")))
}

/// Map one message into a point feature, without the freshness check.
pub fn map_message(msg: &RawMessage, reported_at: DateTime<Utc>) -> Result<NormalizedFeature, FeedError> {
    let lon = coordinate("longitude", &msg.longitude)?;
    let lat = coordinate("latitude", &msg.latitude)?;
    let alt = coordinate("altitude", &msg.altitude)?;

    Ok(NormalizedFeature {
        id: format!("spot-{}", msg.messenger_id),
        properties: FeatureProperties {
            callsign: msg.messenger_name.clone(),
            time: reported_at,
            start: reported_at,
            metadata: MessageMetadata {
                messenger_name: msg.messenger_name.clone(),
                messenger_id: msg.messenger_id.clone(),
                model_id: msg.model_id.clone(),
                battery_state: msg.battery_state.clone(),
                date_time: msg.date_time.clone(),
            },
        },
        geometry: Point {
            coordinates: [lon, lat, alt],
        },
    })
}

/// Drop stale messages and map the rest, keeping document order.
pub fn map_all(messages: &[RawMessage], now: DateTime<Utc>) -> Result<Vec<NormalizedFeature>, FeedError> {
    let mut out = Vec::with_capacity(messages.len());
    for msg in messages {
        let reported_at = parse_spot_time(&msg.date_time)?;
        if !is_fresh(reported_at, now) {
            continue;
        }
        out.push(map_message(msg, reported_at)?);
    }
    Ok(out)
}
