// src/geojson.rs
//! Output schema handed to the submission sink: GeoJSON Point features.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct Point {
    /// `[longitude, latitude, altitude]`
    pub coordinates: [f64; 3],
}

/// Upstream fields carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub messenger_name: String,
    pub messenger_id: String,
    pub model_id: String,
    pub battery_state: String,
    pub date_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub callsign: String,
    pub time: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub metadata: MessageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct NormalizedFeature {
    pub id: String,
    pub properties: FeatureProperties,
    pub geometry: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<NormalizedFeature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn feature_serializes_as_geojson_point() {
        let t = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let fc = FeatureCollection {
            features: vec![NormalizedFeature {
                id: "spot-0-123".into(),
                properties: FeatureProperties {
                    callsign: "Alpha".into(),
                    time: t,
                    start: t,
                    metadata: MessageMetadata {
                        messenger_name: "Alpha".into(),
                        messenger_id: "0-123".into(),
                        model_id: "SPOT3".into(),
                        battery_state: "GOOD".into(),
                        date_time: "2025-09-06T09:00:00+0000".into(),
                    },
                },
                geometry: Point {
                    coordinates: [-105.5, 40.25, 1650.0],
                },
            }],
        };

        let v = serde_json::to_value(&fc).unwrap();
        assert_eq!(v["type"], "FeatureCollection");
        let f = &v["features"][0];
        assert_eq!(f["type"], "Feature");
        assert_eq!(f["id"], "spot-0-123");
        assert_eq!(
            f["geometry"],
            json!({ "type": "Point", "coordinates": [-105.5, 40.25, 1650.0] })
        );
        assert_eq!(f["properties"]["time"], "2025-09-06T09:00:00Z");
        assert_eq!(f["properties"]["metadata"]["batteryState"], "GOOD");
        assert_eq!(
            f["properties"]["metadata"]["dateTime"],
            "2025-09-06T09:00:00+0000"
        );
    }
}
