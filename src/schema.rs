// src/schema.rs
//! JSON Schema describing the task input (and the empty output contract),
//! reported to the host via `schema:input` / `schema:output`.

use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Input,
    Output,
}

impl SchemaType {
    /// Parses host event names such as `schema:input`.
    pub fn from_event(event: &str) -> Option<Self> {
        match event.trim().to_ascii_lowercase().as_str() {
            "schema:input" => Some(SchemaType::Input),
            "schema:output" => Some(SchemaType::Output),
            _ => None,
        }
    }
}

pub fn schema(kind: SchemaType) -> Value {
    match kind {
        SchemaType::Input => json!({
            "type": "object",
            "required": ["SPOT_MAP_SHARES"],
            "properties": {
                "SPOT_MAP_SHARES": {
                    "type": "array",
                    "description": "Spot Share IDs to pull data from",
                    "display": "table",
                    "items": {
                        "type": "object",
                        "required": ["ShareId"],
                        "properties": {
                            "ShareId": {
                                "type": "string",
                                "description": "Spot Share ID"
                            },
                            "Password": {
                                "type": "string",
                                "description": "Optional feed password"
                            },
                            "CallSign": {
                                "type": "string",
                                "description": "Human Readable Name of the Operator - Used as the callsign in TAK"
                            }
                        }
                    }
                },
                "DEBUG": {
                    "type": "boolean",
                    "default": false,
                    "description": "Print results in logs"
                }
            }
        }),
        SchemaType::Output => json!({
            "type": "object",
            "required": [],
            "properties": {}
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_schema_requires_share_list() {
        let s = schema(SchemaType::Input);
        assert_eq!(s["required"][0], "SPOT_MAP_SHARES");
        assert_eq!(
            s["properties"]["SPOT_MAP_SHARES"]["items"]["required"][0],
            "ShareId"
        );
        assert_eq!(s["properties"]["DEBUG"]["default"], false);
    }

    #[test]
    fn event_names_map_to_schema_types() {
        assert_eq!(SchemaType::from_event("schema:input"), Some(SchemaType::Input));
        assert_eq!(SchemaType::from_event("SCHEMA:OUTPUT"), Some(SchemaType::Output));
        assert_eq!(SchemaType::from_event("run"), None);
    }
}
