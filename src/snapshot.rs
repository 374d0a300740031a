//! Snapshot codec for chart definition content.
//!
//! A snapshot is the complete logical content of a chart definition at one
//! version: name, description, tags, and the three structured payloads
//! (filter tree, visual spec, calculation spec). Encoding is canonical —
//! object keys are recursively sorted and tags are normalized — so two
//! logically identical contents always produce the same payload text. That
//! property is what makes stored snapshots directly comparable and no-op
//! edits detectable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{SnapshotError, SnapshotResult};

/// Decoded chart definition content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartContent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub filter: Value,
    pub visual: Value,
    pub calculation: Value,
}

impl ChartContent {
    /// Collapse whitespace-only description to None and trim, sort, and
    /// deduplicate tags so tag order never affects the encoding.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self.description.and_then(|value| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        });

        let mut tags: Vec<String> = self
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.sort();
        tags.dedup();
        self.tags = tags;

        self
    }
}

/// Encode content into its canonical snapshot payload.
///
/// The inverse of [`decode`]; `decode(encode(x)) == x` for all valid
/// normalized content.
pub fn encode(content: &ChartContent) -> SnapshotResult<String> {
    let normalized = content.clone().normalized();
    validate(&normalized)?;

    let value = serde_json::to_value(&normalized)
        .map_err(|err| SnapshotError::malformed(err.to_string()))?;

    Ok(canonical_string(&value))
}

/// Decode a snapshot payload back into chart content.
pub fn decode(payload: &str) -> SnapshotResult<ChartContent> {
    let content: ChartContent = serde_json::from_str(payload)
        .map_err(|err| SnapshotError::malformed(err.to_string()))?;
    validate(&content)?;
    Ok(content)
}

/// Validate the structured payloads without encoding.
pub fn validate(content: &ChartContent) -> SnapshotResult<()> {
    validate_filter_node(&content.filter)?;
    require_object("visual", &content.visual)?;
    require_object("calculation", &content.calculation)?;
    Ok(())
}

/// Serialize a JSON value with recursively sorted object keys.
pub fn canonical_string(value: &Value) -> String {
    serde_json::to_string(&canonicalize(value)).unwrap_or_else(|_| "null".to_string())
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, item) in entries {
                sorted.insert(key.clone(), canonicalize(item));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn require_object(field: &str, value: &Value) -> SnapshotResult<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(SnapshotError::malformed(format!(
            "{} payload must be a JSON object",
            field
        )))
    }
}

/// A filter tree is null (no filter), a group node with an `op` of
/// and/or/not and a `children` array, or a leaf condition with `field` and
/// `op` strings.
fn validate_filter_node(value: &Value) -> SnapshotResult<()> {
    match value {
        Value::Null => Ok(()),
        Value::Object(map) => {
            if let Some(children) = map.get("children") {
                let op = map
                    .get("op")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SnapshotError::malformed("filter group is missing an op"))?;
                if !matches!(op, "and" | "or" | "not") {
                    return Err(SnapshotError::malformed(format!(
                        "unknown filter group op '{}'",
                        op
                    )));
                }

                let children = children.as_array().ok_or_else(|| {
                    SnapshotError::malformed("filter group children must be an array")
                })?;
                for child in children {
                    validate_filter_node(child)?;
                }
                Ok(())
            } else if map.contains_key("field") {
                map.get("field").and_then(Value::as_str).ok_or_else(|| {
                    SnapshotError::malformed("filter condition field must be a string")
                })?;
                map.get("op").and_then(Value::as_str).ok_or_else(|| {
                    SnapshotError::malformed("filter condition is missing an op")
                })?;
                Ok(())
            } else {
                Err(SnapshotError::malformed(
                    "filter node must be a group or a condition",
                ))
            }
        }
        _ => Err(SnapshotError::malformed(
            "filter payload must be an object or null",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_content() -> ChartContent {
        ChartContent {
            name: "Revenue by region".to_string(),
            description: Some("Quarterly revenue".to_string()),
            tags: vec!["finance".to_string(), "quarterly".to_string()],
            filter: json!({
                "op": "and",
                "children": [
                    {"field": "region", "op": "eq", "value": "EMEA"},
                    {"field": "year", "op": "gte", "value": 2024}
                ]
            }),
            visual: json!({"type": "bar", "x": "region", "y": "revenue"}),
            calculation: json!({"measure": "sum(revenue)"}),
        }
    }

    #[test]
    fn test_round_trip() {
        let content = sample_content();
        let payload = encode(&content).unwrap();
        let decoded = decode(&payload).unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn test_encoding_is_order_independent() {
        let mut reordered = sample_content();
        reordered.tags = vec!["quarterly".to_string(), "finance".to_string()];
        reordered.visual = json!({"y": "revenue", "type": "bar", "x": "region"});

        assert_eq!(
            encode(&sample_content()).unwrap(),
            encode(&reordered).unwrap()
        );
    }

    #[test]
    fn test_blank_description_collapses_to_none() {
        let mut content = sample_content();
        content.description = Some("   ".to_string());

        let decoded = decode(&encode(&content).unwrap()).unwrap();
        assert_eq!(decoded.description, None);
    }

    #[test]
    fn test_tags_are_deduplicated() {
        let mut content = sample_content();
        content.tags = vec![
            "finance".to_string(),
            " finance ".to_string(),
            "".to_string(),
        ];

        let decoded = decode(&encode(&content).unwrap()).unwrap();
        assert_eq!(decoded.tags, vec!["finance".to_string()]);
    }

    #[test]
    fn test_null_filter_is_valid() {
        let mut content = sample_content();
        content.filter = Value::Null;
        assert!(encode(&content).is_ok());
    }

    #[test]
    fn test_decode_rejects_unparsable_payload() {
        let err = decode("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_filter_shape() {
        let payload = serde_json::to_string(&json!({
            "name": "Broken",
            "tags": [],
            "filter": {"op": "and"},
            "visual": {},
            "calculation": {}
        }))
        .unwrap();

        let err = decode(&payload).unwrap_err();
        assert!(matches!(err, SnapshotError::MalformedPayload(_)));
    }

    #[test]
    fn test_encode_rejects_scalar_visual_payload() {
        let mut content = sample_content();
        content.visual = json!("bar");

        let err = encode(&content).unwrap_err();
        assert!(err.to_string().contains("visual"));
    }

    #[test]
    fn test_unknown_group_op_rejected() {
        let mut content = sample_content();
        content.filter = json!({"op": "xor", "children": []});

        assert!(encode(&content).is_err());
    }
}
