//! Shapes a tool result's `content` may take, and how each becomes text.

use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, PartialEq)]
pub enum ToolContent {
    /// `[{"type":"text","text":"..."}, ...]`
    Fragments(Vec<JsonValue>),
    /// `{"content": "..."}`
    Object(Map<String, JsonValue>),
    Scalar(JsonValue),
}

impl ToolContent {
    /// Reads `result.content`; a missing field behaves like an empty mapping.
    pub fn of_result(result: &JsonValue) -> Self {
        match result.get("content") {
            Some(v) => v.clone().into(),
            None => ToolContent::Object(Map::new()),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ToolContent::Fragments(items) => fragments_text(&items),
            ToolContent::Object(map) => object_text(&map),
            ToolContent::Scalar(v) => scalar_text(&v),
        }
    }
}

impl From<JsonValue> for ToolContent {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Array(items) => ToolContent::Fragments(items),
            JsonValue::Object(map) => ToolContent::Object(map),
            other => ToolContent::Scalar(other),
        }
    }
}

fn fragments_text(items: &[JsonValue]) -> String {
    items
        .iter()
        .filter(|item| item.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|item| item.get("text"))
        .map(scalar_text)
        .collect()
}

fn object_text(map: &Map<String, JsonValue>) -> String {
    map.get("content").map(scalar_text).unwrap_or_default()
}

fn scalar_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
