use serde_json::Value;

use crate::graph_utils::graph::Entity;

pub const DEFAULT_VALUE_MAX_CHARS: usize = 200;
pub const ELLIPSIS: &str = "…";
const ARRAY_SEPARATOR: &str = ", ";

/// Display payload for the details view of one selected entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoPanel {
    pub entity_type: String,
    pub label: String,
    pub id: String,
    pub source_doc: Option<String>,
    // (key, rendered value), sorted by key
    pub properties: Vec<(String, String)>,
}

impl InfoPanel {
    pub fn from_entity(entity: &Entity, max_chars: usize) -> Self {
        let mut properties: Vec<(String, String)> = entity
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), format_value(v, max_chars)))
            .collect();
        properties.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            entity_type: entity.entity_type.clone(),
            label: entity.display_name().to_string(),
            id: entity.id.clone(),
            source_doc: entity.source_doc.clone(),
            properties,
        }
    }

    /// `key: value` lines as shown in the panel.
    pub fn property_lines(&self) -> Vec<String> {
        self.properties.iter().map(|(k, v)| format!("{}: {}", k, v)).collect()
    }
}

/// Render one property value for display, truncated to `max_chars` characters.
pub fn format_value(value: &Value, max_chars: usize) -> String {
    let text = match value {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(ARRAY_SEPARATOR),
        other => scalar_text(other),
    };
    truncate_chars(&text, max_chars)
}

// Strings without quotes; objects and nested arrays as compact JSON
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Char-boundary safe truncation; the ellipsis counts toward the budget.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let marker = ELLIPSIS.chars().count();
    if max_chars < marker {
        return String::new();
    }
    let keep = max_chars - marker;
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
