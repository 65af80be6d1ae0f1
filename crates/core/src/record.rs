//! Content records: the authored source of truth for one card.
//!
//! The authoring system returns a JSON document whose fields are either bare
//! scalars or `{"value": ...}` wrappers, optionally nested under a
//! `properties.elements` (or plain `elements`) envelope. `ContentRecord`
//! flattens all of these into one field map.

use serde_json::{Map, Value};

use crate::error::StoreError;

/// Field names read from a card record.
pub mod fields {
    pub const CARD_ID: &str = "cardId";
    pub const HEADLINE: &str = "headline";
    pub const BODY: &str = "body";
    pub const IMAGE: &str = "image";
    pub const CTA_LABEL: &str = "ctaLabel";
    pub const CTA_ACTION: &str = "ctaAction";
    pub const TERMS_TEXT: &str = "termsText";
    pub const CACHE_TTL: &str = "cacheTTL";
}

/// A fetched content record: field name → scalar value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentRecord {
    fields: Map<String, Value>,
}

impl ContentRecord {
    /// Build a record from the JSON returned by the source.
    ///
    /// Fails only when the document (or its element envelope) is not a JSON
    /// object. Missing fields are not an error here.
    pub fn from_json(document: Value) -> Result<Self, StoreError> {
        let Value::Object(mut root) = document else {
            return Err(StoreError::Decode(
                "content record must be a JSON object".into(),
            ));
        };

        let elements = match root.remove("properties") {
            Some(Value::Object(mut properties)) if properties.contains_key("elements") => {
                properties.remove("elements")
            }
            Some(other) => {
                root.insert("properties".into(), other);
                root.remove("elements")
            }
            None => root.remove("elements"),
        };

        let source = match elements {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(StoreError::Decode(
                    "content record elements must be a JSON object".into(),
                ));
            }
            None => root,
        };

        let fields = source
            .into_iter()
            .filter_map(|(name, value)| unwrap_value(value).map(|v| (name, v)))
            .collect();

        Ok(Self { fields })
    }

    /// Field as text. Numbers and booleans are rendered with their JSON form.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The card id, when present and not blank.
    pub fn card_id(&self) -> Option<String> {
        self.text(fields::CARD_ID)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    /// Cache lifetime in seconds, when the field holds a non-negative integer.
    ///
    /// Accepts JSON integers and numeric strings; anything else yields `None`.
    pub fn cache_ttl(&self) -> Option<u64> {
        match self.fields.get(fields::CACHE_TTL)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Strip a `{"value": ...}` wrapper and drop nulls and nested structures.
fn unwrap_value(value: Value) -> Option<Value> {
    let value = match value {
        Value::Object(mut wrapper) => wrapper.remove("value")?,
        other => other,
    };
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(value),
        _ => None,
    }
}
