//! Raw vendor payloads
//!
//! The adapter boundary accepts either a structured JSON document (EHR
//! exports) or delimited text (HL7 v2 messages).

use serde_json::Value;

/// An opaque vendor document as received from upstream extraction
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Json(Value),
    Text(String),
}

impl RawPayload {
    /// Interprets raw file contents
    ///
    /// Content that parses as a JSON object or array becomes [`RawPayload::Json`];
    /// anything else is kept as text.
    ///
    /// ```
    /// use aegis::adapters::RawPayload;
    ///
    /// assert!(matches!(RawPayload::from_content(r#"{"PAT_MRN": "1"}"#), RawPayload::Json(_)));
    /// assert!(matches!(RawPayload::from_content("MSH|^~\\&|LAB"), RawPayload::Text(_)));
    /// ```
    pub fn from_content(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(content) {
                return RawPayload::Json(value);
            }
        }
        RawPayload::Text(content.to_string())
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RawPayload::Json(value) => Some(value),
            RawPayload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawPayload::Text(text) => Some(text),
            RawPayload::Json(_) => None,
        }
    }

    /// Short name of the payload shape, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            RawPayload::Json(_) => "JSON document",
            RawPayload::Text(_) => "text message",
        }
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        RawPayload::Json(value)
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        RawPayload::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_content_json() {
        let payload = RawPayload::from_content("  {\"id\": \"p1\"}");
        assert_eq!(payload.as_json(), Some(&json!({"id": "p1"})));
        assert!(payload.as_text().is_none());
    }

    #[test]
    fn test_from_content_invalid_json_is_text() {
        let payload = RawPayload::from_content("{not json");
        assert_eq!(payload.as_text(), Some("{not json"));
        assert_eq!(payload.kind(), "text message");
    }
}
