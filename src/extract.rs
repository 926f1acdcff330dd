use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExtractError;

// `{...}` with no nested braces naming both keys, in either order
static OBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{[^{}]*(?:"emotion"[^{}]*"cause"|"cause"[^{}]*"emotion")[^{}]*\}"#)
        .expect("static regex")
});
// captured values are still JSON-escaped
static EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""emotion"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("static regex")
});
static CAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""cause"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("static regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractedAnswer {
    pub emotion: String,
    pub cause: String,
}

/// Which rule recovered the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    WholeObject,
    EmbeddedObject,
    Fields,
}

pub fn extract(raw: &str) -> Result<ExtractedAnswer, ExtractError> {
    extract_with_layer(raw).map(|(answer, _)| answer)
}

pub fn extract_with_layer(raw: &str) -> Result<(ExtractedAnswer, Layer), ExtractError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    if text.starts_with('{') && text.ends_with('}') {
        if let Some(answer) = parse_object(text) {
            return Ok((answer, Layer::WholeObject));
        }
        log::debug!("whole-text JSON parse failed, searching for an embedded object");
    }

    for m in OBJECT_RE.find_iter(text) {
        if let Some(answer) = parse_object(m.as_str()) {
            return Ok((answer, Layer::EmbeddedObject));
        }
    }

    let emotion = field(&EMOTION_RE, text);
    let cause = field(&CAUSE_RE, text);
    if let (Some(emotion), Some(cause)) = (emotion, cause) {
        return Ok((ExtractedAnswer { emotion, cause }, Layer::Fields));
    }

    Err(ExtractError::NoAnswer)
}

// first match whose literal decodes as a JSON string
fn field(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| serde_json::from_str::<String>(&format!("\"{}\"", m.as_str())).ok())
}

// an object counts if at least one of the two keys holds a string
fn parse_object(text: &str) -> Option<ExtractedAnswer> {
    let value: Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    let emotion = obj.get("emotion").and_then(Value::as_str);
    let cause = obj.get("cause").and_then(Value::as_str);
    if emotion.is_none() && cause.is_none() {
        return None;
    }
    Some(ExtractedAnswer {
        emotion: emotion.unwrap_or_default().to_string(),
        cause: cause.unwrap_or_default().to_string(),
    })
}
