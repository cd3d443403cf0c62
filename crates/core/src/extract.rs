//! Best-effort JSON recovery from free-form LLM responses.
//!
//! Responses are supposed to be bare JSON but often arrive wrapped in a
//! markdown fence or preceded by prose. Each stage below is a pure function
//! that either yields a JSON value or gives up; stages run left to right and
//! the first success wins. Callers decide what to do when all of them fail.

use crate::correlate::ArtifactMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A single recovery attempt.
pub type Stage = fn(&str) -> Option<Value>;

/// Recovery stages in the order they are tried.
pub const STAGES: [(&str, Stage); 3] = [
    ("strict", strict),
    ("fenced", fenced),
    ("first brace", from_first_brace),
];

/// Parse the whole response as JSON.
pub fn strict(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

/// Parse the contents of the first markdown code fence.
pub fn fenced(text: &str) -> Option<Value> {
    serde_json::from_str(fenced_block(text)?).ok()
}

/// Parse the first JSON value starting at the first `{`, ignoring whatever
/// follows it.
pub fn from_first_brace(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// Locate the body of a ```` ```json ```` fence, or of a bare ```` ``` ````
/// fence. A missing closing fence (truncated response) runs to the end.
fn fenced_block(text: &str) -> Option<&str> {
    let body_start = if let Some(pos) = text.find("```json") {
        pos + "```json".len()
    } else {
        let pos = text.find("```")? + 3;
        // Skip an unknown language tag up to the end of the line, unless the
        // JSON itself starts on the fence line.
        match text[pos..].find('\n') {
            Some(n) if !text[pos..pos + n].contains(['{', '[']) => pos + n + 1,
            _ => pos,
        }
    };

    let body = &text[body_start..];
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };

    Some(body.trim())
}

/// Run the stages and return the first JSON value any of them recovers.
pub fn parse_lenient(text: &str) -> Option<Value> {
    STAGES.iter().find_map(|(name, stage)| {
        let value = stage(text)?;
        log::debug!("Recovered JSON with the {} stage", name);
        Some(value)
    })
}

/// Like [`parse_lenient`], but keeps going until a stage produces a value
/// that deserializes into `T`.
pub fn parse_lenient_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    STAGES.iter().find_map(|(name, stage)| {
        let parsed = serde_json::from_value(stage(text)?).ok()?;
        log::debug!("Recovered typed JSON with the {} stage", name);
        Some(parsed)
    })
}

/// Recover a title-keyed artifact map. Only JSON objects qualify.
pub fn parse_artifact_map(text: &str) -> Option<ArtifactMap> {
    STAGES.iter().find_map(|(name, stage)| match stage(text)? {
        Value::Object(object) => {
            log::debug!("Recovered artifact map with the {} stage", name);
            Some(ArtifactMap::from_json_object(object))
        }
        _ => None,
    })
}
