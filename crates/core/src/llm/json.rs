use anyhow::Context;
use serde::de::DeserializeOwned;

/// Pulls the JSON value that opens with `open` (`{` or `[`) out of provider text.
///
/// Fenced blocks win; otherwise the span runs from the first `open` to the last
/// matching closer, so prose such as citation markers in front of the payload is
/// skipped when it uses the other bracket kind.
pub fn extract_json(text: &str, open: char) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    let close = match open {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };
    let start = trimmed.find(open)?;
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].to_string())
}

/// Decodes provider text into `T`, tolerating fences or prose around the JSON.
///
/// The bare text is tried first, then the object span and the array span.
pub fn parse_as<T: DeserializeOwned>(text: &str) -> anyhow::Result<T> {
    let trimmed = text.trim();
    let mut first_err = match serde_json::from_str::<T>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => (trimmed.to_string(), e),
    };

    let mut tried_span = false;
    for open in ['{', '['] {
        let Some(candidate) = extract_json(trimmed, open) else {
            continue;
        };
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return Ok(value),
            Err(e) if !tried_span => first_err = (candidate, e),
            Err(_) => {}
        }
        tried_span = true;
    }

    let (json_str, err) = first_err;
    Err(err).with_context(|| {
        format!(
            "LLM output does not match the declared {} schema: {json_str}",
            std::any::type_name::<T>()
        )
    })
}
