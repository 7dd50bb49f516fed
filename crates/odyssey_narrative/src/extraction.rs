//! Utilities for extracting structured data from LLM responses.
//!
//! Replies often wrap JSON in markdown fences or surround it with prose.
//! [`extract_json`] runs an ordered chain of strategies, each failure falling
//! through to the next:
//!
//! 1. the whole trimmed reply parsed directly
//! 2. a fenced code block, preferring ```` ```json ````
//! 3. every `{` tried as the start of a balanced object

use odyssey_error::{ExtractionError, ExtractionErrorKind};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract a JSON value from a reply that may contain markdown or extra text.
///
/// # Errors
///
/// Returns [`ExtractionErrorKind::NoJson`] if no strategy recovers a value.
///
/// # Examples
///
/// ```
/// use odyssey_narrative::extract_json;
///
/// let reply = "Here's the scene:\n```json\n{\"text\": \"Rain.\"}\n```\nEnjoy!";
/// let value = extract_json(reply).unwrap();
/// assert_eq!(value["text"], "Rain.");
/// ```
pub fn extract_json(reply: &str) -> Result<Value, ExtractionError> {
    let trimmed = reply.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(block) = extract_from_code_block(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(&block)
    {
        return Ok(value);
    }

    for (start, _) in trimmed.match_indices('{') {
        if let Some(candidate) = extract_balanced(&trimmed[start..], '{', '}')
            && let Ok(value) = serde_json::from_str::<Value>(candidate)
        {
            return Ok(value);
        }
    }

    tracing::error!(reply_length = reply.len(), "No JSON found in LLM reply");
    Err(ExtractionError::new(ExtractionErrorKind::NoJson(reply.len())))
}

/// Extract JSON from a reply and deserialize it into `T`.
///
/// # Errors
///
/// Returns [`ExtractionErrorKind::NoJson`] if nothing parses, or
/// [`ExtractionErrorKind::InvalidShape`] if the value does not fit `T`.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T, ExtractionError> {
    let value = extract_json(reply)?;
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, "Reply JSON has the wrong shape");
        ExtractionError::new(ExtractionErrorKind::InvalidShape(e.to_string()))
    })
}

/// Extract the content of the first markdown code block.
///
/// A `json` fence wins over any other fence. A missing closing fence (a
/// truncated reply) yields everything after the opening fence.
fn extract_from_code_block(reply: &str) -> Option<String> {
    let pattern = "```json";
    if let Some(start) = reply.find(pattern) {
        let content_start = start + pattern.len();
        return Some(fenced_content(&reply[content_start..]));
    }

    let start = reply.find("```")?;
    let content_start = start + 3;
    // Skip the language tag, if any
    let skip_to = reply[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);
    Some(fenced_content(&reply[skip_to..]))
}

fn fenced_content(rest: &str) -> String {
    match rest.find("```") {
        Some(end) => rest[..end].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// Content from the leading `open` up to its matching `close`.
///
/// Delimiters inside string literals are ignored.
fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
