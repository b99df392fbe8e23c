//! Extracting structured data from model replies.
//!
//! Replies often wrap JSON in markdown fences or surround it with prose. The
//! helpers here pull out the first complete JSON object before handing it to
//! serde, so call sites validate shape rather than coerce types.

use serde::de::DeserializeOwned;
use taleweave_error::{SchemaError, SchemaErrorKind};

/// Extract a JSON object from a reply that may contain markdown or extra text.
///
/// Strategies, in order:
/// 1. fenced code blocks (```json ... ``` or bare ``` ... ```)
/// 2. first balanced `{ ... }` run
///
/// # Errors
///
/// Returns [`SchemaErrorKind::NoJson`] when neither strategy yields anything.
///
/// # Examples
///
/// ```
/// use taleweave_prompt::extract_json;
///
/// let reply = "Sure! Here it is:\n```json\n{\"done\": true}\n```\n";
/// assert_eq!(extract_json(reply).unwrap(), "{\"done\": true}");
/// ```
pub fn extract_json(reply: &str) -> Result<String, SchemaError> {
    if let Some(block) = fenced_block(reply) {
        if block.trim_start().starts_with('{') {
            return Ok(block);
        }
    }
    if let Some(object) = balanced_object(reply) {
        return Ok(object);
    }
    tracing::debug!(reply_len = reply.len(), "no JSON object found in reply");
    Err(SchemaError::new(SchemaErrorKind::NoJson(reply.len())))
}

/// Extract and deserialize a reply into `T`.
///
/// # Errors
///
/// [`SchemaErrorKind::NoJson`] when no object is present,
/// [`SchemaErrorKind::Mismatch`] when the object does not fit `T`.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T, SchemaError> {
    let json = extract_json(reply)?;
    serde_json::from_str(&json)
        .map_err(|e| SchemaError::new(SchemaErrorKind::Mismatch(e.to_string())))
}

fn fenced_block(reply: &str) -> Option<String> {
    let open = reply.find("```")?;
    let after_fence = &reply[open + 3..];
    // Skip a language tag like `json` up to the first newline.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim().to_string())
}

fn balanced_object(reply: &str) -> Option<String> {
    let start = reply.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in reply[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(reply[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
