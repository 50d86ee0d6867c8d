//! Locating a JSON object inside free-form model output.

use regex::Regex;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
});

/// Extracts the JSON object embedded in `raw`.
///
/// A fenced code block wins; otherwise the first balanced `{...}` span is
/// used. Returns a reason string when nothing parseable is found.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, String> {
    if let Some(body) = JSON_FENCE
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|body| body.starts_with('{'))
    {
        return parse_object(body);
    }

    let span = first_object_span(raw).ok_or_else(|| "no JSON object found".to_string())?;
    parse_object(span)
}

fn parse_object(text: &str) -> Result<serde_json::Value, String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("malformed JSON: {e}"))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("expected a JSON object".to_string())
    }
}

/// Returns the first top-level `{...}` span, skipping braces inside strings.
fn first_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_object() {
        let value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_fenced_block_preferred() {
        let raw = "Here is {not json}\n```json\n{\"a\": 2}\n```\ntrailing";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn test_object_with_prose_around() {
        let raw = "Sure! The result is {\"text\": \"uses } and { inside\", \"n\": 3}. Done.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["text"], "uses } and { inside");
        assert_eq!(value["n"], 3);
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let raw = r#"{"quote": "she said \"}\" loudly"}"#;
        assert_eq!(extract_json(raw).unwrap()["quote"], "she said \"}\" loudly");
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json("just prose").unwrap_err(), "no JSON object found");
    }

    #[test]
    fn test_unbalanced_object() {
        assert!(extract_json("{\"a\": 1").is_err());
    }

    #[test]
    fn test_malformed_object() {
        let err = extract_json("{a: 1}").unwrap_err();
        assert!(err.starts_with("malformed JSON"));
    }
}
