//! Pulls the case list out of free-form model output.

use serde_json::Value;

/// Object keys a model sometimes wraps the case array in.
const WRAPPER_KEYS: &[&str] = &["testCases", "test_cases", "cases"];

/// Returns the JSON array of cases contained in `raw`, if any.
///
/// Accepts a bare array, an array inside a code fence, an array embedded in prose, or an
/// object carrying the array under one of the wrapper keys.
pub fn extract_json_array(raw: &str) -> Option<Vec<Value>> {
    let body = strip_code_fence(raw);
    if let Some(items) = parse_cases(body.trim()) {
        return Some(items);
    }
    balanced_slice(body, '[', ']')
        .and_then(parse_cases)
        .or_else(|| balanced_slice(body, '{', '}').and_then(parse_cases))
}

fn parse_cases(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => WRAPPER_KEYS.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

/// Contents of the first fenced block, or the input when there is none.
pub fn strip_code_fence(raw: &str) -> &str {
    let fence = "```";
    let Some(start) = raw.find(fence) else {
        return raw;
    };
    let after_fence = &raw[start + fence.len()..];
    let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    match after_lang.find(fence) {
        Some(end) => &after_lang[..end],
        None => after_lang,
    }
}

/// First balanced `open`..`close` span, skipping delimiters inside string literals.
fn balanced_slice(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in raw[start..].char_indices() {
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
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + idx + ch.len_utf8()]);
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

    #[test]
    fn extracts_from_fenced_block() {
        let input = "Here you go:\n```json\n[{\"title\":\"로그인\"}]\n```\nanything else?";
        let items = extract_json_array(input).expect("json");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "로그인");
    }

    #[test]
    fn extracts_array_embedded_in_prose() {
        let input = "cases: [ {\"title\": \"a ] tricky\"}, {\"title\": \"b\"} ] done";
        let items = extract_json_array(input).expect("json");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "a ] tricky");
    }

    #[test]
    fn unwraps_known_wrapper_objects() {
        let input = r#"{"testCases": [{"title": "x"}]}"#;
        assert_eq!(extract_json_array(input).expect("json").len(), 1);
        let input = r#"Sure! {"cases": []}"#;
        assert!(extract_json_array(input).expect("json").is_empty());
    }

    #[test]
    fn returns_none_without_array() {
        assert!(extract_json_array("I cannot help with that.").is_none());
        assert!(extract_json_array(r#"{"title": "lonely"}"#).is_none());
        assert!(extract_json_array("[1, 2").is_none());
    }
}
