//! JSON extraction from free-form generated text.
//!
//! Models respond with prose, markdown fences, or bare JSON depending on
//! mood. One parser with a fixed precedence lives here instead of ad hoc
//! string matching at call sites: fenced block first, then a brace-balanced
//! scan, then failure.

use serde_json::Value;

/// Extract the first JSON object from generated text.
///
/// Returns `None` when no parseable object is found. Non-object JSON (arrays,
/// scalars) does not count.
pub fn first_json_object(text: &str) -> Option<Value> {
    if let Some(value) = from_fenced_block(text) {
        return Some(value);
    }
    from_brace_scan(text)
}

/// Try every markdown code fence, in order, for a parseable object.
fn from_fenced_block(text: &str) -> Option<Value> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        // Skip the info string ("json", "javascript", ...) up to the newline.
        let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_open[body_start..];
        let Some(close) = body.find("```") else {
            return None;
        };
        if let Some(value) = parse_object(&body[..close]) {
            return Some(value);
        }
        rest = &body[close + 3..];
    }
    None
}

/// Scan for a balanced `{...}` span, string-literal aware.
fn from_brace_scan(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(open) = text[start..].find('{').map(|i| start + i) {
        if let Some(end) = balanced_end(bytes, open) {
            if let Some(value) = parse_object(&text[open..=end]) {
                return Some(value);
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the `}` closing the object opened at `open`, honoring strings.
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
