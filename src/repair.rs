//! Strict parsing of model output with one bounded repair pass.
//!
//! Models asked for JSON often wrap it in markdown fences, add prose around
//! it, leave trailing commas or forget to quote keys. [`parse_model_json`]
//! first tries a strict parse; if that fails it applies [`repair`] once and
//! parses strictly again. Each transformation is a separate pure function.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{FitgenError, Result};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid code fence regex")
});

/// Parse `raw` into `T`, repairing it at most once.
///
/// Returns [`FitgenError::MalformedResponse`] when neither the raw nor the
/// repaired text parses.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    match serde_json::from_str(raw.trim()) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            debug!(error = %strict_err, "strict parse failed, repairing model output");
            let repaired = repair(raw);
            serde_json::from_str(&repaired).map_err(|e| {
                warn!(error = %e, "model output still unparseable after repair");
                FitgenError::MalformedResponse(e.to_string())
            })
        }
    }
}

/// Apply every transformation once, in order.
pub fn repair(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = extract_json_body(&text);
    let text = strip_trailing_commas(text);
    quote_bare_keys(&text)
}

/// Return the contents of the first fenced block, or the input unchanged.
///
/// An opening fence with no closing fence (truncated output) loses just the
/// opening line.
pub fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = CODE_FENCE.captures(input) {
        return caps[1].trim().to_string();
    }
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        return body.trim().to_string();
    }
    trimmed.to_string()
}

/// Slice from the first `{` or `[` to the last matching closer, dropping
/// surrounding prose. Returns the input when no JSON delimiters are found.
pub fn extract_json_body(input: &str) -> &str {
    let Some(start) = input.find(['{', '[']) else {
        return input;
    };
    let closer = if input[start..].starts_with('{') { '}' } else { ']' };
    match input.rfind(closer) {
        Some(end) if end > start => &input[start..=end],
        _ => &input[start..],
    }
}

/// Remove commas that directly precede `}` or `]`, outside string literals.
pub fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Quote identifier keys such as `{name: "x"}`, outside string literals.
pub fn quote_bare_keys(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    let mut expect_key = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
            expect_key = false;
        } else if c == '{' || c == ',' {
            expect_key = true;
        } else if c.is_whitespace() {
            // keep expecting
        } else if expect_key && (c.is_alphabetic() || c == '_') {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            let next = chars[i..].iter().find(|n| !n.is_whitespace());
            if next == Some(&':') {
                out.push('"');
                out.push_str(&ident);
                out.push('"');
            } else {
                out.push_str(&ident);
            }
            expect_key = false;
            continue;
        } else {
            expect_key = false;
        }

        out.push(c);
        i += 1;
    }
    out
}
