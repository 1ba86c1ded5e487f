//! Tolerant decoding of JSON emitted by text-generation models.
//!
//! Models wrap JSON in code fences, add chatter around it, or stop mid-object
//! when they hit a token limit. [`lenient_decode`] tries, in order:
//!
//! 1. the whole text (after stripping a code fence)
//! 2. the first balanced `{...}` or `[...]` block
//! 3. a truncation repair that cuts back to the last closed element and
//!    closes whatever brackets are still open
//!
//! Callers branch on the `Result` and substitute their own default.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("response was empty")]
    Empty,
    #[error("no JSON object or array found")]
    NoJson,
    #[error("JSON did not match the expected shape: {0}")]
    Malformed(String),
}

pub fn lenient_decode<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let text = strip_code_fence(raw.trim());
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Ok(v) = serde_json::from_str::<T>(text) {
        return Ok(v);
    }

    let start = text.find(['{', '[']).ok_or(DecodeError::NoJson)?;
    let body = &text[start..];
    let scan = scan_brackets(body);

    let candidate = match scan.balanced_end {
        Some(end) => body[..=end].to_string(),
        None => repair_truncated(body, &scan).ok_or(DecodeError::NoJson)?,
    };
    serde_json::from_str::<T>(&candidate).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// The body of a fenced block, or `text` unchanged when it is not fenced.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (`json`, `JSON`, ...) up to the first newline.
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

struct Scan {
    /// Byte index of the bracket that closes the outermost container.
    balanced_end: Option<usize>,
    /// Last position where a nested container closed, with the brackets
    /// still open at that point.
    last_close: Option<(usize, Vec<u8>)>,
}

fn scan_brackets(body: &str) -> Scan {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut last_close = None;

    for (i, b) in body.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => stack.push(b),
            b'}' | b']' => {
                stack.pop();
                if stack.is_empty() {
                    return Scan {
                        balanced_end: Some(i),
                        last_close,
                    };
                }
                last_close = Some((i, stack.clone()));
            }
            _ => {}
        }
    }
    Scan {
        balanced_end: None,
        last_close,
    }
}

fn repair_truncated(body: &str, scan: &Scan) -> Option<String> {
    let (end, open) = scan.last_close.as_ref()?;
    let mut repaired = body[..=*end].to_string();
    for opener in open.iter().rev() {
        repaired.push(if *opener == b'{' { '}' } else { ']' });
    }
    Some(repaired)
}
