//! Best-effort recovery of JSON values from generative-model replies.
//!
//! Model output carrying structured data is unreliable: replies get cut off
//! by token limits, wrapped in markdown fences or explanatory prose, and
//! sprinkled with trailing commas. This module recovers the first JSON value
//! from such text through an ordered ladder of repair strategies, each pure
//! and independently testable, composed by a single driver that returns on
//! the first successful parse.
//!
//! The ladder is ordered from least to most invasive so well-formed input is
//! never mangled:
//!
//! 1. strip markdown fences, locate the first `{` or `[`
//! 2. parse the candidate as-is
//! 3. cut at the rightmost closing brace/bracket
//! 4. append the single closer matching the opening character
//! 5. stack-balance all unmatched openers
//! 6. progressively trim from the right
//!
//! Absence of a parseable value is `None`, never an error.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// Fenced code blocks, with or without the `json` language tag.
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?is)```(?:json)?\s*(.*?)\s*```").expect("fenced block pattern");
    /// An unclosed opening fence at the start of the text.
    static ref LEADING_FENCE: Regex =
        Regex::new(r"(?i)^(?:```json|```)\s*").expect("leading fence pattern");
    /// An unclosed closing fence at the end of the text.
    static ref TRAILING_FENCE: Regex =
        Regex::new(r"(?i)\s*(?:```json|```)\s*$").expect("trailing fence pattern");
    /// A trailing comma immediately before the final closer.
    static ref COMMA_BEFORE_FINAL_CLOSER: Regex =
        Regex::new(r",\s*(\]|\})$").expect("final trailing comma pattern");
    /// Any comma directly before a closer.
    static ref COMMA_BEFORE_CLOSER: Regex =
        Regex::new(r",\s*(\]|\})").expect("trailing comma pattern");
}

/// Remove markdown/code fences and surrounding noise from model output.
pub fn strip_code_fences(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = FENCED_BLOCK.replace_all(text, "$1");
    let text = LEADING_FENCE.replace(&text, "");
    let text = TRAILING_FENCE.replace(&text, "");
    text.trim().trim_matches('`').trim().to_string()
}

/// Find and return the first JSON object or array within `text`.
///
/// Returns `None` when no value can be recovered. Never panics.
pub fn extract_first_json(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }

    let cleaned = strip_code_fences(text);

    // Everything before the first opening brace/bracket is commentary.
    let start = cleaned.find(|c| c == '{' || c == '[')?;
    let candidate = cleaned[start..].trim();

    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    truncate_to_last_closer(candidate)
        .or_else(|| close_outermost(candidate))
        .or_else(|| balance_and_close(candidate))
        .or_else(|| trim_progressively(candidate))
}

/// Cut the candidate at its rightmost `}` or `]` and re-parse.
///
/// Recovers replies where the structure is complete but followed by
/// trailing prose the fence stripping did not remove.
fn truncate_to_last_closer(candidate: &str) -> Option<Value> {
    let last_brace = candidate.rfind('}');
    let last_bracket = candidate.rfind(']');
    let end = match (last_brace, last_bracket) {
        (Some(b), Some(k)) => b.max(k),
        (Some(b), None) => b,
        (None, Some(k)) => k,
        (None, None) => return None,
    };
    serde_json::from_str(&candidate[..=end]).ok()
}

/// Append the single closer matching the candidate's opening character.
///
/// Handles the common truncation case of one unterminated outer structure,
/// dropping a trailing comma left before the appended closer.
fn close_outermost(candidate: &str) -> Option<Value> {
    let closer = match candidate.chars().next() {
        Some('{') => '}',
        Some('[') => ']',
        _ => return None,
    };
    let attempt = format!("{candidate}{closer}");
    let attempt = COMMA_BEFORE_FINAL_CLOSER.replace(&attempt, "$1");
    serde_json::from_str(&attempt).ok()
}

/// Walk the candidate keeping a stack of open braces/brackets, then append
/// whatever closers are missing in reverse-open order.
fn balance_and_close(candidate: &str) -> Option<Value> {
    let mut stack = Vec::new();
    for ch in candidate.chars() {
        match ch {
            '{' | '[' => stack.push(ch),
            '}' => {
                if stack.last() == Some(&'{') {
                    stack.pop();
                }
            }
            ']' => {
                if stack.last() == Some(&'[') {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let closing: String = stack
        .iter()
        .rev()
        .map(|c| if *c == '{' { '}' } else { ']' })
        .collect();

    let attempt = format!("{candidate}{closing}");
    let attempt = COMMA_BEFORE_CLOSER.replace_all(&attempt, "$1");
    serde_json::from_str(&attempt).ok()
}

/// Last resort: parse progressively shorter prefixes of the candidate,
/// stripping a trailing comma before the final closer at each step.
fn trim_progressively(candidate: &str) -> Option<Value> {
    let boundaries: Vec<usize> = candidate
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect();

    for end in boundaries.into_iter().rev() {
        let prefix = &candidate[..end];
        let attempt = COMMA_BEFORE_FINAL_CLOSER.replace(prefix, "$1");
        if let Ok(value) = serde_json::from_str(&attempt) {
            return Some(value);
        }
    }
    None
}
