//! Deterministic quick fixes.
//!
//! Two pure string-to-string rewrites for defects that show up often enough
//! to be fixed without external reasoning:
//!
//! 1. **Mock factory annotations.** Type annotations written inside a
//!    `jest.mock(...)` / `vi.mock(...)` factory break the JavaScript parser.
//!    Annotations are removed from the factory span only; typed code
//!    elsewhere in the file is left alone.
//! 2. **Relative import depth.** An unresolved relative specifier (`./x`,
//!    `../x`, `.` or `..`) is rewritten with one more `../` level. This is a
//!    textual heuristic, not a filesystem lookup.
//!
//! [`QuickFixEngine::apply`] returns `None` instead of an unchanged string, so
//! a no-op rewrite is never booked as a fix.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::models::{ErrorCategory, ParsedError};
use crate::services::fix_strategy::is_relative_specifier;

/// Type spellings removed from mock factory parameters.
///
/// Generic (one level of nesting) and array spellings come first so that
/// `string[]` is removed whole rather than leaving `[]` behind.
const TYPE_NAME: &str = r"(?:[A-Za-z_$][\w$.]*\s*<(?:[^<>()]|<[^<>()]*>)*>(?:\[\])*|[A-Za-z_$][\w$]*(?:\[\])+|(?:string|number|boolean|bigint|symbol|null|undefined|never|any|unknown|void|object)\b)";

static MOCK_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:jest|vi)\.(?:mock|doMock|unstable_mockModule)\s*\(")
        .unwrap_or_else(|e| panic!("invalid mock call pattern: {e}"))
});

static PARAM_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"([(,]\s*)([A-Za-z_$][\w$]*)\??\s*:\s*{TYPE_NAME}(\s*[,)=])"
    ))
    .unwrap_or_else(|e| panic!("invalid parameter annotation pattern: {e}"))
});

static RETURN_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(\))\s*:\s*{TYPE_NAME}(\s*=>)"))
        .unwrap_or_else(|e| panic!("invalid return annotation pattern: {e}"))
});

/// What may follow the closing parenthesis of a parameter list: an optional
/// return annotation, then an arrow or a function body.
static PARAM_LIST_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?::\s*{TYPE_NAME}\s*)?(=>|\{{)"))
        .unwrap_or_else(|e| panic!("invalid parameter list end pattern: {e}"))
});

/// Keywords whose parenthesised head opens a statement block, not a function body.
const BLOCK_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "with"];

// ---------------------------------------------------------------------------
// Mock factory spans
// ---------------------------------------------------------------------------

/// If `code[i]` opens a string literal or comment, the index of its last byte.
///
/// Template literal interpolations are treated as opaque string content.
fn skip_literal(code: &[u8], mut i: usize) -> Option<usize> {
    match code[i] {
        quote @ (b'\'' | b'"' | b'`') => {
            i += 1;
            while i < code.len() && code[i] != quote {
                if code[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            Some(i)
        }
        b'/' if code.get(i + 1) == Some(&b'/') => {
            while i < code.len() && code[i] != b'\n' {
                i += 1;
            }
            Some(i)
        }
        b'/' if code.get(i + 1) == Some(&b'*') => {
            i += 2;
            while i + 1 < code.len() && !(code[i] == b'*' && code[i + 1] == b'/') {
                i += 1;
            }
            Some(i + 1)
        }
        _ => None,
    }
}

/// Scan a call's argument list starting just after its opening parenthesis.
///
/// Returns the index of the first top-level comma (if any) and the index of
/// the matching closing parenthesis. String literals and comments are
/// skipped.
fn scan_call_arguments(code: &[u8], start: usize) -> Option<(Option<usize>, usize)> {
    let mut depth: usize = 1;
    let mut first_comma = None;
    let mut i = start;

    while i < code.len() {
        if let Some(end) = skip_literal(code, i) {
            i = end + 1;
            continue;
        }
        match code[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return (code[i] == b')').then_some((first_comma, i));
                }
            }
            b',' if depth == 1 && first_comma.is_none() => first_comma = Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Byte ranges of every mock factory (the second argument of a mock
/// registration call), in source order.
pub fn mock_factory_spans(code: &str) -> Vec<Range<usize>> {
    let bytes = code.as_bytes();
    MOCK_CALL
        .find_iter(code)
        .filter_map(|call| {
            let (comma, close) = scan_call_arguments(bytes, call.end())?;
            comma.map(|comma| comma + 1..close)
        })
        .collect()
}

/// The identifier written immediately before `before`'s trailing whitespace.
fn preceding_word(before: &str) -> &str {
    let trimmed = before.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .map_or(0, |(at, c)| at + c.len_utf8());
    &trimmed[start..]
}

/// Byte ranges, parentheses included, of every function parameter list in
/// `segment`: a parenthesised group followed by `=>` or by a function body.
///
/// Object literal properties and call arguments are never inside one.
fn parameter_lists(segment: &str) -> Vec<Range<usize>> {
    let bytes = segment.as_bytes();
    let mut lists = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_literal(bytes, i) {
            i = end + 1;
            continue;
        }
        if bytes[i] == b'(' {
            if let Some((_, close)) = scan_call_arguments(bytes, i + 1) {
                let is_list = PARAM_LIST_END
                    .captures(&segment[close + 1..])
                    .is_some_and(|next| {
                        &next[1] == "=>"
                            || !BLOCK_KEYWORDS.contains(&preceding_word(&segment[..i]))
                    });
                if is_list {
                    lists.push(i..close + 1);
                }
            }
        }
        i += 1;
    }
    lists
}

/// Marks the bytes of a parenthesised list that sit at its outermost level.
fn top_level_mask(list: &[u8]) -> Vec<bool> {
    let mut mask = vec![false; list.len()];
    let mut depth: usize = 0;
    let mut i = 0;

    while i < list.len() {
        if let Some(end) = skip_literal(list, i) {
            i = end + 1;
            continue;
        }
        match list[i] {
            b'(' | b'[' | b'{' => {
                depth += 1;
                mask[i] = depth == 1;
            }
            b')' | b']' | b'}' => {
                mask[i] = depth == 1;
                depth = depth.saturating_sub(1);
            }
            _ => mask[i] = depth == 1,
        }
        i += 1;
    }
    mask
}

/// Remove the annotations of one parameter list's own parameters.
///
/// Default values such as `{ cache: null }` sit deeper than the list itself
/// and are left untouched.
fn strip_parameter_list(list: &str) -> String {
    let mut current = list.to_string();
    loop {
        // Adjacent parameters share a delimiter, so one pass can leave every
        // other annotation behind. Repeat until nothing changes.
        let mask = top_level_mask(current.as_bytes());
        let stripped = PARAM_ANNOTATION.replace_all(&current, |caps: &Captures<'_>| {
            if caps.get(0).is_some_and(|m| mask[m.start()]) {
                format!("{}{}{}", &caps[1], &caps[2], &caps[3])
            } else {
                caps[0].to_string()
            }
        });
        if stripped == current {
            return current;
        }
        current = stripped.into_owned();
    }
}

/// Remove parameter and return type annotations from one factory body.
fn strip_annotations(segment: &str) -> String {
    let mut current = segment.to_string();
    'rescan: loop {
        // A rewrite shifts every later offset, and nested lists overlap, so
        // the lists are found again after each change.
        for list in parameter_lists(&current).into_iter().rev() {
            let stripped = strip_parameter_list(&current[list.clone()]);
            if stripped != current[list.clone()] {
                current.replace_range(list, &stripped);
                continue 'rescan;
            }
        }
        return RETURN_ANNOTATION.replace_all(&current, "${1}${2}").into_owned();
    }
}

/// Strip type annotations inside every mock factory span of `code`.
pub fn strip_mock_factory_annotations(code: &str) -> String {
    let mut result = code.to_string();
    // Back to front keeps earlier byte offsets valid.
    for span in mock_factory_spans(code).into_iter().rev() {
        let stripped = strip_annotations(&result[span.clone()]);
        result.replace_range(span, &stripped);
    }
    result
}

// ---------------------------------------------------------------------------
// Import depth
// ---------------------------------------------------------------------------

/// The specifier with one more parent-directory level.
pub fn deepen_specifier(specifier: &str) -> String {
    if specifier == "." {
        return "..".to_string();
    }
    match specifier.strip_prefix("./") {
        Some(rest) => format!("../{rest}"),
        None => format!("../{specifier}"),
    }
}

/// Replace every quoted occurrence of `specifier` with its deepened form.
pub fn adjust_import_depth(code: &str, specifier: &str) -> String {
    let deeper = deepen_specifier(specifier);
    ['\'', '"', '`'].iter().fold(code.to_string(), |acc, quote| {
        acc.replace(
            &format!("{quote}{specifier}{quote}"),
            &format!("{quote}{deeper}{quote}"),
        )
    })
}

// ---------------------------------------------------------------------------
// QuickFixEngine
// ---------------------------------------------------------------------------

/// Applies the registered deterministic rewrite for an error category.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickFixEngine;

impl QuickFixEngine {
    pub const fn new() -> Self {
        Self
    }

    /// Rewrite `test_code` for `error`.
    ///
    /// Returns `None` when the category has no registered rewrite or the
    /// rewrite leaves the code byte-identical.
    pub fn apply(&self, test_code: &str, error: &ParsedError) -> Option<String> {
        let fixed = match error.category {
            ErrorCategory::ImportError => {
                let specifier = error
                    .module_specifier()
                    .filter(|s| is_relative_specifier(s))?;
                adjust_import_depth(test_code, specifier)
            }
            ErrorCategory::TypeError | ErrorCategory::SyntaxError => {
                strip_mock_factory_annotations(test_code)
            }
            _ => return None,
        };
        (fixed != test_code).then_some(fixed)
    }
}
