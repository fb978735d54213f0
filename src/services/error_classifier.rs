//! Failure classification for test runner output.
//!
//! Turns raw runner output into a [`ParsedError`]. Categories are tried in a
//! fixed priority order and the first one whose matcher fires wins:
//!
//! | Priority | Category          | Recognizes                                           |
//! |----------|-------------------|------------------------------------------------------|
//! | 1        | `IMPORT_ERROR`    | unresolved module references                         |
//! | 2        | `MOCK_ERROR`      | mock factory / mock function failures                |
//! | 3        | `TYPE_ERROR`      | type errors, and syntax errors from stray annotations |
//! | 4        | `ASSERTION_ERROR` | expectation mismatches                               |
//! | 5        | `SYNTAX_ERROR`    | generic parse failures                               |
//! | 6        | `RUNTIME_ERROR`   | uncaught `ReferenceError` / `RangeError`             |
//! | 7        | `UNKNOWN`         | nothing matched                                      |
//!
//! Mock and import failures are checked before the generic `TypeError`
//! matcher because a single run often satisfies both, and the narrower
//! category is the one a fix can act on.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::{char_prefix, ErrorCategory, ErrorLocation, ParsedError};

/// Maximum characters of an Expected/Received block kept as the message.
pub const ASSERTION_BLOCK_CHARS: usize = 500;

/// Maximum characters of raw output kept as the message when nothing matched.
pub const UNKNOWN_MESSAGE_CHARS: usize = 500;

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this file and covered by tests.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid classifier pattern {pattern}: {e}"))
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

static IMPORT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"Cannot find module ['"`][^'"`\n]+['"`]"#,
        r#"Can't resolve ['"`][^'"`\n]+['"`]"#,
        r#"Failed to resolve import ['"`][^'"`\n]+['"`]"#,
    ])
});

static MOCK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"The module factory of `(?:jest|vi)\.mock\(\)` is not allowed to reference any out-of-scope variables[^\n]*",
        r"[^\n]*\bmock(?:Implementation|ReturnValue|ResolvedValue|RejectedValue|Clear|Reset|Restore)(?:Once)?\b[^\n]*is not a function[^\n]*",
        r"[^\n]*\[vitest\] There was an error when mocking a module[^\n]*",
        r"[^\n]*\b(?:jest|vi)\.mock\(\)[^\n]*",
        r"[^\n]*\bmock factory\b[^\n]*",
    ])
});

static TYPE_SCRIPT_DIAGNOSTIC: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[^\n]*\berror TS\d+:[^\n]*"));

static TYPE_ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"TypeError:[^\n]*"));

static SYNTAX_ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"SyntaxError:[^\n]*"));

/// A parameter annotated with a simple type, as it shows up in a code frame.
static STRAY_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"[(,]\s*[A-Za-z_$][\w$]*\??\s*:\s*(?:string|number|boolean|bigint|symbol|any|unknown|void|object|never|undefined|null)\b",
    )
});

static ASSERTION_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\bExpected\b[^\n]*\n(?:[^\n]*\n){0,3}?[^\n]*\bReceived\b[^\n]*")
});

static ASSERTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"expect\([^\n]*\)\.(?:not\.)?(?:resolves\.|rejects\.)?to[A-Z]\w*\([^\n]*",
        r"AssertionError[^\n]*",
    ])
});

static SYNTAX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"SyntaxError:[^\n]*",
        r"Jest encountered an unexpected token[^\n]*",
        r"Unexpected token[^\n]*",
    ])
});

static RUNTIME_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[r"ReferenceError:[^\n]*", r"RangeError:[^\n]*"]));

static FAILURE_COUNT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)(\d+)\s+fail"));

static STACK_FRAME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\bat\s+[^\n]*?\(([^()\n]+):(\d+):(\d+)\)"));

/// A matcher returns the message for its category, or `None` if it does not apply.
type Matcher = fn(&str) -> Option<String>;

/// Category matchers in priority order.
const RULES: &[(ErrorCategory, Matcher)] = &[
    (ErrorCategory::ImportError, match_import),
    (ErrorCategory::MockError, match_mock),
    (ErrorCategory::TypeError, match_type),
    (ErrorCategory::AssertionError, match_assertion),
    (ErrorCategory::SyntaxError, match_syntax),
    (ErrorCategory::RuntimeError, match_runtime),
];

fn first_match(patterns: &[Regex], output: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.find(output))
        .map(|m| m.as_str().trim().to_string())
}

fn match_import(output: &str) -> Option<String> {
    first_match(&IMPORT_PATTERNS, output)
}

fn match_mock(output: &str) -> Option<String> {
    first_match(&MOCK_PATTERNS, output)
}

fn match_type(output: &str) -> Option<String> {
    // A syntax error whose code frame shows a typed parameter is really a
    // type annotation the JavaScript parser could not handle.
    if let Some(syntax) = SYNTAX_ERROR_LINE.find(output) {
        if STRAY_ANNOTATION.is_match(output) {
            return Some(syntax.as_str().trim().to_string());
        }
    }
    TYPE_SCRIPT_DIAGNOSTIC
        .find(output)
        .or_else(|| TYPE_ERROR_LINE.find(output))
        .map(|m| m.as_str().trim().to_string())
}

fn match_assertion(output: &str) -> Option<String> {
    if let Some(block) = ASSERTION_BLOCK.find(output) {
        let block = block.as_str().trim();
        return Some(char_prefix(block, ASSERTION_BLOCK_CHARS).to_string());
    }
    first_match(&ASSERTION_PATTERNS, output)
}

fn match_syntax(output: &str) -> Option<String> {
    first_match(&SYNTAX_PATTERNS, output)
}

fn match_runtime(output: &str) -> Option<String> {
    first_match(&RUNTIME_PATTERNS, output)
}

/// Read the failing count from the first `<n> fail` occurrence, defaulting to 1.
///
/// This undercounts runs whose first summary line is the suite tally rather
/// than the test tally. The repair loop only compares counts produced by this
/// same function, so the approximation is consistent across iterations.
fn extract_error_count(output: &str) -> u32 {
    FAILURE_COUNT
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map_or(1, |n| n.max(1))
}

fn extract_location(output: &str) -> Option<ErrorLocation> {
    let caps = STACK_FRAME.captures(output)?;
    let file = caps.get(1)?.as_str().trim().to_string();
    let line = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some(ErrorLocation { file, line })
}

// ---------------------------------------------------------------------------
// ErrorClassifier
// ---------------------------------------------------------------------------

/// Classifies raw test runner output.
///
/// Classification is a pure function of its input: no I/O, no state, and
/// identical output always produces an identical [`ParsedError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub const fn new() -> Self {
        Self
    }

    pub fn classify(&self, raw_output: &str) -> ParsedError {
        let (category, message) = RULES
            .iter()
            .find_map(|(category, matcher)| matcher(raw_output).map(|msg| (*category, msg)))
            .unwrap_or_else(|| {
                (
                    ErrorCategory::Unknown,
                    char_prefix(raw_output.trim(), UNKNOWN_MESSAGE_CHARS).to_string(),
                )
            });

        ParsedError {
            category,
            message,
            location: extract_location(raw_output),
            error_count: extract_error_count(raw_output),
            raw_output: raw_output.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
