//! Fix strategy selection.
//!
//! Maps a classified failure to a remediation:
//!
//! | Category                                   | Strategy       |
//! |--------------------------------------------|----------------|
//! | `IMPORT_ERROR` naming a package            | `unfixable`    |
//! | `IMPORT_ERROR` naming a relative path      | `quick_fix`    |
//! | `TYPE_ERROR` mentioning a mock or syntax   | `quick_fix`    |
//! | `TYPE_ERROR` otherwise                     | `external_fix` |
//! | `MOCK_ERROR`                               | `external_fix` |
//! | `ASSERTION_ERROR`                          | `external_fix` |
//! | `SYNTAX_ERROR`                             | `quick_fix`    |
//! | `RUNTIME_ERROR`                            | `external_fix` |
//! | `UNKNOWN`                                  | `external_fix` |
//!
//! The table is policy and may be retuned, with one fixed rule: an import of
//! a package that is not installed never triggers a fix attempt, because no
//! rewrite of the test can supply a missing dependency.

use tracing::debug;

use crate::domain::models::{ErrorCategory, FixStrategy, ParsedError};

/// Substrings marking a type error as the stray-annotation defect.
const QUICK_FIXABLE_TYPE_MARKERS: &[&str] = &[
    "jest.mock",
    "vi.mock",
    "factory",
    "SyntaxError",
    "Unexpected token",
];

/// Whether a module specifier refers to a file in the project rather than a package.
pub fn is_relative_specifier(specifier: &str) -> bool {
    matches!(specifier, "." | "..") || specifier.starts_with("./") || specifier.starts_with("../")
}

fn mentions_quick_fixable_construct(message: &str) -> bool {
    QUICK_FIXABLE_TYPE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Chooses how to remediate a [`ParsedError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FixStrategySelector;

impl FixStrategySelector {
    pub const fn new() -> Self {
        Self
    }

    pub fn select(&self, error: &ParsedError) -> FixStrategy {
        let strategy = match error.category {
            ErrorCategory::ImportError => match error.module_specifier() {
                Some(specifier) if is_relative_specifier(specifier) => FixStrategy::QuickFix,
                Some(_) => FixStrategy::Unfixable,
                // Without a specifier there is no way to tell a package from a path.
                None => FixStrategy::ExternalFix,
            },
            ErrorCategory::TypeError if mentions_quick_fixable_construct(&error.message) => {
                FixStrategy::QuickFix
            }
            ErrorCategory::SyntaxError => FixStrategy::QuickFix,
            ErrorCategory::TypeError
            | ErrorCategory::MockError
            | ErrorCategory::AssertionError
            | ErrorCategory::RuntimeError
            | ErrorCategory::Unknown => FixStrategy::ExternalFix,
        };

        debug!(
            category = %error.category,
            strategy = %strategy,
            "Selected fix strategy"
        );
        strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(category: ErrorCategory, message: &str) -> ParsedError {
        ParsedError {
            category,
            message: message.to_string(),
            location: None,
            error_count: 1,
            raw_output: message.to_string(),
        }
    }

    fn select(category: ErrorCategory, message: &str) -> FixStrategy {
        FixStrategySelector::new().select(&error(category, message))
    }

    #[test]
    fn relative_import_is_quick_fix() {
        assert_eq!(
            select(ErrorCategory::ImportError, "Cannot find module './missing'"),
            FixStrategy::QuickFix
        );
        assert_eq!(
            select(ErrorCategory::ImportError, "Cannot find module '../lib/a'"),
            FixStrategy::QuickFix
        );
    }

    #[test]
    fn directory_import_is_quick_fix() {
        for message in ["Cannot find module '.'", "Cannot find module '..' from 'a.test.ts'"] {
            assert_eq!(
                select(ErrorCategory::ImportError, message),
                FixStrategy::QuickFix
            );
        }
        assert!(!is_relative_specifier("...."));
    }

    #[test]
    fn package_import_is_unfixable() {
        assert_eq!(
            select(ErrorCategory::ImportError, "Cannot find module 'left-pad'"),
            FixStrategy::Unfixable
        );
        assert_eq!(
            select(ErrorCategory::ImportError, "Cannot find module '@scope/pkg/sub'"),
            FixStrategy::Unfixable
        );
    }

    #[test]
    fn import_without_specifier_defers() {
        assert_eq!(
            select(ErrorCategory::ImportError, "Cannot find module"),
            FixStrategy::ExternalFix
        );
    }

    #[test]
    fn type_error_with_syntax_marker_is_quick_fix() {
        assert_eq!(
            select(
                ErrorCategory::TypeError,
                "SyntaxError: a.test.js: Unexpected token, expected \",\" (2:9)"
            ),
            FixStrategy::QuickFix
        );
        assert_eq!(
            select(ErrorCategory::TypeError, "jest.mock factory has typed params"),
            FixStrategy::QuickFix
        );
    }

    #[test]
    fn plain_type_error_is_external() {
        assert_eq!(
            select(
                ErrorCategory::TypeError,
                "TypeError: Cannot read properties of undefined"
            ),
            FixStrategy::ExternalFix
        );
    }

    #[test]
    fn remaining_categories() {
        assert_eq!(select(ErrorCategory::SyntaxError, "SyntaxError: x"), FixStrategy::QuickFix);
        assert_eq!(select(ErrorCategory::MockError, "m"), FixStrategy::ExternalFix);
        assert_eq!(select(ErrorCategory::AssertionError, "a"), FixStrategy::ExternalFix);
        assert_eq!(select(ErrorCategory::RuntimeError, "r"), FixStrategy::ExternalFix);
        assert_eq!(select(ErrorCategory::Unknown, "?"), FixStrategy::ExternalFix);
    }

    #[test]
    fn relative_specifier_detection() {
        assert!(is_relative_specifier("./a"));
        assert!(is_relative_specifier("../../a"));
        assert!(!is_relative_specifier("lodash"));
        assert!(!is_relative_specifier("@/components/x"));
        assert!(!is_relative_specifier(".hidden"));
    }
}
