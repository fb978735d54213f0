//! External fixer adapters
//!
//! Implementations of the [`ExternalFixer`] port:
//! - `ClaudeCodeFixer`: shells out to the Claude Code CLI
//! - `AnthropicApiFixer`: calls the Anthropic Messages API
//! - `NullFixer`: no external fixer, quick fixes only

pub mod anthropic_api;
pub mod claude_code;
pub mod null;
pub mod prompt;

pub use anthropic_api::{AnthropicApiConfig, AnthropicApiFixer};
pub use claude_code::{ClaudeCodeConfig, ClaudeCodeFixer};
pub use null::NullFixer;
pub use prompt::build_fix_prompt;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::models::{FixerConfig, FixerKind};
use crate::domain::ports::ExternalFixer;

/// Create the fixer selected by `config.kind`.
pub fn build_fixer(config: &FixerConfig) -> Result<Arc<dyn ExternalFixer>> {
    let fixer: Arc<dyn ExternalFixer> = match config.kind {
        FixerKind::ClaudeCode => Arc::new(ClaudeCodeFixer::new(ClaudeCodeConfig::from(config))),
        FixerKind::AnthropicApi => {
            let api_config = AnthropicApiConfig::from_fixer_config(config)
                .context("Failed to configure Anthropic API fixer")?;
            Arc::new(AnthropicApiFixer::new(api_config).context("Failed to create Anthropic API fixer")?)
        }
        FixerKind::None => Arc::new(NullFixer::new()),
    };
    tracing::debug!(fixer = fixer.fixer_id(), "External fixer ready");
    Ok(fixer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_kind() {
        let claude = build_fixer(&FixerConfig::default()).unwrap();
        assert_eq!(claude.fixer_id(), "claude-code");

        let none = build_fixer(&FixerConfig {
            kind: FixerKind::None,
            ..FixerConfig::default()
        })
        .unwrap();
        assert_eq!(none.fixer_id(), "none");

        let api = build_fixer(&FixerConfig {
            kind: FixerKind::AnthropicApi,
            api_key: Some("sk-test".to_string()),
            ..FixerConfig::default()
        })
        .unwrap();
        assert_eq!(api.fixer_id(), "anthropic-api");
    }

    #[tokio::test]
    async fn null_fixer_is_not_configured() {
        let fixer = build_fixer(&FixerConfig {
            kind: FixerKind::None,
            ..FixerConfig::default()
        })
        .unwrap();
        let request = crate::domain::ports::FixRequest {
            source_code: String::new(),
            file_name: "a.ts".to_string(),
            current_test_code: String::new(),
            error_context: String::new(),
            attempt_number: 1,
            dependency_context: None,
        };
        assert!(matches!(
            fixer.propose_fix(&request).await,
            Err(crate::domain::ports::FixerError::NotConfigured(_))
        ));
    }
}
