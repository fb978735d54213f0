//! Fixer used when no external fixer is configured.

use async_trait::async_trait;

use crate::domain::ports::{ExternalFixer, FixRequest, FixerError};

/// Always reports [`FixerError::NotConfigured`], so only quick fixes can
/// change a test file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFixer;

impl NullFixer {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExternalFixer for NullFixer {
    fn fixer_id(&self) -> &str {
        "none"
    }

    async fn propose_fix(&self, _request: &FixRequest) -> Result<String, FixerError> {
        Err(FixerError::NotConfigured(
            "no external fixer configured (fixer.kind = none)".to_string(),
        ))
    }
}
