//! Call boundary for the external fixer.
//!
//! Bounds the error context handed to the fixer, extracts code from its
//! response, and turns every failure into "no fix produced". Nothing is
//! retried here.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::models::{char_prefix, RepairContext};
use crate::domain::ports::{ExternalFixer, FixRequest, FixerError};

const FENCE: &str = "```";

/// Extract code from a fixer response.
///
/// When the response contains a fenced block, the interior of the first one
/// (minus its info string line) is returned, trimmed. Otherwise the whole
/// response is returned, trimmed. An opening fence with no closing fence
/// counts as no fence.
pub fn extract_code(response: &str) -> String {
    if let Some(open) = response.find(FENCE) {
        let after_open = &response[open + FENCE.len()..];
        // Skip the info string (`ts`, `javascript`, ...) on the fence line.
        let body_start = after_open.find('\n').map_or(after_open.len(), |i| i + 1);
        let body = &after_open[body_start..];
        if let Some(close) = body.find(FENCE) {
            return body[..close].trim().to_string();
        }
    }
    response.trim().to_string()
}

/// Wraps an [`ExternalFixer`] with the loop's calling contract.
#[derive(Clone)]
pub struct ExternalFixerClient {
    fixer: Arc<dyn ExternalFixer>,
    error_context_chars: usize,
}

impl ExternalFixerClient {
    pub fn new(fixer: Arc<dyn ExternalFixer>, error_context_chars: usize) -> Self {
        Self {
            fixer,
            error_context_chars,
        }
    }

    pub fn fixer_id(&self) -> &str {
        self.fixer.fixer_id()
    }

    /// Build the request sent to the fixer; `raw_output` is cut to the
    /// configured number of characters.
    pub fn build_request(
        &self,
        context: &RepairContext,
        current_test_code: &str,
        raw_output: &str,
        attempt_number: u32,
    ) -> FixRequest {
        FixRequest {
            source_code: context.source_code.clone(),
            file_name: context.source_name.clone(),
            current_test_code: current_test_code.to_string(),
            error_context: char_prefix(raw_output, self.error_context_chars).to_string(),
            attempt_number,
            dependency_context: context.dependency_context.clone(),
        }
    }

    /// Ask the fixer for a replacement test file.
    ///
    /// Returns `None` when the fixer fails or proposes nothing.
    pub async fn fix(
        &self,
        context: &RepairContext,
        current_test_code: &str,
        raw_output: &str,
        attempt_number: u32,
    ) -> Option<String> {
        let request = self.build_request(context, current_test_code, raw_output, attempt_number);

        let result = self
            .fixer
            .propose_fix(&request)
            .await
            .map(|response| extract_code(&response))
            .and_then(|code| {
                if code.is_empty() {
                    Err(FixerError::EmptyProposal)
                } else {
                    Ok(code)
                }
            });

        match result {
            Ok(code) => {
                debug!(
                    fixer = self.fixer_id(),
                    attempt = attempt_number,
                    proposal_chars = code.len(),
                    "External fixer proposed a replacement"
                );
                Some(code)
            }
            Err(err) => {
                warn!(
                    fixer = self.fixer_id(),
                    attempt = attempt_number,
                    error = %err,
                    "External fixer produced no fix"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingFixer {
        response: Result<String, String>,
        requests: Mutex<Vec<FixRequest>>,
    }

    impl RecordingFixer {
        fn new(response: Result<&str, &str>) -> Self {
            Self {
                response: response.map(str::to_string).map_err(str::to_string),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExternalFixer for RecordingFixer {
        fn fixer_id(&self) -> &str {
            "recording"
        }

        async fn propose_fix(&self, request: &FixRequest) -> Result<String, FixerError> {
            self.requests.lock().unwrap().push(request.clone());
            self.response
                .clone()
                .map_err(FixerError::ExecutionFailed)
        }
    }

    fn context() -> RepairContext {
        RepairContext::new("export const a = 1;", "a.ts", "a.test.ts", ".")
            .with_dependency_context("b.ts exports b")
    }

    #[test]
    fn extract_prefers_fenced_block() {
        let response = "Here is the fix:\n```typescript\nconst x = 1;\n```\nDone.";
        assert_eq!(extract_code(response), "const x = 1;");
    }

    #[test]
    fn extract_fence_without_language() {
        assert_eq!(extract_code("```\n  a();\n```"), "a();");
    }

    #[test]
    fn extract_without_fence_trims() {
        assert_eq!(extract_code("\n  test('x', () => {});\n\n"), "test('x', () => {});");
    }

    #[test]
    fn extract_unclosed_fence_uses_whole_response() {
        assert_eq!(extract_code("```ts\nconst a = 1;"), "```ts\nconst a = 1;");
    }

    #[test]
    fn extract_takes_first_block() {
        let response = "```js\nfirst();\n```\n```js\nsecond();\n```";
        assert_eq!(extract_code(response), "first();");
    }

    #[tokio::test]
    async fn error_context_is_bounded() {
        let fixer = Arc::new(RecordingFixer::new(Ok("```ts\nfixed();\n```")));
        let client = ExternalFixerClient::new(fixer.clone(), 3000);
        let raw = "e".repeat(10_000);

        let code = client.fix(&context(), "broken();", &raw, 2).await;
        assert_eq!(code.as_deref(), Some("fixed();"));

        let requests = fixer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].error_context.len(), 3000);
        assert_eq!(requests[0].attempt_number, 2);
        assert_eq!(requests[0].file_name, "a.ts");
        assert_eq!(requests[0].current_test_code, "broken();");
        assert_eq!(
            requests[0].dependency_context.as_deref(),
            Some("b.ts exports b")
        );
    }

    #[tokio::test]
    async fn fixer_failure_is_swallowed() {
        let fixer = Arc::new(RecordingFixer::new(Err("boom")));
        let client = ExternalFixerClient::new(fixer.clone(), 3000);
        assert_eq!(client.fix(&context(), "t", "out", 1).await, None);
        assert_eq!(fixer.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_proposal_is_no_fix() {
        let fixer = Arc::new(RecordingFixer::new(Ok("```ts\n\n```")));
        let client = ExternalFixerClient::new(fixer, 3000);
        assert_eq!(client.fix(&context(), "t", "out", 1).await, None);
    }
}
