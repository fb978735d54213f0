//! Prompt shared by the LLM-backed fixers.

use std::fmt::Write as _;

use crate::domain::ports::FixRequest;

/// Instruction preceding every fix request.
const INSTRUCTIONS: &str = "You are repairing a failing unit test. \
Change only the test file; the source under test is correct and must not be modified. \
Reply with the complete corrected test file in a single fenced code block and nothing else.";

/// Render `request` as a single prompt.
pub fn build_fix_prompt(request: &FixRequest) -> String {
    let mut prompt = String::with_capacity(
        request.source_code.len() + request.current_test_code.len() + request.error_context.len() + 512,
    );

    prompt.push_str(INSTRUCTIONS);
    let _ = write!(
        prompt,
        "\n\n[Attempt {}]\n\n## Source under test: {}\n```\n{}\n```\n",
        request.attempt_number, request.file_name, request.source_code
    );
    let _ = write!(
        prompt,
        "\n## Current test file\n```\n{}\n```\n",
        request.current_test_code
    );
    let _ = write!(
        prompt,
        "\n## Test runner output\n```\n{}\n```\n",
        request.error_context
    );

    if let Some(ref dependencies) = request.dependency_context {
        let _ = write!(prompt, "\n## Related files\n{dependencies}\n");
    }

    prompt
}
