use serde::{Deserialize, Serialize};

/// Main configuration structure for test-healer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Repair loop configuration
    #[serde(default)]
    pub repair: RepairConfig,

    /// Test executor configuration
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// External fixer configuration
    #[serde(default)]
    pub fixer: FixerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Repair loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RepairConfig {
    /// Iteration budget per test file (1-50)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Characters of raw runner output handed to the external fixer
    #[serde(default = "default_error_context_chars")]
    pub error_context_chars: usize,

    /// Characters of the error message that form a stagnation signature
    #[serde(default = "default_signature_prefix_chars")]
    pub signature_prefix_chars: usize,

    /// Test files repaired concurrently in batch mode
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,
}

const fn default_max_iterations() -> u32 {
    crate::domain::models::repair::DEFAULT_MAX_ITERATIONS
}

const fn default_error_context_chars() -> usize {
    3000
}

const fn default_signature_prefix_chars() -> usize {
    100
}

const fn default_max_concurrent_files() -> usize {
    4
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            error_context_chars: default_error_context_chars(),
            signature_prefix_chars: default_signature_prefix_chars(),
            max_concurrent_files: default_max_concurrent_files(),
        }
    }
}

/// Test executor configuration
///
/// The test file path is appended after `args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutorConfig {
    /// Program to execute (e.g. `npx`)
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the test file path
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Per-run timeout in seconds; a timeout is reported as a failed run
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "npx".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "jest".to_string(),
        "--colors=false".to_string(),
        "--runTestsByPath".to_string(),
    ]
}

const fn default_executor_timeout() -> u64 {
    120
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_secs: default_executor_timeout(),
        }
    }
}

/// Which external fixer backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixerKind {
    /// Shell out to the Claude Code CLI
    #[default]
    ClaudeCode,
    /// Call the Anthropic Messages API over HTTP
    AnthropicApi,
    /// No external fixer; only quick fixes are applied
    None,
}

impl std::str::FromStr for FixerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude-code" => Ok(Self::ClaudeCode),
            "anthropic-api" => Ok(Self::AnthropicApi),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown fixer kind '{other}' (expected claude-code, anthropic-api or none)"
            )),
        }
    }
}

/// External fixer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixerConfig {
    #[serde(default)]
    pub kind: FixerKind,

    /// Path to claude CLI executable
    #[serde(default = "default_claude_path")]
    pub claude_path: String,

    /// Model used by the Anthropic API fixer
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (can also be set via ANTHROPIC_API_KEY env var)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL for API (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens generated per proposal
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for a single proposal in seconds
    #[serde(default = "default_fixer_timeout")]
    pub timeout_secs: u64,
}

fn default_claude_path() -> String {
    "claude".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

const fn default_max_tokens() -> u32 {
    8192
}

const fn default_fixer_timeout() -> u64 {
    300
}

impl FixerConfig {
    /// API key from config, falling back to `ANTHROPIC_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            kind: FixerKind::default(),
            claude_path: default_claude_path(),
            model: default_model(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_fixer_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
