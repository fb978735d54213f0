//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - Test executor running the project's test runner
//! - External fixers (Claude Code CLI, Anthropic API)
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod executors;
pub mod fixers;
pub mod logging;
