//! Domain layer for the test repair loop
//!
//! This module contains the repair data model, configuration model, domain
//! errors and the port traits that infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
