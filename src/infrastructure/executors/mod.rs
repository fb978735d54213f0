//! Test executor adapters

pub mod command;

pub use command::CommandTestExecutor;
