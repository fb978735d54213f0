//! Repair loop services.

pub mod batch_repair;
pub mod error_classifier;
pub mod external_fixer_client;
pub mod fix_strategy;
pub mod quick_fix;
pub mod repair_orchestrator;

pub use batch_repair::{BatchRepairService, BatchSummary};
pub use error_classifier::ErrorClassifier;
pub use external_fixer_client::{extract_code, ExternalFixerClient};
pub use fix_strategy::FixStrategySelector;
pub use quick_fix::QuickFixEngine;
pub use repair_orchestrator::RepairOrchestrator;
