// Library interface for FitBridge
// The binary and the integration tests both drive the pipeline through here

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use error::{FitBridgeError, Result};
pub use export::{ExportFormat, ExportManager, ExportSummary};
pub use import::{ImportManager, ImportReport, ParallelConfig, TakeoutLayout};
pub use logging::{DiagnosticReport, LogConfig, LogFormat, LogLevel};
pub use zones::{
    MaxHrFormula, ProfileEstimator, ReconciliationReport, ZoneCalculator, ZoneError,
    ZoneReconciler, ZoneSystem,
};
