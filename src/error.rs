//! Error hierarchy for FitBridge
//!
//! Each stage has its own error type; [`FitBridgeError`] aggregates them for
//! callers that drive the whole pipeline.

use thiserror::Error;

use crate::export::ExportError;
use crate::import::ImportError;
use crate::zones::ZoneError;

/// Top-level error type for FitBridge operations
#[derive(Debug, Error)]
pub enum FitBridgeError {
    /// Zone reconciliation errors
    #[error("Zone error: {0}")]
    Zone(#[from] ZoneError),

    /// Takeout discovery and parsing errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// CSV/TCX writing errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for FitBridge operations
pub type Result<T> = std::result::Result<T, FitBridgeError>;

impl FitBridgeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FitBridgeError::Zone(ZoneError::BoundaryOutOfRange { .. }) => ErrorSeverity::Warning,
            FitBridgeError::Import(ImportError::Parse { .. }) => ErrorSeverity::Warning,
            FitBridgeError::Import(ImportError::DataRootNotFound { .. }) => ErrorSeverity::Critical,
            FitBridgeError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message suitable for the terminal
    pub fn user_message(&self) -> String {
        match self {
            FitBridgeError::Import(ImportError::DataRootNotFound { root, .. }) => format!(
                "No Fitbit data found under {}. \
                 Point the command at an extracted Google Takeout folder.",
                root.display()
            ),
            FitBridgeError::Zone(ZoneError::UnknownFormula(name)) => format!(
                "Unknown max heart rate formula '{}'. Use one of: tanaka, fox, gellish, nes.",
                name
            ),
            FitBridgeError::Zone(ZoneError::UnknownZoneSystem(name)) => format!(
                "Unknown zone system '{}'. Use five_zone or garmin_standard.",
                name
            ),
            FitBridgeError::Export(ExportError::UnsupportedFormat(format)) => format!(
                "Unsupported export format '{}'. Use csv, tcx or all.",
                format
            ),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The run cannot continue
    Critical,
    /// The current operation failed
    Error,
    /// One record or activity was affected; the run continues
    Warning,
}

impl ErrorSeverity {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
