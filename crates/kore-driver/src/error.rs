//! Driver binding errors.

use crate::ffi::CuResult;

/// Errors raised while loading the driver or interpreting its result codes.
///
/// Forwarding methods never produce these; they return the raw `CuResult`.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("CUDA driver library '{library}' could not be opened: {source}")]
    LibraryOpen {
        library: String,
        source: libloading::Error,
    },

    #[error("CUDA driver library '{library}' could not be closed: {source}")]
    LibraryClose {
        library: String,
        source: libloading::Error,
    },

    #[error("CUDA driver symbol '{symbol}' ({operation}) not found")]
    MissingSymbol {
        operation: &'static str,
        symbol: String,
    },

    #[error("{name} ({code}) in {context}: {message}")]
    Cuda {
        code: CuResult,
        name: String,
        message: String,
        context: String,
    },
}

impl DriverError {
    /// The driver result code, if this error came from a driver call.
    pub fn code(&self) -> Option<CuResult> {
        match self {
            DriverError::Cuda { code, .. } => Some(*code),
            _ => None,
        }
    }
}
