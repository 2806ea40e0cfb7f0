use thiserror::Error;

/// Errores de validación del modelo binario.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("segment starting at {start:#x} already exists")]
    DuplicateSegment { start: u64 },
    #[error("segment at {start:#x} overlaps segment at {other:#x}")]
    OverlappingSegment { start: u64, other: u64 },
    #[error("invalid address {0}")]
    InvalidAddress(String),
    #[error("function {0} already exists")]
    DuplicateFunction(String),
    #[error("function {0} not found")]
    FunctionNotFound(String),
}
