//! Errores recuperables del core.
//!
//! Las violaciones de contrato (diff entre tipos distintos, `emplace`
//! duplicado, downcast con tag incorrecto) no aparecen aquí: son errores de
//! programación y terminan en `panic!` con un mensaje de diagnóstico.

use std::path::PathBuf;

use thiserror::Error;

const STREAM_PATH: &str = "<stream>";

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("global not found: {name}")]
    NotFound { name: String },
    #[error("global {name} requested as {expected} but holds {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("io failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {what}: {message}")]
    Parse { what: &'static str, message: String },
    #[error("diff conflict at {path}: recorded old value does not match")]
    DiffConflict { path: String },
    #[error("no known step {step}")]
    UnknownStep { step: String },
    #[error("no known container {container} in step {step}")]
    UnknownContainer { step: String, container: String },
    #[error("runner: {0}")]
    Runner(String),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(),
                   source }
    }

    /// Falla de escritura sobre un sink sin path asociado.
    pub(crate) fn stream(source: impl Into<std::io::Error>) -> Self {
        Self::io(STREAM_PATH, source.into())
    }

    pub(crate) fn parse(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Parse { what,
                      message: err.to_string() }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
