//! pipe-model: el modelo binario como global con forma de árbol y las reglas
//! de invalidación que saben leer sus diffs.
pub mod address;
pub mod binary;
pub mod error;
pub mod kinds;

pub use address::{address_key, parse_address};
pub use binary::{Binary, Function, Segment};
pub use error::ModelError;
pub use kinds::{FunctionKind, SegmentKind};

/// Nombre con el que el modelo se registra en el `GlobalsStore`.
pub const MODEL_GLOBAL: &str = "model.json";

pub type ModelGlobal = pipe_core::TupleTreeGlobal<Binary>;
