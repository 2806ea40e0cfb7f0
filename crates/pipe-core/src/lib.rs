//! pipe-core: store versionado de globals, diffs type-erased y eventos de
//! invalidación.
//!
//! Flujo típico:
//! 1. Se toman dos snapshots de un `GlobalsStore` (antes/después de una
//!    edición; clonar el store es una copia profunda).
//! 2. `before.diff(&after)` devuelve un `DiffMap` nombre -> `AnyDiff`.
//! 3. `diff.invalidation_event().apply(&mut runner)` calcula los targets
//!    obsoletos en cada step/container y le pide al runner que los descarte.
pub mod config;
pub mod constants;
pub mod diff;
pub mod errors;
pub mod global;
pub mod invalidation;
pub mod runner;
pub mod store;
pub mod tag;
pub mod tree;

pub use config::StoreConfig;
pub use diff::{AnyDiff, DiffMap};
pub use errors::{CoreError, CoreResult};
pub use global::{Global, TupleTreeGlobal};
pub use invalidation::{apply_diff_map, InvalidationEvent, InvalidationEventBase, TupleTreeInvalidationEvent};
pub use runner::{Container, InMemoryContainer, InMemoryRunner, InMemoryStep, InvalidationMap, Kind, KindsRegistry, Runner, Step,
                 TargetSet, TreePathKind};
pub use store::GlobalsStore;
pub use tag::TypeTag;
pub use tree::{TreePath, TupleTreeCompatible, TupleTreeDiff};
