use std::any::Any;

use super::InvalidationEventBase;
use crate::tag::TypeTag;
use crate::tree::{TupleTreeCompatible, TupleTreeDiff};

/// Evento producido por el diff de un `TupleTreeGlobal<T>`. Su tag es el del
/// payload `T`, el mismo que usa el global.
#[derive(Debug, Clone)]
pub struct TupleTreeInvalidationEvent<T: TupleTreeCompatible> {
    diff: TupleTreeDiff<T>,
}

impl<T: TupleTreeCompatible> TupleTreeInvalidationEvent<T> {
    pub fn new(diff: TupleTreeDiff<T>) -> Self {
        Self { diff }
    }

    pub fn diff(&self) -> &TupleTreeDiff<T> {
        &self.diff
    }
}

impl<T: TupleTreeCompatible> InvalidationEventBase for TupleTreeInvalidationEvent<T> {
    fn static_tag() -> TypeTag {
        TypeTag::of::<T>()
    }

    fn tag(&self) -> TypeTag {
        Self::static_tag()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
