use std::any::Any;
use std::io::Write;

use super::Global;
use crate::diff::AnyDiff;
use crate::errors::CoreResult;
use crate::tag::TypeTag;
use crate::tree::{self, TupleTreeCompatible, TupleTreeDiff};

/// Global cuyo payload es un valor con forma de árbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TupleTreeGlobal<T: TupleTreeCompatible> {
    value: T,
}

impl<T: TupleTreeCompatible> TupleTreeGlobal<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Tag compartido por todos los `TupleTreeGlobal<T>` con el mismo `T`.
    pub fn static_tag() -> TypeTag {
        TypeTag::of::<T>()
    }

    /// Diff tipado sin pasar por la interfaz erasada.
    pub fn diff_typed(&self, other: &Self) -> TupleTreeDiff<T> {
        tree::diff(&self.value, &other.value)
    }
}

impl<T: TupleTreeCompatible> Global for TupleTreeGlobal<T> {
    fn tag(&self) -> TypeTag {
        Self::static_tag()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn diff(&self, other: &dyn Global) -> AnyDiff {
        if other.tag() != self.tag() {
            panic!("contract violation: cannot diff global {} against {}", self.tag(), other.tag());
        }
        AnyDiff::new(self.diff_typed(other.cast::<Self>()))
    }

    fn apply_diff(&mut self, diff: &[u8]) -> CoreResult<()> {
        let diff = TupleTreeDiff::<T>::read_from(diff)?;
        diff.apply(&mut self.value)
    }

    fn serialize(&self, out: &mut dyn Write) -> CoreResult<()> {
        tree::write_tree(&self.value, out)
    }

    fn deserialize(&mut self, buffer: &[u8]) -> CoreResult<()> {
        self.value = tree::read_tree(buffer)?;
        Ok(())
    }

    fn clear(&mut self) {
        self.value = T::default();
    }

    fn clone_global(&self) -> Box<dyn Global> {
        Box::new(self.clone())
    }
}
