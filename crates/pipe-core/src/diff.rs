//! Diff type-erased entre dos versiones de un global.
//!
//! `AnyDiff` envuelve un `TupleTreeDiff<T>` concreto detrás de una interfaz
//! uniforme: puede serializarse, clonarse y convertirse en el
//! `InvalidationEvent` del mismo `T` sin que el caller conozca el tipo. El
//! contenido sigue siendo inspeccionable con `get_as::<T>()`.
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::Write;

use crate::errors::CoreResult;
use crate::invalidation::{InvalidationEvent, TupleTreeInvalidationEvent};
use crate::tag::TypeTag;
use crate::tree::{TupleTreeCompatible, TupleTreeDiff};

/// Mapa nombre de global -> diff, producido por `GlobalsStore::diff`.
pub type DiffMap = BTreeMap<String, AnyDiff>;

trait ErasedDiff: Debug + Send + Sync {
    fn tag(&self) -> TypeTag;
    fn serialize(&self, out: &mut dyn Write) -> CoreResult<()>;
    fn invalidation_event(&self) -> InvalidationEvent;
    fn clone_box(&self) -> Box<dyn ErasedDiff>;
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug)]
struct TypedDiff<T: TupleTreeCompatible> {
    diff: TupleTreeDiff<T>,
}

impl<T: TupleTreeCompatible> ErasedDiff for TypedDiff<T> {
    fn tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn serialize(&self, out: &mut dyn Write) -> CoreResult<()> {
        self.diff.write_to(out)
    }

    fn invalidation_event(&self) -> InvalidationEvent {
        InvalidationEvent::new(TupleTreeInvalidationEvent::new(self.diff.clone()))
    }

    fn clone_box(&self) -> Box<dyn ErasedDiff> {
        Box::new(TypedDiff { diff: self.diff.clone() })
    }

    fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    fn len(&self) -> usize {
        self.diff.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct AnyDiff {
    inner: Box<dyn ErasedDiff>,
}

impl AnyDiff {
    pub fn new<T: TupleTreeCompatible>(diff: TupleTreeDiff<T>) -> Self {
        Self { inner: Box::new(TypedDiff { diff }) }
    }

    /// Tag del payload al que pertenece el diff.
    pub fn tag(&self) -> TypeTag {
        self.inner.tag()
    }

    /// Escribe el diff en el formato textual del algoritmo de diff, sin framing
    /// adicional.
    pub fn serialize(&self, out: &mut dyn Write) -> CoreResult<()> {
        self.inner.serialize(out)
    }

    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.serialize(&mut buffer)?;
        Ok(buffer)
    }

    /// Construye el evento de invalidación del mismo tipo de payload.
    pub fn invalidation_event(&self) -> InvalidationEvent {
        self.inner.invalidation_event()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Acceso tipado; `None` si el diff pertenece a otro payload.
    pub fn get_as<T: TupleTreeCompatible>(&self) -> Option<&TupleTreeDiff<T>> {
        self.inner.as_any().downcast_ref::<TypedDiff<T>>().map(|typed| &typed.diff)
    }
}

impl Clone for AnyDiff {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone_box() }
    }
}

impl<T: TupleTreeCompatible> From<TupleTreeDiff<T>> for AnyDiff {
    fn from(diff: TupleTreeDiff<T>) -> Self {
        Self::new(diff)
    }
}
