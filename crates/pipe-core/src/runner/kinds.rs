use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use super::{Container, Kind, TargetSet};
use crate::invalidation::{InvalidationEvent, TupleTreeInvalidationEvent};
use crate::tree::{TreePath, TupleTreeCompatible};

/// Registro ordenado de reglas de invalidación.
#[derive(Debug, Default)]
pub struct KindsRegistry {
    kinds: Vec<Box<dyn Kind>>,
}

impl KindsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Kind + 'static) {
        self.kinds.push(Box::new(kind));
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Kind> {
        self.kinds.iter().map(|k| k.as_ref())
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Regla genérica: si el diff de un `T` toca `pattern`, todos los targets de
/// los containers indicados quedan invalidados.
pub struct TreePathKind<T> {
    name: String,
    pattern: TreePath,
    containers: Option<BTreeSet<String>>,
    marker: PhantomData<fn() -> T>,
}

impl<T: TupleTreeCompatible> TreePathKind<T> {
    /// Regla aplicable a cualquier container.
    pub fn new(name: impl Into<String>, pattern: impl Into<TreePath>) -> Self {
        Self { name: name.into(),
               pattern: pattern.into(),
               containers: None,
               marker: PhantomData }
    }

    /// Restringe la regla a `container` (acumulativo).
    pub fn for_container(mut self, container: impl Into<String>) -> Self {
        self.containers.get_or_insert_with(BTreeSet::new).insert(container.into());
        self
    }

    pub fn pattern(&self) -> &TreePath {
        &self.pattern
    }

    fn applies_to(&self, container: &str) -> bool {
        self.containers.as_ref().map_or(true, |names| names.contains(container))
    }
}

impl<T> fmt::Debug for TreePathKind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreePathKind")
         .field("name", &self.name)
         .field("pattern", &self.pattern.to_string())
         .field("containers", &self.containers)
         .finish()
    }
}

impl<T: TupleTreeCompatible> Kind for TreePathKind<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_invalidations(&self, event: &InvalidationEvent, _step: &str, container: &dyn Container, out: &mut TargetSet) {
        if !self.applies_to(container.name()) {
            return;
        }
        let Some(event) = event.downcast_ref::<TupleTreeInvalidationEvent<T>>() else {
            return;
        };
        if event.diff().touches(&self.pattern) {
            out.extend(container.targets().iter().cloned());
        }
    }
}
