//! Tags de tipo para identificación en runtime.
//!
//! Un `TypeTag` identifica de forma única y estable (durante la vida del
//! proceso) al tipo concreto de payload de un global. El mismo tag identifica
//! al evento de invalidación construido a partir del diff de ese payload, así
//! que las reglas pueden comprobar el tag antes de hacer downcast.
use std::any::TypeId;
use std::fmt;

#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(),
               name: std::any::type_name::<T>() }
    }

    /// Nombre legible del tipo (sólo para diagnósticos, no es identidad).
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl std::hash::Hash for TypeTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
