//! Globals: estado con nombre, tipado y versionado del pipeline.
//!
//! `Global` es la interfaz uniforme (type-erased) que el store y el resto del
//! pipeline usan sin conocer el payload concreto. La única implementación
//! provista es `TupleTreeGlobal<T>`, que envuelve cualquier valor con forma
//! de árbol.
//!
//! Contrato de las operaciones:
//! - `deserialize` / `apply_diff` dejan el global intacto si fallan.
//! - `diff` exige que `other` tenga el mismo tipo concreto; lo contrario es un
//!   error de programación y aborta con `panic!`.
//! - `load_from_disk` sobre un path inexistente equivale a `clear()`.
mod tuple_tree;

use std::any::Any;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use log::{debug, info};

pub use tuple_tree::TupleTreeGlobal;

use crate::diff::AnyDiff;
use crate::errors::{CoreError, CoreResult};
use crate::tag::TypeTag;

pub trait Global: Debug + Send + Sync + 'static {
    /// Tag del tipo concreto de payload.
    fn tag(&self) -> TypeTag;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Diff estructural desde `self` hacia `other`.
    fn diff(&self, other: &dyn Global) -> AnyDiff;

    /// Deserializa un diff (no un payload) desde `diff` y lo aplica in place.
    fn apply_diff(&mut self, diff: &[u8]) -> CoreResult<()>;

    /// Codificación textual determinista del payload.
    fn serialize(&self, out: &mut dyn Write) -> CoreResult<()>;

    /// Reemplaza el payload completo.
    fn deserialize(&mut self, buffer: &[u8]) -> CoreResult<()>;

    /// Vuelve al valor por defecto del tipo.
    fn clear(&mut self);

    /// Copia profunda; el clon no comparte estado mutable con el original.
    fn clone_global(&self) -> Box<dyn Global>;

    /// Identidad de versión: blake3 (hex) de la serialización actual.
    fn fingerprint(&self) -> CoreResult<String> {
        let mut buffer = Vec::new();
        self.serialize(&mut buffer)?;
        Ok(blake3::hash(&buffer).to_hex().to_string())
    }

    fn store_to_disk(&self, path: &Path) -> CoreResult<()> {
        debug!("storing global {} to {}", self.tag(), path.display());
        let file = File::create(path).map_err(|e| CoreError::io(path, e))?;
        let mut out = BufWriter::new(file);
        self.serialize(&mut out)?;
        out.flush().map_err(|e| CoreError::io(path, e))
    }

    fn load_from_disk(&mut self, path: &Path) -> CoreResult<()> {
        let buffer = match std::fs::read(path) {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} does not exist, resetting global {}", path.display(), self.tag());
                self.clear();
                return Ok(());
            }
            Err(e) => return Err(CoreError::io(path, e)),
        };
        debug!("loading global {} from {}", self.tag(), path.display());
        self.deserialize(&buffer)
    }
}

impl Clone for Box<dyn Global> {
    fn clone(&self) -> Self {
        self.clone_global()
    }
}

impl dyn Global {
    pub fn is<G: Global>(&self) -> bool {
        self.as_any().is::<G>()
    }

    pub fn downcast_ref<G: Global>(&self) -> Option<&G> {
        self.as_any().downcast_ref::<G>()
    }

    pub fn downcast_mut<G: Global>(&mut self) -> Option<&mut G> {
        self.as_any_mut().downcast_mut::<G>()
    }

    /// Downcast que trata un tipo incorrecto como violación de contrato.
    pub fn cast<G: Global>(&self) -> &G {
        match self.downcast_ref::<G>() {
            Some(global) => global,
            None => panic!("contract violation: global of type {} cast to {}",
                           self.tag(),
                           std::any::type_name::<G>()),
        }
    }

    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.serialize(&mut buffer)?;
        Ok(buffer)
    }
}
