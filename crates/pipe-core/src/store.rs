//! `GlobalsStore`: colección, ordenada por nombre, de todos los globals de una
//! sesión del pipeline.
//!
//! El store es dueño exclusivo de cada global. Clonarlo clona en profundidad
//! cada uno (dos copias nunca observan las mutaciones de la otra), lo que
//! permite tomar snapshots antes/después de una edición y diffearlos.
//!
//! Layout en disco: `<root>/<context_dir>/<nombre>`, un archivo por global.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::StoreConfig;
use crate::diff::DiffMap;
use crate::errors::{CoreError, CoreResult};
use crate::global::Global;
use crate::tag::TypeTag;

#[derive(Debug, Clone, Default)]
pub struct GlobalsStore {
    globals: BTreeMap<String, Box<dyn Global>>,
    config: StoreConfig,
}

impl GlobalsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self { globals: BTreeMap::new(),
               config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Registra `global` bajo `name`. Registrar dos veces el mismo nombre, o
    /// un nombre que no sea un único componente de path, es una violación de
    /// contrato.
    pub fn emplace<G: Global>(&mut self, name: impl Into<String>, global: G) -> &mut G {
        let name = name.into();
        if !is_file_name(&name) {
            panic!("contract violation: global name {name:?} is not a plain file name");
        }
        if self.globals.contains_key(&name) {
            panic!("contract violation: global {name} registered twice");
        }
        let boxed: Box<dyn Global> = Box::new(global);
        self.globals
            .entry(name)
            .or_insert(boxed)
            .downcast_mut::<G>()
            .expect("freshly inserted global has the requested type")
    }

    /// Igual que `emplace` usando el valor por defecto del global.
    pub fn emplace_default<G: Global + Default>(&mut self, name: impl Into<String>) -> &mut G {
        self.emplace(name, G::default())
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Global>> {
        self.globals.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// Handle sin tipo al global `name`.
    pub fn global(&self, name: &str) -> CoreResult<&dyn Global> {
        self.globals
            .get(name)
            .map(|g| g.as_ref())
            .ok_or_else(|| not_found(name))
    }

    fn global_mut(&mut self, name: &str) -> CoreResult<&mut Box<dyn Global>> {
        self.globals.get_mut(name).ok_or_else(|| not_found(name))
    }

    /// Acceso tipado. Distingue nombre ausente (`NotFound`) de tipo incorrecto
    /// (`WrongType`).
    pub fn get<G: Global>(&self, name: &str) -> CoreResult<&G> {
        let global = self.global(name)?;
        global.downcast_ref::<G>().ok_or_else(|| wrong_type::<G>(name, global.tag()))
    }

    pub fn get_mut<G: Global>(&mut self, name: &str) -> CoreResult<&mut G> {
        let global = self.global_mut(name)?;
        let found = global.tag();
        global.downcast_mut::<G>().ok_or_else(|| wrong_type::<G>(name, found))
    }

    /// Diff de cada global de `self` contra el homónimo de `other`. Ambos
    /// stores deben tener los mismos nombres con los mismos tipos; lo
    /// contrario es una violación de contrato.
    pub fn diff(&self, other: &GlobalsStore) -> DiffMap {
        if self.globals.len() != other.globals.len() {
            panic!("contract violation: diffing stores with {} and {} globals",
                   self.globals.len(),
                   other.globals.len());
        }
        let mut diffs = DiffMap::new();
        for (name, global) in &self.globals {
            let Some(theirs) = other.globals.get(name) else {
                panic!("contract violation: global {name} missing from the other store");
            };
            let diff = global.diff(theirs.as_ref());
            debug!("global {name}: {} changes", diff.len());
            diffs.insert(name.clone(), diff);
        }
        diffs
    }

    pub fn serialize(&self, name: &str, out: &mut dyn Write) -> CoreResult<()> {
        self.global(name)?.serialize(out)
    }

    pub fn deserialize(&mut self, name: &str, buffer: &[u8]) -> CoreResult<()> {
        self.global_mut(name)?.deserialize(buffer)
    }

    pub fn apply_diff(&mut self, name: &str, diff: &[u8]) -> CoreResult<()> {
        self.global_mut(name)?.apply_diff(diff)
    }

    /// Identidad de versión de cada global.
    pub fn fingerprints(&self) -> CoreResult<BTreeMap<String, String>> {
        self.globals
            .iter()
            .map(|(name, global)| Ok((name.clone(), global.fingerprint()?)))
            .collect()
    }

    pub fn context_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.config.context_dir)
    }

    /// Persiste cada global en `<root>/<context_dir>/<nombre>`, creando los
    /// directorios que falten. Se detiene en el primer error.
    pub fn store_to_disk(&self, root: &Path) -> CoreResult<()> {
        let dir = self.context_dir(root);
        std::fs::create_dir_all(&dir).map_err(|e| CoreError::io(&dir, e))?;
        for (name, global) in &self.globals {
            global.store_to_disk(&dir.join(name))?;
        }
        debug!("stored {} globals under {}", self.globals.len(), dir.display());
        Ok(())
    }

    /// Restaura cada global desde `<root>/<context_dir>/<nombre>`. Archivos
    /// ausentes dejan el global en su valor por defecto. Se detiene en el
    /// primer error; los globals ya cargados no se revierten.
    pub fn load_from_disk(&mut self, root: &Path) -> CoreResult<()> {
        let dir = self.context_dir(root);
        for (name, global) in self.globals.iter_mut() {
            global.load_from_disk(&dir.join(name))?;
        }
        debug!("loaded {} globals from {}", self.globals.len(), dir.display());
        Ok(())
    }
}

// El nombre se usa tal cual como archivo dentro de `<root>/<context_dir>`.
fn is_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn not_found(name: &str) -> CoreError {
    CoreError::NotFound { name: name.to_string() }
}

fn wrong_type<G: Global>(name: &str, found: TypeTag) -> CoreError {
    CoreError::WrongType { name: name.to_string(),
                           expected: std::any::type_name::<G>(),
                           found: found.name() }
}
