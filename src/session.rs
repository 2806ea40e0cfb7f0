//! Sesión de análisis: el store de globals, su raíz en disco y el runner que
//! guarda los artefactos cacheados.
//!
//! `edit_model` implementa el ciclo completo: snapshot, edición, diff e
//! invalidación. La edición se hace sobre una copia; si falla (o deja el
//! modelo inválido) el store no cambia.
use std::path::{Path, PathBuf};

use log::info;
use pipe_core::invalidation::count_targets;
use pipe_core::{apply_diff_map, DiffMap, GlobalsStore, InMemoryRunner, InvalidationMap};
use pipe_model::{Binary, FunctionKind, ModelError, ModelGlobal, SegmentKind, MODEL_GLOBAL};

use crate::config::AppConfig;
use crate::errors::AppResult;

/// Container de artefactos por función (`<addr>:<artefacto>`).
pub const FUNCTIONS_CONTAINER: &str = "functions";
/// Container de artefactos que dependen del layout de segmentos.
pub const LAYOUT_CONTAINER: &str = "layout";

#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    store: GlobalsStore,
    runner: InMemoryRunner,
}

impl Session {
    /// Sesión vacía: modelo por defecto y runner sin steps, con las reglas
    /// del modelo registradas.
    pub fn new(config: &AppConfig) -> Self {
        let mut store = GlobalsStore::with_config(config.store.clone());
        store.emplace_default::<ModelGlobal>(MODEL_GLOBAL);

        let mut runner = InMemoryRunner::new();
        runner.register_kind(FunctionKind::new().for_container(FUNCTIONS_CONTAINER));
        runner.register_kind(SegmentKind::new().for_container(LAYOUT_CONTAINER));

        Self { root: config.state_dir.clone(),
               store,
               runner }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &GlobalsStore {
        &self.store
    }

    pub fn runner(&self) -> &InMemoryRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut InMemoryRunner {
        &mut self.runner
    }

    pub fn model(&self) -> AppResult<&Binary> {
        Ok(self.store.get::<ModelGlobal>(MODEL_GLOBAL)?.get())
    }

    /// Restaura los globals desde disco; los archivos ausentes dejan el valor
    /// por defecto.
    pub fn load(&mut self) -> AppResult<()> {
        self.store.load_from_disk(&self.root)?;
        Ok(())
    }

    pub fn save(&self) -> AppResult<()> {
        self.store.store_to_disk(&self.root)?;
        Ok(())
    }

    /// Aplica `edit` al modelo, invalida en el runner lo que el cambio vuelve
    /// obsoleto y devuelve el mapa de invalidaciones aplicado.
    pub fn edit_model<F>(&mut self, edit: F) -> AppResult<InvalidationMap>
        where F: FnOnce(&mut Binary) -> Result<(), ModelError>
    {
        let mut after = self.store.clone();
        let model = after.get_mut::<ModelGlobal>(MODEL_GLOBAL)?.get_mut();
        edit(model)?;
        model.validate()?;

        let diffs = self.store.diff(&after);
        let applied = self.propagate(&diffs)?;
        self.store = after;
        Ok(applied)
    }

    /// Propaga `diffs` ya calculados (p.ej. recibidos de otra sesión) al runner.
    pub fn propagate(&mut self, diffs: &DiffMap) -> AppResult<InvalidationMap> {
        let applied = apply_diff_map(&mut self.runner, diffs)?;
        info!("invalidated {} targets in {} steps", count_targets(&applied), applied.len());
        Ok(applied)
    }
}
