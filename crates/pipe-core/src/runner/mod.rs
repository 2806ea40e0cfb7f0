//! Frontera con el ejecutor del pipeline (steps, containers y reglas).
//!
//! El core no es dueño del grafo de steps: sólo lo consume a través de estos
//! traits. `memory` provee una implementación en memoria, útil para tests y
//! como referencia del contrato.
mod kinds;
mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

pub use kinds::{KindsRegistry, TreePathKind};
pub use memory::{InMemoryContainer, InMemoryRunner, InMemoryStep};

use crate::errors::CoreResult;
use crate::invalidation::InvalidationEvent;

/// Claves de target cacheadas en un container.
pub type TargetSet = BTreeSet<String>;
/// container -> targets invalidados.
pub type ContainerInvalidations = BTreeMap<String, TargetSet>;
/// step -> container -> targets invalidados.
pub type InvalidationMap = BTreeMap<String, ContainerInvalidations>;

/// Container con nombre que guarda artefactos cacheados indexados por target.
pub trait Container {
    fn name(&self) -> &str;

    /// Targets actualmente presentes.
    fn targets(&self) -> &TargetSet;
}

pub trait Step {
    fn name(&self) -> &str;

    /// Containers declarados por el step, en orden estable. `None` indica un
    /// container que nunca fue poblado.
    fn containers(&self) -> Box<dyn Iterator<Item = (&str, Option<&dyn Container>)> + '_>;
}

/// Regla que sabe traducir un evento en targets concretos de un container.
pub trait Kind: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Agrega a `out` los targets de `container` (dentro de `step`) que
    /// `event` vuelve obsoletos. Eventos que la regla no entiende se ignoran.
    fn get_invalidations(&self, event: &InvalidationEvent, step: &str, container: &dyn Container, out: &mut TargetSet);
}

pub trait Runner {
    /// Steps en el orden propio del runner (determinista).
    fn steps(&self) -> Box<dyn Iterator<Item = &dyn Step> + '_>;

    /// Registro de reglas de invalidación.
    fn kinds(&self) -> Box<dyn Iterator<Item = &dyn Kind> + '_>;

    /// Completa `map` con los targets derivados (p.ej. los producidos por
    /// steps sucesores a partir de targets ya invalidados).
    fn expand_invalidations(&self, map: &mut InvalidationMap) -> CoreResult<()>;

    /// Descarta de cada container los targets de `map`.
    fn invalidate(&mut self, map: &InvalidationMap) -> CoreResult<()>;
}
