//! Eventos de invalidación.
//!
//! Un `InvalidationEvent` es un comando de un solo uso: convierte el diff que
//! transporta en el conjunto exacto de targets cacheados que quedaron
//! obsoletos, recorriendo el producto step × container × regla del `Runner`,
//! y luego le pide al runner que los expanda y los descarte. `apply` consume
//! el evento, así que no puede aplicarse dos veces.
//!
//! El conjunto de eventos es abierto: cualquier tipo que implemente
//! `InvalidationEventBase` puede viajar en un `InvalidationEvent`, y las
//! reglas recuperan el tipo concreto con `downcast_ref` (que compara tags
//! antes de castear).
mod tuple_tree;

use std::any::Any;
use std::fmt::Debug;

use log::{debug, trace, warn};

pub use tuple_tree::TupleTreeInvalidationEvent;

use crate::diff::DiffMap;
use crate::errors::CoreResult;
use crate::runner::{InvalidationMap, Runner, TargetSet};
use crate::tag::TypeTag;

pub trait InvalidationEventBase: Any + Debug + Send + Sync {
    /// Tag estable del tipo concreto; `tag()` debe devolver el mismo valor.
    fn static_tag() -> TypeTag
        where Self: Sized;

    fn tag(&self) -> TypeTag;

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug)]
pub struct InvalidationEvent {
    inner: Box<dyn InvalidationEventBase>,
}

impl InvalidationEvent {
    pub fn new<E: InvalidationEventBase>(event: E) -> Self {
        Self { inner: Box::new(event) }
    }

    pub fn tag(&self) -> TypeTag {
        self.inner.tag()
    }

    pub fn is<E: InvalidationEventBase>(&self) -> bool {
        self.tag() == E::static_tag() && self.inner.as_any().is::<E>()
    }

    pub fn downcast_ref<E: InvalidationEventBase>(&self) -> Option<&E> {
        if self.tag() != E::static_tag() {
            return None;
        }
        self.inner.as_any().downcast_ref::<E>()
    }

    /// Downcast que trata un tag incorrecto como violación de contrato.
    pub fn cast<E: InvalidationEventBase>(&self) -> &E {
        match self.downcast_ref::<E>() {
            Some(event) => event,
            None => panic!("contract violation: invalidation event {} cast to {}",
                           self.tag(),
                           std::any::type_name::<E>()),
        }
    }

    /// Acumula en `out[step][container]` los targets que cada regla del
    /// runner declara obsoletos para este evento. Los containers nunca
    /// poblados se saltan, y sólo se crean entradas con al menos un target.
    pub fn get_invalidations(&self, runner: &dyn Runner, out: &mut InvalidationMap) {
        for step in runner.steps() {
            for (container_name, container) in step.containers() {
                let Some(container) = container else {
                    continue;
                };

                let mut targets = TargetSet::new();
                for rule in runner.kinds() {
                    rule.get_invalidations(self, step.name(), container, &mut targets);
                }
                trace!("{}/{}: {} targets invalidated by {}",
                       step.name(),
                       container_name,
                       targets.len(),
                       self.tag());

                if !targets.is_empty() {
                    out.entry(step.name().to_string())
                       .or_default()
                       .entry(container_name.to_string())
                       .or_default()
                       .extend(targets);
                }
            }
        }
    }

    /// Calcula las invalidaciones, deja que el runner las expanda y las
    /// ejecuta. Cualquier error del runner se propaga sin cambios. Devuelve el
    /// mapa efectivamente aplicado.
    pub fn apply(self, runner: &mut dyn Runner) -> CoreResult<InvalidationMap> {
        let mut map = InvalidationMap::new();
        self.get_invalidations(&*runner, &mut map);
        if let Err(e) = runner.expand_invalidations(&mut map) {
            warn!("runner rejected invalidation expansion: {e}");
            return Err(e);
        }
        if let Err(e) = runner.invalidate(&map) {
            warn!("runner failed to invalidate: {e}");
            return Err(e);
        }
        debug!("applied invalidation event {} over {} steps", self.tag(), map.len());
        Ok(map)
    }
}

/// Aplica, en orden de nombre, el evento de cada diff no vacío de `diffs`.
/// Se detiene en el primer error; lo ya invalidado no se revierte.
pub fn apply_diff_map(runner: &mut dyn Runner, diffs: &DiffMap) -> CoreResult<InvalidationMap> {
    let mut applied = InvalidationMap::new();
    for (name, diff) in diffs {
        if diff.is_empty() {
            continue;
        }
        debug!("propagating {} changes of global {name}", diff.len());
        let map = diff.invalidation_event().apply(runner)?;
        for (step, containers) in map {
            let entry = applied.entry(step).or_default();
            for (container, targets) in containers {
                entry.entry(container).or_default().extend(targets);
            }
        }
    }
    Ok(applied)
}

/// Cantidad total de targets en un mapa de invalidaciones.
pub fn count_targets(map: &InvalidationMap) -> usize {
    map.values().flat_map(|containers| containers.values()).map(TargetSet::len).sum()
}
