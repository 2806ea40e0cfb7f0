//! Runner en memoria.
//!
//! Los steps se recorren en orden de inserción (que se asume topológico) y
//! cada uno puede tener un predecesor. La expansión propaga un target
//! invalidado en un container del predecesor al container homónimo del
//! sucesor que también lo tenga cacheado.
use std::collections::BTreeMap;

use log::debug;

use super::{Container, InvalidationMap, Kind, KindsRegistry, Runner, Step, TargetSet};
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryContainer {
    name: String,
    targets: TargetSet,
}

impl InMemoryContainer {
    pub fn new<I, S>(name: impl Into<String>, targets: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { name: name.into(),
               targets: targets.into_iter().map(Into::into).collect() }
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    pub fn insert(&mut self, target: impl Into<String>) {
        self.targets.insert(target.into());
    }

    fn remove_all(&mut self, targets: &TargetSet) {
        self.targets.retain(|t| !targets.contains(t));
    }
}

impl Container for InMemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn targets(&self) -> &TargetSet {
        &self.targets
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStep {
    name: String,
    predecessor: Option<String>,
    containers: BTreeMap<String, Option<InMemoryContainer>>,
}

impl InMemoryStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               ..Self::default() }
    }

    pub fn with_predecessor(mut self, predecessor: impl Into<String>) -> Self {
        self.predecessor = Some(predecessor.into());
        self
    }

    /// Declara un container que todavía no fue poblado.
    pub fn with_container(mut self, name: impl Into<String>) -> Self {
        self.containers.entry(name.into()).or_insert(None);
        self
    }

    /// Declara (o reemplaza) un container poblado con `targets`.
    pub fn with_targets<I, S>(mut self, name: impl Into<String>, targets: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let name = name.into();
        let container = InMemoryContainer::new(name.clone(), targets);
        self.containers.insert(name, Some(container));
        self
    }

    pub fn predecessor(&self) -> Option<&str> {
        self.predecessor.as_deref()
    }

    pub fn container(&self, name: &str) -> Option<&InMemoryContainer> {
        self.containers.get(name).and_then(Option::as_ref)
    }

    /// Container poblado `name`, creándolo vacío si sólo estaba declarado.
    pub fn container_mut(&mut self, name: &str) -> &mut InMemoryContainer {
        self.containers
            .entry(name.to_string())
            .or_insert(None)
            .get_or_insert_with(|| InMemoryContainer::new(name, Vec::<String>::new()))
    }

    pub fn declares(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }
}

impl Step for InMemoryStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn containers(&self) -> Box<dyn Iterator<Item = (&str, Option<&dyn Container>)> + '_> {
        Box::new(self.containers
                     .iter()
                     .map(|(name, c)| (name.as_str(), c.as_ref().map(|c| c as &dyn Container))))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRunner {
    steps: Vec<InMemoryStep>,
    kinds: KindsRegistry,
}

impl InMemoryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un step. Nombres duplicados violan el contrato del runner.
    pub fn add_step(&mut self, step: InMemoryStep) -> &mut InMemoryStep {
        if self.position(&step.name).is_some() {
            panic!("contract violation: step {} registered twice", step.name);
        }
        self.steps.push(step);
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    pub fn register_kind(&mut self, kind: impl Kind + 'static) {
        self.kinds.register(kind);
    }

    pub fn step(&self, name: &str) -> Option<&InMemoryStep> {
        self.position(name).map(|i| &self.steps[i])
    }

    pub fn step_mut(&mut self, name: &str) -> Option<&mut InMemoryStep> {
        self.position(name).map(move |i| &mut self.steps[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    fn check(&self, map: &InvalidationMap) -> CoreResult<()> {
        for (step_name, containers) in map {
            let step = self.step(step_name)
                           .ok_or_else(|| CoreError::UnknownStep { step: step_name.clone() })?;
            for container in containers.keys() {
                if !step.declares(container) {
                    return Err(CoreError::UnknownContainer { step: step_name.clone(),
                                                             container: container.clone() });
                }
            }
        }
        Ok(())
    }
}

impl Runner for InMemoryRunner {
    fn steps(&self) -> Box<dyn Iterator<Item = &dyn Step> + '_> {
        Box::new(self.steps.iter().map(|s| s as &dyn Step))
    }

    fn kinds(&self) -> Box<dyn Iterator<Item = &dyn Kind> + '_> {
        Box::new(self.kinds.iter())
    }

    fn expand_invalidations(&self, map: &mut InvalidationMap) -> CoreResult<()> {
        for step in &self.steps {
            let Some(predecessor) = step.predecessor() else {
                continue;
            };
            if self.position(predecessor).is_none() {
                return Err(CoreError::UnknownStep { step: predecessor.to_string() });
            }
            let Some(upstream) = map.get(predecessor).cloned() else {
                continue;
            };

            for (container_name, targets) in upstream {
                let Some(container) = step.container(&container_name) else {
                    continue;
                };
                let derived: TargetSet = targets.into_iter().filter(|t| container.contains(t)).collect();
                if derived.is_empty() {
                    continue;
                }
                debug!("{} -> {}/{}: {} derived targets",
                       predecessor,
                       step.name,
                       container_name,
                       derived.len());
                map.entry(step.name.clone())
                   .or_default()
                   .entry(container_name)
                   .or_default()
                   .extend(derived);
            }
        }
        Ok(())
    }

    fn invalidate(&mut self, map: &InvalidationMap) -> CoreResult<()> {
        // validar todo antes de tocar nada
        self.check(map)?;
        for (step_name, containers) in map {
            let Some(index) = self.position(step_name) else {
                continue;
            };
            let step = &mut self.steps[index];
            for (container_name, targets) in containers {
                if let Some(Some(container)) = step.containers.get_mut(container_name) {
                    container.remove_all(targets);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> TargetSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn two_step_runner() -> InMemoryRunner {
        let mut runner = InMemoryRunner::new();
        runner.add_step(InMemoryStep::new("lift").with_targets("module", ["0x1000", "0x2000"]));
        runner.add_step(InMemoryStep::new("isolate").with_predecessor("lift")
                                                    .with_targets("module", ["0x1000"])
                                                    .with_container("cfg"));
        runner
    }

    #[test]
    fn never_populated_containers_are_reported_as_none() {
        let runner = two_step_runner();
        let step = runner.step("isolate").unwrap();
        let containers: Vec<(&str, bool)> = step.containers().map(|(n, c)| (n, c.is_some())).collect();
        assert_eq!(containers, vec![("cfg", false), ("module", true)]);
    }

    #[test]
    fn expansion_follows_successors_that_hold_the_target() {
        let runner = two_step_runner();
        let mut map = InvalidationMap::new();
        map.entry("lift".into()).or_default().insert("module".into(), set(&["0x1000", "0x2000"]));

        runner.expand_invalidations(&mut map).unwrap();
        assert_eq!(map["isolate"]["module"], set(&["0x1000"]));
    }

    #[test]
    fn invalidate_removes_targets() {
        let mut runner = two_step_runner();
        let mut map = InvalidationMap::new();
        map.entry("lift".into()).or_default().insert("module".into(), set(&["0x2000"]));

        runner.invalidate(&map).unwrap();
        assert_eq!(runner.step("lift").unwrap().container("module").unwrap().targets(), &set(&["0x1000"]));
    }

    #[test]
    fn invalidate_rejects_unknown_names_without_mutating() {
        let mut runner = two_step_runner();
        let mut map = InvalidationMap::new();
        map.entry("lift".into()).or_default().insert("module".into(), set(&["0x1000"]));
        map.entry("nope".into()).or_default().insert("module".into(), set(&["0x1000"]));

        let err = runner.invalidate(&map).unwrap_err();
        assert!(matches!(err, CoreError::UnknownStep { ref step } if step == "nope"));
        assert!(runner.step("lift").unwrap().container("module").unwrap().contains("0x1000"));

        let mut map = InvalidationMap::new();
        map.entry("lift".into()).or_default().insert("asm".into(), set(&["0x1000"]));
        assert!(matches!(runner.invalidate(&map), Err(CoreError::UnknownContainer { .. })));
    }

    #[test]
    fn populating_a_declared_container_makes_it_visible() {
        let mut runner = two_step_runner();
        let step = runner.step_mut("isolate").unwrap();
        step.container_mut("cfg").insert("0x1000");
        step.container_mut("module").insert("0x2000");

        let step = runner.step("isolate").unwrap();
        assert_eq!(step.container("cfg").unwrap().targets(), &set(&["0x1000"]));
        assert_eq!(step.container("module").unwrap().targets(), &set(&["0x1000", "0x2000"]));
        assert!(step.containers().all(|(_, c)| c.is_some()));
        assert!(runner.step_mut("nope").is_none());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_step_names_panic() {
        let mut runner = two_step_runner();
        runner.add_step(InMemoryStep::new("lift"));
    }
}
