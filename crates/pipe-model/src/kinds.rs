//! Reglas de invalidación que entienden el modelo binario.
//!
//! Los targets cacheados por función usan la clave `<addr>:<artefacto>`
//! (p.ej. `0x1000:cfg`). `FunctionKind` invalida sólo los targets de las
//! funciones que el diff tocó; `SegmentKind` invalida todo el container cuando
//! cambia el layout de segmentos, porque cualquier artefacto puede depender
//! de él.
use std::collections::BTreeSet;

use log::trace;
use pipe_core::{Container, InvalidationEvent, Kind, TargetSet, TreePath, TupleTreeInvalidationEvent};
use serde_json::Value;

use crate::address::target_prefix;
use crate::Binary;

const FUNCTIONS: &str = "Functions";
const SEGMENTS: &str = "Segments";

/// Funciones afectadas por un diff del modelo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Touched {
    Nothing,
    Some(BTreeSet<String>),
    Everything,
}

/// Claves de las funciones que `event` modifica. Un cambio en la raíz del
/// modelo afecta a todas; un reemplazo del mapa `/Functions` completo afecta
/// a las claves presentes antes o después.
pub fn touched_functions(event: &TupleTreeInvalidationEvent<Binary>) -> Touched {
    let mut keys = BTreeSet::new();
    for change in event.diff().changes() {
        let path = &change.path;
        if path.is_root() {
            return Touched::Everything;
        }
        if path.get(0) != Some(FUNCTIONS) {
            continue;
        }
        match path.get(1) {
            Some(key) => {
                keys.insert(key.to_string());
            }
            None => {
                for side in [&change.old, &change.new].into_iter().flatten() {
                    if let Value::Object(map) = side {
                        keys.extend(map.keys().cloned());
                    }
                }
            }
        }
    }
    if keys.is_empty() {
        Touched::Nothing
    } else {
        Touched::Some(keys)
    }
}

/// Invalida los targets `<addr>:*` de cada función tocada.
#[derive(Debug, Clone, Default)]
pub struct FunctionKind {
    containers: Option<BTreeSet<String>>,
}

impl FunctionKind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restringe la regla a `container` (acumulativo).
    pub fn for_container(mut self, container: impl Into<String>) -> Self {
        self.containers.get_or_insert_with(BTreeSet::new).insert(container.into());
        self
    }
}

impl Kind for FunctionKind {
    fn name(&self) -> &str {
        "function"
    }

    fn get_invalidations(&self, event: &InvalidationEvent, step: &str, container: &dyn Container, out: &mut TargetSet) {
        if !applies_to(&self.containers, container) {
            return;
        }
        let Some(event) = event.downcast_ref::<TupleTreeInvalidationEvent<Binary>>() else {
            return;
        };
        match touched_functions(event) {
            Touched::Nothing => {}
            Touched::Everything => out.extend(container.targets().iter().cloned()),
            Touched::Some(keys) => {
                let prefixes: Vec<String> = keys.iter().map(|k| target_prefix(k)).collect();
                let before = out.len();
                out.extend(container.targets()
                                    .iter()
                                    .filter(|t| prefixes.iter().any(|p| t.starts_with(p.as_str())))
                                    .cloned());
                trace!("{step}/{}: {} function targets", container.name(), out.len() - before);
            }
        }
    }
}

/// Invalida todos los targets cuando cambia algún segmento.
#[derive(Debug, Clone)]
pub struct SegmentKind {
    pattern: TreePath,
    containers: Option<BTreeSet<String>>,
}

impl Default for SegmentKind {
    fn default() -> Self {
        Self { pattern: TreePath::from_segments([SEGMENTS]),
               containers: None }
    }
}

impl SegmentKind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_container(mut self, container: impl Into<String>) -> Self {
        self.containers.get_or_insert_with(BTreeSet::new).insert(container.into());
        self
    }
}

impl Kind for SegmentKind {
    fn name(&self) -> &str {
        "segment"
    }

    fn get_invalidations(&self, event: &InvalidationEvent, _step: &str, container: &dyn Container, out: &mut TargetSet) {
        if !applies_to(&self.containers, container) {
            return;
        }
        let Some(event) = event.downcast_ref::<TupleTreeInvalidationEvent<Binary>>() else {
            return;
        };
        if event.diff().touches(&self.pattern) {
            out.extend(container.targets().iter().cloned());
        }
    }
}

fn applies_to(containers: &Option<BTreeSet<String>>, container: &dyn Container) -> bool {
    containers.as_ref().map_or(true, |names| names.contains(container.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;
    use pipe_core::tree::Change;
    use pipe_core::TupleTreeDiff;
    use serde_json::json;

    fn event(before: &Binary, after: &Binary) -> TupleTreeInvalidationEvent<Binary> {
        TupleTreeInvalidationEvent::new(TupleTreeDiff::compute(before, after))
    }

    fn binary() -> Binary {
        let mut binary = Binary::new("x86_64");
        binary.add_segment(Segment::code(".text", 0x1000, 0x1000)).unwrap();
        binary.add_function(0x1000, "main").unwrap();
        binary.add_function(0x1100, "helper").unwrap();
        binary
    }

    fn keys(items: &[&str]) -> Touched {
        Touched::Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn renaming_touches_one_function() {
        let before = binary();
        let mut after = before.clone();
        after.rename_function(0x1100, "util").unwrap();
        assert_eq!(touched_functions(&event(&before, &after)), keys(&["0x1100"]));
    }

    #[test]
    fn new_functions_are_diffed_key_by_key() {
        let before = Binary::new("x86_64");
        let after = binary();
        assert_eq!(touched_functions(&event(&before, &after)), keys(&["0x1000", "0x1100"]));
    }

    #[test]
    fn replacing_the_whole_map_touches_both_sides() {
        let change = Change { path: TreePath::parse("/Functions"),
                              old: Some(json!({"0x1": {}})),
                              new: Some(json!({"0x2": {}})) };
        let diff = TupleTreeDiff::<Binary>::from_changes(vec![change]);
        assert_eq!(touched_functions(&TupleTreeInvalidationEvent::new(diff)), keys(&["0x1", "0x2"]));
    }

    #[test]
    fn unrelated_changes_touch_nothing() {
        let before = binary();
        let mut after = before.clone();
        after.architecture = "aarch64".into();
        assert_eq!(touched_functions(&event(&before, &after)), Touched::Nothing);
    }

    #[test]
    fn root_changes_touch_everything() {
        let change = Change { path: TreePath::root(),
                              old: Some(Value::Null),
                              new: Some(json!({})) };
        let diff = TupleTreeDiff::<Binary>::from_changes(vec![change]);
        assert_eq!(touched_functions(&TupleTreeInvalidationEvent::new(diff)), Touched::Everything);
    }
}
