//! Diff estructural de referencia entre dos versiones de un árbol.
//!
//! Ambos valores se proyectan a `serde_json::Value` y se comparan nodo a nodo:
//! objetos por clave, arrays por índice, y cualquier otro par distinto como
//! reemplazo. Cada diferencia queda registrada como un `Change` con el valor
//! previo (`Old`) y el nuevo (`New`); ausencia de `Old` es una inserción y
//! ausencia de `New` una eliminación.
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::path::TreePath;
use super::TupleTreeCompatible;
use crate::errors::{CoreError, CoreResult};

const DIFF_WHAT: &str = "tree diff";

/// Una diferencia puntual entre dos árboles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    pub path: TreePath,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

// Un campo presente (aunque sea `null`) es `Some`; sólo la ausencia es `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Change {
    pub fn is_insertion(&self) -> bool {
        self.old.is_none()
    }

    pub fn is_removal(&self) -> bool {
        self.new.is_none()
    }
}

/// Diff tipado: sólo tiene sentido aplicado sobre un `T`.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", rename_all = "PascalCase")]
pub struct TupleTreeDiff<T> {
    changes: Vec<Change>,
    #[serde(skip)]
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TupleTreeDiff<T> {
    fn clone(&self) -> Self {
        Self::from_changes(self.changes.clone())
    }
}

impl<T> fmt::Debug for TupleTreeDiff<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleTreeDiff")
         .field("type", &std::any::type_name::<T>())
         .field("changes", &self.changes)
         .finish()
    }
}

impl<T> PartialEq for TupleTreeDiff<T> {
    fn eq(&self, other: &Self) -> bool {
        self.changes == other.changes
    }
}

impl<T> Default for TupleTreeDiff<T> {
    fn default() -> Self {
        Self::from_changes(Vec::new())
    }
}

impl<T> TupleTreeDiff<T> {
    pub fn from_changes(changes: Vec<Change>) -> Self {
        Self { changes,
               marker: PhantomData }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// `true` si algún cambio toca `pattern` (ver `TreePath::touches`).
    pub fn touches(&self, pattern: &TreePath) -> bool {
        self.changes.iter().any(|c| c.path.touches(pattern))
    }

    /// Escribe el diff en su formato textual (JSON).
    pub fn write_to(&self, out: &mut dyn Write) -> CoreResult<()> {
        serde_json::to_writer_pretty(&mut *out, self).map_err(CoreError::stream)?;
        writeln!(out).map_err(CoreError::stream)
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string_pretty(self).expect("a list of changes always serializes")
    }

    pub fn read_from(buffer: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(buffer).map_err(|e| CoreError::parse(DIFF_WHAT, e))
    }
}

impl<T: TupleTreeCompatible> TupleTreeDiff<T> {
    /// Calcula todas las diferencias estructurales entre `old` y `new`.
    pub fn compute(old: &T, new: &T) -> Self {
        let old = super::to_tree_value(old);
        let new = super::to_tree_value(new);
        let mut changes = Vec::new();
        diff_values(&TreePath::root(), &old, &new, &mut changes);
        Self::from_changes(changes)
    }

    /// Aplica el diff sobre `target`. Si algún cambio no encaja, `target`
    /// queda intacto.
    pub fn apply(&self, target: &mut T) -> CoreResult<()> {
        let mut value = super::to_tree_value(target);
        for change in &self.changes {
            apply_change(&mut value, change)?;
        }
        *target = serde_json::from_value(value).map_err(|e| CoreError::parse(DIFF_WHAT, e))?;
        Ok(())
    }
}

fn diff_values(path: &TreePath, old: &Value, new: &Value, out: &mut Vec<Change>) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(before), Value::Object(after)) => {
            for (key, old_child) in before {
                match after.get(key) {
                    Some(new_child) => diff_values(&path.child(key.as_str()), old_child, new_child, out),
                    None => out.push(Change { path: path.child(key.as_str()),
                                              old: Some(old_child.clone()),
                                              new: None }),
                }
            }
            for (key, new_child) in after {
                if !before.contains_key(key) {
                    out.push(Change { path: path.child(key.as_str()),
                                      old: None,
                                      new: Some(new_child.clone()) });
                }
            }
        }
        (Value::Array(before), Value::Array(after)) => {
            let common = before.len().min(after.len());
            for index in 0..common {
                diff_values(&path.child(index.to_string()), &before[index], &after[index], out);
            }
            for (index, item) in after.iter().enumerate().skip(common) {
                out.push(Change { path: path.child(index.to_string()),
                                  old: None,
                                  new: Some(item.clone()) });
            }
            // en orden descendente para que los índices sigan siendo válidos al aplicar
            for index in (common..before.len()).rev() {
                out.push(Change { path: path.child(index.to_string()),
                                  old: Some(before[index].clone()),
                                  new: None });
            }
        }
        _ => out.push(Change { path: path.clone(),
                               old: Some(old.clone()),
                               new: Some(new.clone()) }),
    }
}

fn conflict(change: &Change) -> CoreError {
    CoreError::DiffConflict { path: change.path.to_string() }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

fn apply_change(root: &mut Value, change: &Change) -> CoreResult<()> {
    let Some((last, parents)) = change.path.segments().split_last() else {
        if change.old.as_ref() != Some(&*root) {
            return Err(conflict(change));
        }
        *root = change.new.clone().ok_or_else(|| conflict(change))?;
        return Ok(());
    };

    let mut node = root;
    for segment in parents {
        node = child_mut(node, segment).ok_or_else(|| conflict(change))?;
    }

    match node {
        Value::Object(map) => {
            if map.get(last) != change.old.as_ref() {
                return Err(conflict(change));
            }
            match &change.new {
                Some(value) => {
                    map.insert(last.clone(), value.clone());
                }
                None => {
                    map.remove(last);
                }
            }
            Ok(())
        }
        Value::Array(items) => {
            let index: usize = last.parse().map_err(|_| conflict(change))?;
            if items.get(index) != change.old.as_ref() {
                return Err(conflict(change));
            }
            match &change.new {
                Some(value) if index < items.len() => items[index] = value.clone(),
                Some(value) if index == items.len() => items.push(value.clone()),
                Some(_) => return Err(conflict(change)),
                None => {
                    items.remove(index);
                }
            }
            Ok(())
        }
        _ => Err(conflict(change)),
    }
}
