//! Contrato de los valores con forma de árbol que pueden vivir en un global y
//! diff estructural de referencia entre dos versiones de ellos.
//!
//! La serialización textual es JSON con claves ordenadas (se pasa siempre por
//! `serde_json::Value`), de modo que dos valores iguales producen exactamente
//! los mismos bytes.

mod diff;
mod path;

use std::fmt::Debug;
use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use diff::{Change, TupleTreeDiff};
pub use path::TreePath;

use crate::errors::{CoreError, CoreResult};

const TREE_WHAT: &str = "tree value";

/// Tipos que pueden usarse como payload de un `TupleTreeGlobal`.
pub trait TupleTreeCompatible:
    Clone + Default + PartialEq + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{
}

impl<T> TupleTreeCompatible for T
    where T: Clone + Default + PartialEq + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{
}

/// Proyección a `Value`. Un payload que no se puede representar como árbol
/// JSON (p.ej. mapas con claves no textuales) rompe el contrato del tipo.
pub(crate) fn to_tree_value<T: TupleTreeCompatible>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        panic!("{} is not tree-shaped: {e}", std::any::type_name::<T>())
    })
}

pub fn write_tree<T: TupleTreeCompatible>(value: &T, out: &mut dyn Write) -> CoreResult<()> {
    serde_json::to_writer_pretty(&mut *out, &to_tree_value(value)).map_err(CoreError::stream)?;
    writeln!(out).map_err(CoreError::stream)
}

pub fn read_tree<T: TupleTreeCompatible>(buffer: &[u8]) -> CoreResult<T> {
    serde_json::from_slice(buffer).map_err(|e| CoreError::parse(TREE_WHAT, e))
}

/// Diff estructural entre `old` y `new`.
pub fn diff<T: TupleTreeCompatible>(old: &T, new: &T) -> TupleTreeDiff<T> {
    TupleTreeDiff::compute(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Doc {
        title: String,
        tags: Vec<String>,
        attrs: BTreeMap<String, u32>,
    }

    fn sample() -> Doc {
        Doc { title: "x".into(),
              tags: vec!["a".into(), "b".into()],
              attrs: BTreeMap::from([("k".to_string(), 1)]) }
    }

    #[test]
    fn write_is_deterministic_and_readable() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_tree(&sample(), &mut first).unwrap();
        write_tree(&sample(), &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(read_tree::<Doc>(&first).unwrap(), sample());
    }

    #[test]
    fn diff_then_apply_reaches_target() {
        let old = sample();
        let mut new = sample();
        new.title = "y".into();
        new.tags.pop();
        new.attrs.insert("z".into(), 9);

        let delta = diff(&old, &new);
        assert!(delta.touches(&TreePath::parse("/Attrs/z")));
        let mut patched = old.clone();
        delta.apply(&mut patched).unwrap();
        assert_eq!(patched, new);
        assert!(diff(&patched, &new).is_empty());
    }

    #[test]
    fn malformed_tree_is_a_parse_error() {
        let err = read_tree::<Doc>(b"{ not json").unwrap_err();
        assert!(matches!(err, CoreError::Parse { what: "tree value", .. }));
    }
}
