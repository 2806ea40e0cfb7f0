//! Paths dentro de un valor con forma de árbol.
//!
//! Un `TreePath` es la secuencia de claves (objetos) o índices (arrays) desde
//! la raíz del payload hasta el nodo que cambió. Su forma textual es
//! `/Functions/0x1000/Name`; `~` y `/` dentro de un segmento se escapan como
//! `~0` y `~1`. La raíz se escribe como texto vacío, de modo que `/` es el
//! path de un único segmento vacío (una clave `""`).
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{PATH_SEPARATOR, PATH_WILDCARD};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreePath {
    segments: Vec<String>,
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { segments: segments.into_iter().map(Into::into).collect() }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Devuelve un path nuevo con `segment` agregado al final.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// `true` si este path y `pattern` coinciden en todos los segmentos que
    /// comparten. Un cambio en un ancestro o en un descendiente del patrón lo
    /// toca. `*` en el patrón acepta cualquier segmento.
    pub fn touches(&self, pattern: &TreePath) -> bool {
        self.segments
            .iter()
            .zip(pattern.segments.iter())
            .all(|(segment, expected)| expected == PATH_WILDCARD || expected == segment)
    }

    /// Coincidencia exacta (misma profundidad) respetando comodines.
    pub fn matches(&self, pattern: &TreePath) -> bool {
        self.len() == pattern.len() && self.touches(pattern)
    }

    /// Segmento en la posición `index`, si existe.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Inversa exacta de `Display`: los segmentos vacíos se conservan.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::root();
        }
        let body = text.strip_prefix(PATH_SEPARATOR).unwrap_or(text);
        Self { segments: body.split(PATH_SEPARATOR).map(unescape).collect() }
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace(PATH_SEPARATOR, "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{PATH_SEPARATOR}{}", escape(segment))?;
        }
        Ok(())
    }
}

impl From<&str> for TreePath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl Serialize for TreePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TreePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let path = TreePath::from_segments(["Functions", "0x1000", "a/b~c"]);
        let text = path.to_string();
        assert_eq!(text, "/Functions/0x1000/a~1b~0c");
        assert_eq!(TreePath::parse(&text), path);
        assert_eq!(TreePath::root().to_string(), "");
        assert!(TreePath::parse("").is_root());
    }

    #[test]
    fn empty_segments_survive_the_text_form() {
        let cases = [TreePath::root(),
                     TreePath::from_segments([""]),
                     TreePath::from_segments(["A", ""]),
                     TreePath::from_segments(["", "x", ""])];
        for path in cases {
            assert_eq!(TreePath::parse(&path.to_string()), path);
        }
        assert_eq!(TreePath::from_segments([""]).to_string(), "/");
        assert_eq!(TreePath::from_segments(["A", ""]).to_string(), "/A/");
        assert_ne!(TreePath::parse("/"), TreePath::root());
    }

    #[test]
    fn touches_handles_wildcards_ancestors_and_descendants() {
        let pattern = TreePath::parse("/Functions/*");
        assert!(TreePath::parse("/Functions/0x1000").touches(&pattern));
        assert!(TreePath::parse("/Functions/0x1000/Name").touches(&pattern));
        // reemplazo del mapa completo
        assert!(TreePath::parse("/Functions").touches(&pattern));
        assert!(!TreePath::parse("/Segments/0").touches(&pattern));

        assert!(TreePath::parse("/Functions/0x1000").matches(&pattern));
        assert!(!TreePath::parse("/Functions/0x1000/Name").matches(&pattern));
    }
}
