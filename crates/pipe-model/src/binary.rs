//! Modelo del binario bajo análisis: el payload con forma de árbol que vive
//! en el global `model.json`.
//!
//! Todos los campos se serializan en PascalCase, de modo que los paths de los
//! diffs se leen como `/Functions/0x1000/Name` o `/Segments/0/Size`.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::{address_key, parse_address};
use crate::ModelError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Segment {
    pub start: u64,
    pub size: u64,
    pub name: String,
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
}

impl Segment {
    /// Segmento ejecutable de sólo lectura (el caso típico de `.text`).
    pub fn code(name: impl Into<String>, start: u64, size: u64) -> Self {
        Self { start,
               size,
               name: name.into(),
               readable: true,
               writable: false,
               executable: true }
    }

    pub fn data(name: impl Into<String>, start: u64, size: u64) -> Self {
        Self { start,
               size,
               name: name.into(),
               readable: true,
               writable: true,
               executable: false }
    }

    /// Primera dirección fuera del segmento (saturada en `u64::MAX`).
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end()
    }

    fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    pub entry: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Binary {
    pub architecture: String,
    pub entry_point: Option<u64>,
    /// Funciones indexadas por `address_key(entry)`.
    pub functions: BTreeMap<String, Function>,
    /// Segmentos ordenados por dirección de inicio, sin solapamientos.
    pub segments: Vec<Segment>,
}

impl Binary {
    pub fn new(architecture: impl Into<String>) -> Self {
        Self { architecture: architecture.into(),
               ..Self::default() }
    }

    /// Agrega un segmento manteniendo el orden por dirección.
    ///
    /// # Errores
    /// `DuplicateSegment` si ya existe uno con el mismo inicio y
    /// `OverlappingSegment` si se solapa con otro.
    pub fn add_segment(&mut self, segment: Segment) -> Result<(), ModelError> {
        if self.segments.iter().any(|s| s.start == segment.start) {
            return Err(ModelError::DuplicateSegment { start: segment.start });
        }
        if let Some(other) = self.segments.iter().find(|s| s.overlaps(&segment)) {
            return Err(ModelError::OverlappingSegment { start: segment.start,
                                                        other: other.start });
        }
        let index = self.segments.partition_point(|s| s.start < segment.start);
        self.segments.insert(index, segment);
        Ok(())
    }

    pub fn segment_at(&self, address: u64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.contains(address))
    }

    /// Registra una función en `entry`, que debe caer dentro de un segmento
    /// ejecutable.
    pub fn add_function(&mut self, entry: u64, name: impl Into<String>) -> Result<&mut Function, ModelError> {
        let key = address_key(entry);
        if !self.segment_at(entry).is_some_and(|s| s.executable) {
            return Err(ModelError::InvalidAddress(key));
        }
        if self.functions.contains_key(&key) {
            return Err(ModelError::DuplicateFunction(key));
        }
        let function = Function { entry,
                                  name: name.into(),
                                  comment: None };
        Ok(self.functions.entry(key).or_insert(function))
    }

    pub fn function(&self, entry: u64) -> Option<&Function> {
        self.functions.get(&address_key(entry))
    }

    pub fn function_mut(&mut self, entry: u64) -> Option<&mut Function> {
        self.functions.get_mut(&address_key(entry))
    }

    pub fn rename_function(&mut self, entry: u64, name: impl Into<String>) -> Result<(), ModelError> {
        let function = self.function_mut(entry)
                           .ok_or_else(|| ModelError::FunctionNotFound(address_key(entry)))?;
        function.name = name.into();
        Ok(())
    }

    pub fn remove_function(&mut self, entry: u64) -> Option<Function> {
        self.functions.remove(&address_key(entry))
    }

    /// Chequea los invariantes que la edición directa del árbol (p.ej. vía
    /// `apply_diff`) puede romper.
    pub fn validate(&self) -> Result<(), ModelError> {
        for pair in self.segments.windows(2) {
            if pair[0].start == pair[1].start {
                return Err(ModelError::DuplicateSegment { start: pair[1].start });
            }
            if pair[0].start > pair[1].start || pair[0].overlaps(&pair[1]) {
                return Err(ModelError::OverlappingSegment { start: pair[1].start,
                                                            other: pair[0].start });
            }
        }
        for (key, function) in &self.functions {
            if parse_address(key)? != function.entry {
                return Err(ModelError::InvalidAddress(key.clone()));
            }
        }
        if let Some(entry) = self.entry_point {
            if self.segment_at(entry).is_none() {
                return Err(ModelError::InvalidAddress(address_key(entry)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary() -> Binary {
        let mut binary = Binary::new("x86_64");
        binary.add_segment(Segment::code(".text", 0x1000, 0x1000)).unwrap();
        binary.add_segment(Segment::data(".data", 0x4000, 0x100)).unwrap();
        binary
    }

    #[test]
    fn segments_stay_sorted_and_disjoint() {
        let mut binary = binary();
        binary.add_segment(Segment::data(".bss", 0x3000, 0x10)).unwrap();
        let starts: Vec<u64> = binary.segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0x1000, 0x3000, 0x4000]);

        assert_eq!(binary.add_segment(Segment::data("dup", 0x1000, 1)),
                   Err(ModelError::DuplicateSegment { start: 0x1000 }));
        assert_eq!(binary.add_segment(Segment::data("over", 0x1800, 0x10)),
                   Err(ModelError::OverlappingSegment { start: 0x1800,
                                                        other: 0x1000 }));
        assert!(binary.validate().is_ok());
    }

    #[test]
    fn functions_live_in_executable_segments() {
        let mut binary = binary();
        binary.add_function(0x1000, "main").unwrap();
        assert_eq!(binary.function(0x1000).map(|f| f.name.as_str()), Some("main"));
        assert!(binary.functions.contains_key("0x1000"));

        assert_eq!(binary.add_function(0x4000, "data").unwrap_err(), ModelError::InvalidAddress("0x4000".into()));
        assert_eq!(binary.add_function(0x9000, "nowhere").unwrap_err(),
                   ModelError::InvalidAddress("0x9000".into()));
        assert_eq!(binary.add_function(0x1000, "again").unwrap_err(),
                   ModelError::DuplicateFunction("0x1000".into()));

        binary.rename_function(0x1000, "start").unwrap();
        assert_eq!(binary.function(0x1000).unwrap().name, "start");
        assert!(binary.rename_function(0x1004, "x").is_err());
        assert!(binary.remove_function(0x1000).is_some());
    }

    #[test]
    fn validate_catches_inconsistent_edits() {
        let mut binary = binary();
        binary.add_function(0x1000, "main").unwrap();
        binary.entry_point = Some(0x1000);
        assert!(binary.validate().is_ok());

        binary.entry_point = Some(0x9999);
        assert_eq!(binary.validate(), Err(ModelError::InvalidAddress("0x9999".into())));
        binary.entry_point = None;

        binary.function_mut(0x1000).unwrap().entry = 0x1004;
        assert_eq!(binary.validate(), Err(ModelError::InvalidAddress("0x1000".into())));
    }

    #[test]
    fn serialized_field_names_match_the_tree_paths() {
        let mut binary = binary();
        binary.add_function(0x1000, "main").unwrap();
        let value = serde_json::to_value(&binary).unwrap();
        assert_eq!(value["Functions"]["0x1000"]["Name"], "main");
        assert_eq!(value["Segments"][0]["Start"], 0x1000);
        assert!(value["EntryPoint"].is_null());
    }
}
