//! Payloads compartidos por los tests de integración del core.
use std::collections::BTreeMap;

use pipe_core::TupleTreeGlobal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Model {
    pub functions: BTreeMap<String, String>,
    pub version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    pub flags: Vec<String>,
}

pub type ModelGlobal = TupleTreeGlobal<Model>;
pub type SettingsGlobal = TupleTreeGlobal<Settings>;

pub fn model(functions: &[(&str, &str)]) -> Model {
    Model { functions: functions.iter().map(|(a, n)| (a.to_string(), n.to_string())).collect(),
            version: 1 }
}
