//! Configuración del store desde variables de entorno (`.env` opcional).

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::constants::{CONTEXT_DIR, CONTEXT_DIR_ENV};

// Carga perezosa del archivo .env una sola vez por proceso.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Subdirectorio bajo la raíz de estado que contiene un archivo por global.
    pub context_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { context_dir: CONTEXT_DIR.to_string() }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let context_dir = env::var(CONTEXT_DIR_ENV).ok()
                                                   .filter(|v| !v.trim().is_empty())
                                                   .unwrap_or_else(|| CONTEXT_DIR.to_string());
        Self { context_dir }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
