//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use pipe_core::config::init_dotenv;
use pipe_core::StoreConfig;

/// Variable con la raíz del estado persistido.
pub const STATE_DIR_ENV: &str = "PIPEFLOW_STATE_DIR";
pub const DEFAULT_STATE_DIR: &str = "./pipeflow-state";

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raíz bajo la que el store escribe `<context_dir>/<global>`.
    pub state_dir: PathBuf,
    /// Configuración del store de globals.
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        let state_dir = env::var(STATE_DIR_ENV).ok()
                                               .filter(|v| !v.trim().is_empty())
                                               .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string());
        Self { state_dir: PathBuf::from(state_dir),
               store: StoreConfig::from_env() }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
