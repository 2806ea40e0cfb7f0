//! PipeFlow Rust Library
//!
//! Este crate actúa como la fachada de PipeFlow:
//! - Re-exporta `pipe_core` (globals, diffs, invalidación) y `pipe_model`
//!   (modelo binario y sus reglas).
//! - Expone `config` con la configuración de entorno y `errors` con el error
//!   de aplicación.
//! - `session` arma una sesión lista para usar: store con el modelo
//!   registrado y runner con las reglas del modelo.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod config;
pub mod errors;
pub mod session;

pub use pipe_core;
pub use pipe_model;

pub use config::{AppConfig, CONFIG};
pub use errors::{AppError, AppResult};
pub use session::Session;
