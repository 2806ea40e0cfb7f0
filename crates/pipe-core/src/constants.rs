//! Constantes del core.
//!
//! Agrupa valores estáticos que fijan el layout en disco de los globals y el
//! formato textual de los diffs. Cambiarlos rompe la compatibilidad con
//! directorios de estado ya persistidos.

/// Subdirectorio (relativo a la raíz de estado) donde `GlobalsStore` guarda un
/// archivo por global, nombrado exactamente como su clave en el store.
pub const CONTEXT_DIR: &str = "context";

/// Variable de entorno que permite sobreescribir `CONTEXT_DIR`.
pub const CONTEXT_DIR_ENV: &str = "PIPEFLOW_CONTEXT_DIR";

/// Separador de segmentos en un `TreePath` textual (`/Functions/0x1000`).
pub const PATH_SEPARATOR: char = '/';

/// Comodín de un segmento dentro de un patrón de path.
pub const PATH_WILDCARD: &str = "*";
