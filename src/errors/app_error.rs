use pipe_core::CoreError;
use pipe_model::ModelError;
use thiserror::Error;

/// Errores de la aplicación: envuelve los del core y los del modelo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error del core: {0}")]
    Core(#[from] CoreError),
    #[error("Error del modelo: {0}")]
    Model(#[from] ModelError),
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_variant_from() {
        let err: AppError = CoreError::NotFound { name: "model.json".into() }.into();
        assert_eq!(err.to_string(), "Error del core: global not found: model.json");
    }

    #[test]
    fn test_model_variant_from() {
        let err: AppError = ModelError::InvalidAddress("0xzz".into()).into();
        assert_eq!(err.to_string(), "Error del modelo: invalid address 0xzz");
    }
}
