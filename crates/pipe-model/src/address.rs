//! Direcciones de código. Las funciones se indexan por su dirección de
//! entrada en hexadecimal (`0x1000`), que es también el segmento de path
//! `/Functions/<addr>` y el prefijo `<addr>:` de los targets cacheados.
use crate::ModelError;

/// Clave canónica de una dirección: hexadecimal en minúsculas con `0x`.
pub fn address_key(address: u64) -> String {
    format!("{address:#x}")
}

pub fn parse_address(text: &str) -> Result<u64, ModelError> {
    let digits = text.strip_prefix("0x")
                     .or_else(|| text.strip_prefix("0X"))
                     .ok_or_else(|| ModelError::InvalidAddress(text.to_string()))?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ModelError::InvalidAddress(text.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| ModelError::InvalidAddress(text.to_string()))
}

/// Prefijo que comparten los targets derivados de la función en `key`.
pub fn target_prefix(key: &str) -> String {
    format!("{key}:")
}
