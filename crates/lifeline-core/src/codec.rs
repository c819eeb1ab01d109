//! Byte encodings selected by [`Format`] tag.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use lifeline_protocols::{Format, FormatError, PropertyError};

/// Encode a value in the given format.
pub fn encode<T: Serialize + ?Sized>(value: &T, format: Format) -> Result<Vec<u8>, FormatError> {
    match format {
        Format::Json => Ok(serde_json::to_vec_pretty(value)?),
        Format::Yaml => serde_yml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| FormatError::Yaml(e.to_string())),
        Format::Toml => toml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| FormatError::Toml(e.to_string())),
    }
}

/// Decode a value from bytes in the given format.
pub fn decode<T: DeserializeOwned>(data: &[u8], format: Format) -> Result<T, FormatError> {
    match format {
        Format::Json => Ok(serde_json::from_slice(data)?),
        Format::Yaml => serde_yml::from_str(as_text(data)?)
            .map_err(|e| FormatError::Yaml(e.to_string())),
        Format::Toml => {
            toml::from_str(as_text(data)?).map_err(|e| FormatError::Toml(e.to_string()))
        }
    }
}

/// Encode a value and write it to `path`.
pub fn write_file<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    format: Format,
) -> Result<(), PropertyError> {
    let bytes = encode(value, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Read `path` and decode its contents.
pub fn read_file<T: DeserializeOwned>(path: &Path, format: Format) -> Result<T, PropertyError> {
    let bytes = fs::read(path)?;
    Ok(decode(&bytes, format)?)
}

fn as_text(data: &[u8]) -> Result<&str, FormatError> {
    std::str::from_utf8(data).map_err(|e| FormatError::Encoding(e.to_string()))
}
