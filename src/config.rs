//! Settings applied when building and saving files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How group payloads are stored on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Plain `##DT` blocks.
    #[default]
    None,
    /// `##DZ` blocks, deflated; records are transposed first when a record
    /// spans more than one byte.
    Deflate,
}

/// Model-wide settings.
///
/// Every field has a default, so a JSON document only needs to name the
/// fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdfConfig {
    /// Version written to the identification block, e.g. `"4.10"`.
    pub version: String,
    /// Program identifier written to the identification block (max 8 chars).
    pub program_id: String,
    pub compression: Compression,
    /// `tool_id` of the file history comment added on save.
    pub history_tool_id: String,
    pub history_tool_vendor: String,
    pub history_tool_version: String,
    /// Name of the master channel synthesized by `append`.
    pub time_channel_name: String,
    pub time_channel_unit: String,
}

impl Default for MdfConfig {
    fn default() -> Self {
        MdfConfig {
            version: "4.10".to_string(),
            program_id: "mdf4mdl".to_string(),
            compression: Compression::None,
            history_tool_id: "mdf4-model".to_string(),
            history_tool_vendor: "mdf4-model contributors".to_string(),
            history_tool_version: env!("CARGO_PKG_VERSION").to_string(),
            time_channel_name: "t".to_string(),
            time_channel_unit: "s".to_string(),
        }
    }
}

impl MdfConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MdfConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::IOError)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.program_id.len() > 8 {
            return Err(Error::ConfigError(format!(
                "program_id '{}' is longer than 8 bytes",
                self.program_id
            )));
        }
        if self.time_channel_name.is_empty() {
            return Err(Error::ConfigError(
                "time_channel_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MdfConfig::from_json_str(r#"{ "compression": "deflate" }"#).unwrap();
        assert_eq!(config.compression, Compression::Deflate);
        assert_eq!(config.version, "4.10");
        assert_eq!(config.time_channel_name, "t");
    }

    #[test]
    fn json_round_trip() {
        let config = MdfConfig {
            program_id: "bench".to_string(),
            ..MdfConfig::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(MdfConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn long_program_id_is_rejected() {
        let err = MdfConfig::from_json_str(r#"{ "program_id": "much-too-long" }"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdf.json");
        std::fs::write(&path, r#"{ "time_channel_unit": "ms" }"#).unwrap();
        assert_eq!(MdfConfig::from_json_file(&path).unwrap().time_channel_unit, "ms");
    }
}
