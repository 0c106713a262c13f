//! Load options

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::FormatId;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Skip detection and decode as this format
    pub format: Option<FormatId>,
    /// Fail on a checksum mismatch instead of logging a warning
    pub strict_checksum: bool,
}

impl Config {
    pub fn with_format(format: FormatId) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load options from a TOML file, or defaults if it doesn't exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.format.is_none());
        assert!(!config.strict_checksum);
    }

    #[test]
    fn test_parse() {
        let config = Config::from_toml_str("format = \"xbox360\"\nstrict_checksum = true\n").unwrap();
        assert_eq!(config.format, Some(FormatId::Xbox360));
        assert!(config.strict_checksum);
    }

    #[test]
    fn test_unknown_format_name() {
        assert!(matches!(
            Config::from_toml_str("format = \"dreamcast\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_and_save() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("savecodec.toml");

        assert_eq!(Config::load(&path)?, Config::default());

        let config = Config {
            format: Some(FormatId::Psp),
            strict_checksum: true,
        };
        config.save(&path)?;
        assert_eq!(Config::load(&path)?, config);
        Ok(())
    }
}
