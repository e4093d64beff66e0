use std::path::{Path, PathBuf};

use crate::config::data::{ConfigData, ConfigFormat};
use crate::config::error::ConfigError;

/// Supplies one configuration layer to the kernel before construction completes.
pub trait ConfigSource: Send + Sync {
    /// Human-readable description used in logs
    fn describe(&self) -> String;

    /// Load the layer. `Ok(None)` means the source has nothing to contribute.
    fn load(&self) -> Result<Option<ConfigData>, ConfigError>;
}

/// A pre-loaded configuration layer
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    data: ConfigData,
}

impl StaticConfigSource {
    pub fn new(data: ConfigData) -> Self {
        Self { data }
    }
}

impl ConfigSource for StaticConfigSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    fn load(&self) -> Result<Option<ConfigData>, ConfigError> {
        Ok(Some(self.data.clone()))
    }
}

/// Reads a configuration layer from a file on disk.
///
/// The format is taken from the file extension unless set explicitly.
/// A missing file contributes nothing; a file that exists but cannot be
/// read or parsed is a [`ConfigError::LoadError`].
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
    format: Option<ConfigFormat>,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Force a format regardless of the file extension
    pub fn with_format(mut self, format: ConfigFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn load(&self) -> Result<Option<ConfigData>, ConfigError> {
        if !self.path.exists() {
            log::debug!("Config file {} does not exist, skipping layer", self.path.display());
            return Ok(None);
        }

        let format = self
            .format
            .or_else(|| ConfigFormat::from_path(&self.path))
            .ok_or_else(|| ConfigError::LoadError {
                path: self.path.clone(),
                message: "unknown format".to_string(),
                source: None,
            })?;

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::LoadError {
            path: self.path.clone(),
            message: "could not read file".to_string(),
            source: Some(Box::new(e)),
        })?;

        if content.trim().is_empty() {
            return Ok(Some(ConfigData::new()));
        }

        let data = ConfigData::deserialize(&content, format).map_err(|e| ConfigError::LoadError {
            path: self.path.clone(),
            message: format!("malformed {} content", format),
            source: Some(Box::new(e)),
        })?;
        log::debug!("Loaded {} config layer from {}", format, self.path.display());
        Ok(Some(data))
    }
}
