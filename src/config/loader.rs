use crate::config::schema::{ConfigOverrides, MonitorConfig};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates a config file. Fields missing from the file keep
    /// their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MonitorConfig> {
        let config = Self::load_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the effective config for a run: defaults, then the optional
    /// file, then command-line overrides. Validation happens last so an
    /// override can fix a bad file value.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<MonitorConfig> {
        let base = match path {
            Some(path) => Self::load_file(path)?,
            None => MonitorConfig::default(),
        };

        let config = overrides.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<MonitorConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }
}
