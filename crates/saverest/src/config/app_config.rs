use std::{
    fs::File,
    io::{Error, ErrorKind, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::config::{logger_config::LoggerConfig, save_config::SaveConfig};

/// Main configuration of the save/restore subsystem.
/// Please use [`AppConfigBuilder`] if you want to build it from code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the application, used in log lines
    pub app_name: String,
    /// Logger configuration to use.
    pub logger_config: Option<LoggerConfig>,
    /// Slot storage configuration.
    #[serde(default)]
    pub save_config: SaveConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "saverest".to_string(),
            logger_config: Some(Default::default()),
            save_config: Default::default(),
        }
    }
}

/// `AppConfigBuilder` is a convenience builder to create a `AppConfig` from code.
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Create a new `AppConfigBuilder` builder
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_app_name(mut self, app_name: String) -> Self {
        self.config.app_name = app_name;
        self
    }

    /// Sets the logger configuration for the application
    pub fn with_logger_config(mut self, logger_config: LoggerConfig) -> Self {
        self.config.logger_config = Some(logger_config);
        self
    }

    /// Sets the slot storage configuration. `SaveConfig` can be built using `SaveConfigBuilder`
    pub fn with_save_config(mut self, save_config: SaveConfig) -> Self {
        self.config.save_config = save_config;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> AppConfig {
        self.config
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AppConfigReader;

impl AppConfigReader {
    pub const DEFAULT_FILE: &'static str = "saverest.json";

    pub fn read_or_create_default(path: &Path) -> Result<AppConfig, Error> {
        if !path.exists() {
            println!("Couldn't find `{}` configuration file. Generating a new one", path.display());
            let config = AppConfig::default();
            let mut file = File::create(path)?;
            let bytes = serde_json::to_vec_pretty(&config)?;
            file.write_all(bytes.as_slice())?;
            Ok(config)
        } else {
            AppConfigReader::read_app_config(path)
        }
    }

    pub fn read_app_json(path: &Path) -> Result<AppConfig, Error> {
        if !path.exists() {
            return Err(Error::new(ErrorKind::NotFound, "File not found"));
        }
        AppConfigReader::read_app_config(path)
    }

    fn read_app_config(path: &Path) -> Result<AppConfig, Error> {
        let mut config_file = File::open(path)?;
        let mut bytes = Vec::new();
        config_file.read_to_end(&mut bytes)?;
        let config = serde_json::from_slice(bytes.as_slice())?;
        Ok(config)
    }
}
