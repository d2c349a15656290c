use super::types::AppConfig;
use crate::error::Result;
use config::{Config, Environment, File};

/// Prefix for environment overrides, e.g. `SALES_QUERY_SERVER__BIND_ADDR`
pub const ENV_PREFIX: &str = "SALES_QUERY";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    config_file: Option<String>,
    load_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_file: None,
            load_env: false,
        }
    }

    /// Load configuration from file
    pub fn load_from_file(mut self, path: Option<&str>) -> Self {
        self.config_file = path.map(String::from);
        self
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Build the final configuration
    ///
    /// The provider API key is filled from its conventional environment
    /// variable last, so a missing key never fails here.
    pub fn build(self) -> Result<AppConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(config_path) = &self.config_file {
            builder = builder.add_source(File::with_name(config_path).required(true));
        } else {
            builder = builder
                .add_source(File::with_name("sales-query").required(false))
                .add_source(File::with_name("config/sales-query").required(false));
        }

        if self.load_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        if self.load_env {
            config.llm = config.llm.with_api_key_from_env();
        }
        config.llm.validate()?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
