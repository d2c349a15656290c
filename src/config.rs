//! Layered configuration: defaults, TOML file, environment.

pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, ENV_PREFIX};
pub use types::{AppConfig, DatabaseConfig, LoggingConfig, ServerConfig};

use crate::error::Result;

impl AppConfig {
    /// 設定ファイルと環境変数から読み込み
    pub fn load(path: Option<&str>) -> Result<Self> {
        ConfigLoader::new()
            .load_from_file(path)
            .load_from_env()
            .build()
    }

    /// サンプル設定ファイルの内容を生成
    pub fn sample_toml() -> Result<String> {
        let toml_content = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        Ok(format!(
            r#"# sales-query configuration
#
# Save as sales-query.toml. Every key can be overridden from the
# environment, e.g. SALES_QUERY_SERVER__BIND_ADDR=0.0.0.0:8000
#
# The model API key is read from GOOGLE_API_KEY (provider = "gemini")
# or OPENAI_API_KEY (provider = "openai") unless set as llm.api_key.

{}"#,
            toml_content
        ))
    }

    /// サンプル設定ファイルを書き出し
    pub fn write_sample(path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, Self::sample_toml()?)?;
        Ok(())
    }
}
