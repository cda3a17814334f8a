//! Service configuration

use anyhow::{Context, Result};
use pricing_lib::predictor::ModelPaths;
use serde::Deserialize;

/// Optional config file, looked up in the working directory (`pricing.toml`)
const CONFIG_FILE: &str = "pricing";

/// Environment variables override the file, e.g. `PRICING_API_PORT=8080`
const ENV_PREFIX: &str = "PRICING";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Port for the prediction, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Learned model artifact; absence means heuristic-only mode
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Categorical encoder artifact for the learned model
    #[serde(default = "default_encoder_path")]
    pub encoder_path: String,

    /// Name attached to structured log events
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_api_port() -> u16 {
    5000
}

fn default_model_path() -> String {
    "models/model.onnx".to_string()
}

fn default_encoder_path() -> String {
    "models/encoder.json".to_string()
}

fn default_service_name() -> String {
    "price-service".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            model_path: default_model_path(),
            encoder_path: default_encoder_path(),
            service_name: default_service_name(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `pricing.toml` and `PRICING_*` environment variables
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::new(&self.model_path, &self.encoder_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Result<ServiceConfig> {
        ServiceConfig::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(source, config::FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = from_toml("").unwrap();
        assert_eq!(config.api_port, 5000);
        assert_eq!(config.model_path, "models/model.onnx");
        assert_eq!(config.encoder_path, "models/encoder.json");
        assert_eq!(config.service_name, "price-service");
    }

    #[test]
    fn test_file_values_override_defaults() {
        let config = from_toml(
            r#"
            api_port = 8080
            model_path = "/srv/models/price.onnx"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(
            config.model_paths().model_path,
            std::path::PathBuf::from("/srv/models/price.onnx")
        );
        assert_eq!(config.encoder_path, "models/encoder.json");
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(from_toml("api_port = \"not-a-port\"").is_err());
    }
}
