//! Configuration management for the boleto fraud detection pipeline

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "BOLETO_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming analysis jobs
    pub job_subject: String,
    /// Subject for outgoing analysis outcomes
    pub result_subject: String,
}

/// Classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Path to the ONNX classifier
    pub model_path: String,
    /// Name reported in explanations
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_model_name() -> String {
    "Random Forest Classifier".to_string()
}

/// Product policy constants used by validation and explanations
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Oldest accepted due date, in years before today
    pub max_past_years: u32,
    /// Furthest accepted due date, in years after today
    pub max_future_years: u32,
    /// Largest amount a boleto can carry
    pub max_valor: f64,
    /// Amounts above this get an "elevated value" reason
    pub elevated_value_threshold: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_past_years: 5,
            max_future_years: 2,
            max_valor: 9_999_999.99,
            elevated_value_threshold: 10_000.0,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of jobs processed concurrently
    pub workers: usize,
    /// Largest OCR text accepted, in bytes
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_max_text_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `$BOLETO_CONFIG` or `config/config.toml`
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with `BOLETO__*` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("BOLETO").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                job_subject: "boletos.jobs".to_string(),
                result_subject: "boletos.resultados".to_string(),
            },
            models: ModelsConfig {
                model_path: "models/modelo_boleto.onnx".to_string(),
                model_name: default_model_name(),
                onnx_threads: 1,
            },
            policy: PolicyConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                max_text_bytes: default_max_text_bytes(),
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.job_subject, "boletos.jobs");
        assert_eq!(config.pipeline.max_text_bytes, 10 * 1024 * 1024);
        assert_eq!(config.models.onnx_threads, 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.max_past_years, 5);
        assert_eq!(policy.max_future_years, 2);
        assert_eq!(policy.max_valor, 9_999_999.99);
        assert_eq!(policy.elevated_value_threshold, 10_000.0);
    }

    #[test]
    fn test_load_from_shipped_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.nats.result_subject, "boletos.resultados");
        assert_eq!(config.policy, PolicyConfig::default());
        assert_eq!(config.logging.format, "pretty");
    }
}
