use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::workflows::lending::advice::{
    AdvicePipeline, GoogleAnalyst, HttpTransport, JsonTransport, LettaRefiner, GOOGLE_BASE_URL,
    GOOGLE_MODEL, LETTA_BASE_URL,
};
use crate::workflows::lending::offer::{AprModel, PricingTable};
use crate::workflows::lending::scoring::{ScoringTable, ScoringTableError};
use crate::workflows::lending::LendingPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lending: LendingConfig,
    pub advice: AdviceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Compact,
        };

        let apr_model = match env::var("CREDI_APR_MODEL") {
            Ok(value) => value
                .parse::<AprModel>()
                .map_err(|_| ConfigError::InvalidAprModel { value })?,
            Err(_) => AprModel::default(),
        };
        let scoring_table = env::var("CREDI_SCORING_TABLE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let request_timeout = match env::var("ADVICE_TIMEOUT_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidAdviceTimeout { value })?,
            Err(_) => AdviceConfig::default().request_timeout,
        };
        let advice = AdviceConfig {
            google_api_key: non_empty_var("GOOGLE_API_KEY"),
            google_model: non_empty_var("GOOGLE_AI_MODEL")
                .unwrap_or_else(|| GOOGLE_MODEL.to_string()),
            google_base_url: non_empty_var("GOOGLE_AI_BASE_URL")
                .unwrap_or_else(|| GOOGLE_BASE_URL.to_string()),
            letta_api_key: non_empty_var("LETTA_API_KEY"),
            letta_agent_id: non_empty_var("LETTA_AGENT_ID"),
            letta_base_url: non_empty_var("LETTA_BASE_URL")
                .unwrap_or_else(|| LETTA_BASE_URL.to_string()),
            request_timeout,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            lending: LendingConfig {
                apr_model,
                scoring_table,
            },
            advice,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Scoring and pricing inputs for the lending workflow.
#[derive(Debug, Clone, Default)]
pub struct LendingConfig {
    pub apr_model: AprModel,
    /// JSON scoring table replacing the built-in weights and buckets.
    pub scoring_table: Option<PathBuf>,
}

impl LendingConfig {
    /// Build the workflow policy, loading and validating the scoring table if one is set.
    pub fn policy(&self) -> Result<LendingPolicy, ConfigError> {
        let scoring = match &self.scoring_table {
            Some(path) => {
                ScoringTable::from_path(path).map_err(|source| ConfigError::ScoringTable {
                    path: path.clone(),
                    source,
                })?
            }
            None => ScoringTable::default(),
        };

        Ok(LendingPolicy {
            scoring,
            pricing: PricingTable::new(self.apr_model),
            ..LendingPolicy::default()
        })
    }
}

/// Hosted advice providers. Without a Google key the service answers with the offline analyst;
/// a Letta key or agent id attaches the refiner.
#[derive(Clone)]
pub struct AdviceConfig {
    pub google_api_key: Option<String>,
    pub google_model: String,
    pub google_base_url: String,
    pub letta_api_key: Option<String>,
    pub letta_agent_id: Option<String>,
    pub letta_base_url: String,
    pub request_timeout: Duration,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_model: GOOGLE_MODEL.to_string(),
            google_base_url: GOOGLE_BASE_URL.to_string(),
            letta_api_key: None,
            letta_agent_id: None,
            letta_base_url: LETTA_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for AdviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("AdviceConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_model", &self.google_model)
            .field("google_base_url", &self.google_base_url)
            .field("letta_api_key", &redact(&self.letta_api_key))
            .field("letta_agent_id", &self.letta_agent_id)
            .field("letta_base_url", &self.letta_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AdviceConfig {
    pub fn pipeline(&self) -> AdvicePipeline {
        self.pipeline_with(Arc::new(HttpTransport::new(self.request_timeout)))
    }

    /// Build the pipeline over an explicit transport.
    pub fn pipeline_with(&self, transport: Arc<dyn JsonTransport>) -> AdvicePipeline {
        let pipeline = match &self.google_api_key {
            Some(key) => AdvicePipeline::new(Arc::new(
                GoogleAnalyst::new(Some(key.clone()), transport.clone())
                    .with_endpoint(self.google_base_url.clone(), self.google_model.clone()),
            )),
            None => AdvicePipeline::offline(),
        };

        if self.letta_api_key.is_none() && self.letta_agent_id.is_none() {
            return pipeline;
        }
        pipeline.with_refiner(Arc::new(
            LettaRefiner::new(
                self.letta_api_key.clone(),
                self.letta_agent_id.clone(),
                transport,
            )
            .with_base_url(self.letta_base_url.clone()),
        ))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidLogFormat {
        value: String,
    },
    InvalidAprModel {
        value: String,
    },
    InvalidAdviceTimeout {
        value: String,
    },
    ScoringTable {
        path: PathBuf,
        source: ScoringTableError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat { value } => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json' (found '{value}')")
            }
            ConfigError::InvalidAprModel { value } => write!(
                f,
                "CREDI_APR_MODEL must be 'tiered' or 'continuous' (found '{value}')"
            ),
            ConfigError::InvalidAdviceTimeout { value } => write!(
                f,
                "ADVICE_TIMEOUT_SECS must be a positive number of seconds (found '{value}')"
            ),
            ConfigError::ScoringTable { path, source } => write!(
                f,
                "CREDI_SCORING_TABLE '{}' is unusable: {}",
                path.display(),
                source
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat { .. }
            | ConfigError::InvalidAprModel { .. }
            | ConfigError::InvalidAdviceTimeout { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ScoringTable { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("CREDI_APR_MODEL");
        env::remove_var("CREDI_SCORING_TABLE");
        env::remove_var("GOOGLE_API_KEY");
        env::remove_var("GOOGLE_AI_MODEL");
        env::remove_var("GOOGLE_AI_BASE_URL");
        env::remove_var("LETTA_API_KEY");
        env::remove_var("LETTA_AGENT_ID");
        env::remove_var("LETTA_BASE_URL");
        env::remove_var("ADVICE_TIMEOUT_SECS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.lending.apr_model, AprModel::Tiered);
        assert!(config.lending.scoring_table.is_none());
        assert!(config.advice.google_api_key.is_none());
        assert_eq!(config.advice.request_timeout, Duration::from_secs(30));
        assert_eq!(config.advice.pipeline().analyst_name(), "heuristic");
    }

    #[test]
    fn reads_advice_provider_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GOOGLE_API_KEY", "google-secret");
        env::set_var("LETTA_API_KEY", "letta-secret");
        env::set_var("LETTA_AGENT_ID", "agent-7");
        env::set_var("LETTA_BASE_URL", "http://127.0.0.1:8283/v1");
        env::set_var("ADVICE_TIMEOUT_SECS", "5");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        let advice = &config.advice;
        assert_eq!(advice.google_api_key.as_deref(), Some("google-secret"));
        assert_eq!(advice.google_model, GOOGLE_MODEL);
        assert_eq!(advice.letta_agent_id.as_deref(), Some("agent-7"));
        assert_eq!(advice.letta_base_url, "http://127.0.0.1:8283/v1");
        assert_eq!(advice.request_timeout, Duration::from_secs(5));

        let pipeline = advice.pipeline();
        assert_eq!(pipeline.analyst_name(), "google");
        assert_eq!(pipeline.refiner_name(), Some("letta"));

        let debug = format!("{advice:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn rejects_zero_advice_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADVICE_TIMEOUT_SECS", "0");
        let err = AppConfig::load().expect_err("zero timeout is rejected");
        reset_env();

        assert!(matches!(err, ConfigError::InvalidAdviceTimeout { .. }));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_lending_and_log_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_LOG_FORMAT", "JSON");
        env::set_var("CREDI_APR_MODEL", "continuous");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.lending.apr_model, AprModel::Continuous);
        let policy = config.lending.policy().expect("default table loads");
        assert_eq!(policy.pricing.apr_model(), AprModel::Continuous);
    }

    #[test]
    fn rejects_unknown_apr_model() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CREDI_APR_MODEL", "variable");
        let err = AppConfig::load().expect_err("unknown model is rejected");
        reset_env();

        assert!(matches!(err, ConfigError::InvalidAprModel { ref value } if value == "variable"));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_FORMAT", "xml");
        let err = AppConfig::load().expect_err("unknown format is rejected");
        reset_env();

        assert!(matches!(err, ConfigError::InvalidLogFormat { .. }));
    }

    #[test]
    fn policy_rejects_scoring_table_with_bad_weights() {
        let mut table = ScoringTable::default();
        table.weights.loan_amount += 0.05;
        let path = env::temp_dir().join(format!(
            "credi-index-bad-table-{}.json",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).expect("temp file");
        file.write_all(&serde_json::to_vec(&table).expect("table serializes"))
            .expect("write table");

        let config = LendingConfig {
            apr_model: AprModel::Tiered,
            scoring_table: Some(path.clone()),
        };
        let err = config.policy().expect_err("weights must sum to one");
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            err,
            ConfigError::ScoringTable {
                source: ScoringTableError::WeightSum { .. },
                ..
            }
        ));
    }
}
