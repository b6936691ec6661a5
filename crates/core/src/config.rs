use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gold::DEFAULT_FALLBACK_PRICE_PER_GRAM;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub gold: GoldConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GoldConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub currency: String,
    pub timeout_secs: u64,
    pub fallback_price_per_gram: f64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub gold_api_key: Option<String>,
    pub gold_base_url: Option<String>,
    pub gold_timeout_secs: Option<u64>,
    pub fallback_price_per_gram: Option<f64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                static_dir: None,
                graceful_shutdown_secs: 15,
            },
            catalog: CatalogConfig { path: PathBuf::from("data/products.json") },
            gold: GoldConfig {
                api_key: None,
                base_url: "https://www.goldapi.io/api".to_string(),
                currency: "USD".to_string(),
                timeout_secs: 10,
                fallback_price_per_gram: DEFAULT_FALLBACK_PRICE_PER_GRAM,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl GoldConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("goldleaf.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(static_dir) = server.static_dir {
                self.server.static_dir = Some(static_dir);
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
        }

        if let Some(gold) = patch.gold {
            if let Some(api_key) = gold.api_key {
                self.gold.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = gold.base_url {
                self.gold.base_url = base_url;
            }
            if let Some(currency) = gold.currency {
                self.gold.currency = currency;
            }
            if let Some(timeout_secs) = gold.timeout_secs {
                self.gold.timeout_secs = timeout_secs;
            }
            if let Some(fallback) = gold.fallback_price_per_gram {
                self.gold.fallback_price_per_gram = fallback;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GOLDLEAF_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("GOLDLEAF_SERVER_PORT") {
            self.server.port = parse_u16("GOLDLEAF_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("GOLDLEAF_SERVER_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("GOLDLEAF_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("GOLDLEAF_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("GOLDLEAF_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }

        let api_key = read_env("GOLDLEAF_GOLD_API_KEY").or_else(|| read_env("GOLDAPI_KEY"));
        if let Some(value) = api_key {
            self.gold.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("GOLDLEAF_GOLD_BASE_URL") {
            self.gold.base_url = value;
        }
        if let Some(value) = read_env("GOLDLEAF_GOLD_CURRENCY") {
            self.gold.currency = value;
        }
        if let Some(value) = read_env("GOLDLEAF_GOLD_TIMEOUT_SECS") {
            self.gold.timeout_secs = parse_u64("GOLDLEAF_GOLD_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("GOLDLEAF_GOLD_FALLBACK_PRICE_PER_GRAM") {
            self.gold.fallback_price_per_gram =
                parse_f64("GOLDLEAF_GOLD_FALLBACK_PRICE_PER_GRAM", &value)?;
        }

        let log_level =
            read_env("GOLDLEAF_LOGGING_LEVEL").or_else(|| read_env("GOLDLEAF_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GOLDLEAF_LOGGING_FORMAT").or_else(|| read_env("GOLDLEAF_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(static_dir) = overrides.static_dir {
            self.server.static_dir = Some(static_dir);
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(api_key) = overrides.gold_api_key {
            self.gold.api_key = Some(secret_value(api_key));
        }
        if let Some(base_url) = overrides.gold_base_url {
            self.gold.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.gold_timeout_secs {
            self.gold.timeout_secs = timeout_secs;
        }
        if let Some(fallback) = overrides.fallback_price_per_gram {
            self.gold.fallback_price_per_gram = fallback;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_gold(&self.gold)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("goldleaf.toml"), PathBuf::from("config/goldleaf.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_gold(gold: &GoldConfig) -> Result<(), ConfigError> {
    if !gold.base_url.starts_with("http://") && !gold.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "gold.base_url must start with http:// or https://".to_string(),
        ));
    }

    let currency_ok =
        gold.currency.len() == 3 && gold.currency.chars().all(|c| c.is_ascii_uppercase());
    if !currency_ok {
        return Err(ConfigError::Validation(
            "gold.currency must be a three-letter uppercase ISO code (e.g. `USD`)".to_string(),
        ));
    }

    if gold.timeout_secs == 0 || gold.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "gold.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    let fallback = gold.fallback_price_per_gram;
    if !fallback.is_finite() || fallback <= 0.0 {
        return Err(ConfigError::Validation(
            "gold.fallback_price_per_gram must be a finite number greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    gold: Option<GoldPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct GoldPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    currency: Option<String>,
    timeout_secs: Option<u64>,
    fallback_price_per_gram: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
