use std::env;
use std::fs;
use std::path::Path;

use goldleaf_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field<'a> {
    key: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = config
        .gold
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let fields = [
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["GOLDLEAF_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["GOLDLEAF_SERVER_PORT", "PORT"],
        },
        Field {
            key: "server.static_dir",
            value: config
                .server
                .static_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["GOLDLEAF_SERVER_STATIC_DIR"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["GOLDLEAF_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "catalog.path",
            value: config.catalog.path.display().to_string(),
            env_keys: &["GOLDLEAF_CATALOG_PATH"],
        },
        Field {
            key: "gold.api_key",
            value: api_key,
            env_keys: &["GOLDLEAF_GOLD_API_KEY", "GOLDAPI_KEY"],
        },
        Field {
            key: "gold.base_url",
            value: config.gold.base_url.clone(),
            env_keys: &["GOLDLEAF_GOLD_BASE_URL"],
        },
        Field {
            key: "gold.currency",
            value: config.gold.currency.clone(),
            env_keys: &["GOLDLEAF_GOLD_CURRENCY"],
        },
        Field {
            key: "gold.timeout_secs",
            value: config.gold.timeout_secs.to_string(),
            env_keys: &["GOLDLEAF_GOLD_TIMEOUT_SECS"],
        },
        Field {
            key: "gold.fallback_price_per_gram",
            value: config.gold.fallback_price_per_gram.to_string(),
            env_keys: &["GOLDLEAF_GOLD_FALLBACK_PRICE_PER_GRAM"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["GOLDLEAF_LOGGING_LEVEL", "GOLDLEAF_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["GOLDLEAF_LOGGING_FORMAT", "GOLDLEAF_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env = env_keys
        .iter()
        .find(|env_key| env::var(env_key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    format!("{visible}***")
}
