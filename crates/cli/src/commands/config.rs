use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use toml::Value;
use vitrine_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let fields = effective_fields(&config, config_file_doc.as_ref(), config_file_path.as_deref());

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        json!({
            "config_file": config_file_path.map(|path| path.display().to_string()),
            "fields": fields,
        }),
    )
}

fn effective_fields(
    config: &AppConfig,
    doc: Option<&Value>,
    path: Option<&Path>,
) -> Vec<ConfigField> {
    let recommendation = &config.recommendation;
    let rows: [(&'static str, String, &[&str]); 10] = [
        ("database.url", config.database.url.clone(), &["VITRINE_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["VITRINE_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["VITRINE_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "recommendation.default_limit",
            recommendation.default_limit.to_string(),
            &["VITRINE_RECOMMENDATION_DEFAULT_LIMIT"],
        ),
        (
            "recommendation.max_limit",
            recommendation.max_limit.to_string(),
            &["VITRINE_RECOMMENDATION_MAX_LIMIT"],
        ),
        (
            "recommendation.price_tolerance_pct",
            recommendation.price_tolerance_pct.to_string(),
            &["VITRINE_RECOMMENDATION_PRICE_TOLERANCE_PCT"],
        ),
        (
            "recommendation.strategy_timeout_ms",
            recommendation.strategy_timeout_ms.to_string(),
            &["VITRINE_RECOMMENDATION_STRATEGY_TIMEOUT_MS"],
        ),
        (
            "recommendation.budget_mode",
            format!("{:?}", recommendation.budget_mode).to_ascii_lowercase(),
            &["VITRINE_RECOMMENDATION_BUDGET_MODE"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["VITRINE_LOGGING_LEVEL", "VITRINE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["VITRINE_LOGGING_FORMAT", "VITRINE_LOG_FORMAT"],
        ),
    ];

    rows.into_iter()
        .map(|(key, value, env_keys)| ConfigField {
            key,
            value,
            source: field_source(key, env_keys, doc, path),
        })
        .collect()
}

fn detect_config_path() -> Option<PathBuf> {
    ["vitrine.toml", "config/vitrine.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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
