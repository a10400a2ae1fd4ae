use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tempfile::TempDir;
use vitrine_cli::commands::{config, migrate, recommend, seed};
use vitrine_db::DemoDataset;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("VITRINE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_bad_override() {
    with_env(&[("VITRINE_DATABASE_MAX_CONNECTIONS", "many")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn migrate_reports_unreachable_database() {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}/missing/vitrine.db", dir.path().display());
    with_env(
        &[("VITRINE_DATABASE_URL", url.as_str()), ("VITRINE_DATABASE_TIMEOUT_SECS", "1")],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 4, "expected connectivity failure code");
            assert_eq!(parse_payload(&result.output)["error_class"], "db_connectivity");
        },
    );
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("VITRINE_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        assert_eq!(first_payload["data"]["users"], 3);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);

        assert_eq!(first_payload["message"], second_payload["message"]);
        assert_eq!(first_payload["data"], second_payload["data"]);
    });
}

#[test]
fn recommend_ranks_seeded_history() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("VITRINE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let ana = DemoDataset::user_id(0).to_string();
        let result = recommend::run(&ana, Some(3));
        assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

        let payload = parse_payload(&result.output);
        let items = payload["data"]["recommendations"].as_array().expect("list");
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item["source"] == "personalized"));
        assert_eq!(payload["data"]["user_id"], ana.as_str());
        assert!(payload["data"]["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    });
}

#[test]
fn recommend_falls_back_to_popular_without_history() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("VITRINE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let carla = DemoDataset::user_id(2).to_string();
        let result = recommend::run(&carla, None);
        let payload = parse_payload(&result.output);

        assert_eq!(result.exit_code, 0);
        let first = &payload["data"]["recommendations"][0];
        assert_eq!(first["id"], DemoDataset::product_id(12).to_string());
        assert_eq!(first["source"], "popular");
    });
}

#[test]
fn recommend_unknown_user_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("VITRINE_DATABASE_URL", url.as_str())], || {
        assert_eq!(migrate::run().exit_code, 0);

        let result = recommend::run("3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34", Some(5));
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "not_found");
        assert_eq!(payload["data"]["hint"], "The requested user does not exist.");
    });
}

#[test]
fn recommend_rejects_bad_input_before_connecting() {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}/missing/vitrine.db", dir.path().display());
    with_env(&[("VITRINE_DATABASE_URL", url.as_str())], || {
        let bad_limit = recommend::run("3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34", Some(-1));
        assert_eq!(bad_limit.exit_code, 7);
        assert_eq!(parse_payload(&bad_limit.output)["error_class"], "invalid_argument");

        let bad_id = recommend::run("not-a-uuid", Some(5));
        assert_eq!(bad_id.exit_code, 7);
        assert_eq!(parse_payload(&bad_id.output)["error_class"], "invalid_argument");

        let too_many = recommend::run("3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34", Some(101));
        assert_eq!(parse_payload(&too_many.output)["error_class"], "invalid_argument");
    });
}

#[test]
fn recommend_leaves_unmigrated_database_alone() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("VITRINE_DATABASE_URL", url.as_str())], || {
        let result = recommend::run("3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34", Some(5));
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "migration");
        assert!(payload["message"].as_str().is_some_and(|m| m.contains("vitrine migrate")));

        let again = recommend::run("3f2b8c1e-9d4a-4c6b-8e2f-1a7d5c9b0e34", Some(5));
        assert_eq!(again.exit_code, 5, "recommend must not migrate on its own");
    });
}

#[test]
fn config_attributes_env_overrides() {
    with_env(
        &[("VITRINE_DATABASE_URL", "sqlite::memory:"), ("VITRINE_LOG_FORMAT", "json")],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            let fields = payload["data"]["fields"].as_array().expect("fields");
            let field = |key: &str| {
                fields.iter().find(|field| field["key"] == key).cloned().expect("field present")
            };

            assert_eq!(field("database.url")["source"], "env (VITRINE_DATABASE_URL)");
            assert_eq!(field("logging.format")["value"], "json");
            assert_eq!(field("logging.format")["source"], "env (VITRINE_LOG_FORMAT)");
        },
    );
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}/vitrine.db?mode=rwc", dir.path().display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "VITRINE_DATABASE_URL",
        "VITRINE_DATABASE_MAX_CONNECTIONS",
        "VITRINE_DATABASE_TIMEOUT_SECS",
        "VITRINE_RECOMMENDATION_DEFAULT_LIMIT",
        "VITRINE_RECOMMENDATION_MAX_LIMIT",
        "VITRINE_RECOMMENDATION_PRICE_TOLERANCE_PCT",
        "VITRINE_RECOMMENDATION_STRATEGY_TIMEOUT_MS",
        "VITRINE_RECOMMENDATION_BUDGET_MODE",
        "VITRINE_LOGGING_LEVEL",
        "VITRINE_LOGGING_FORMAT",
        "VITRINE_LOG_LEVEL",
        "VITRINE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
