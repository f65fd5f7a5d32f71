use std::env;
use std::sync::{Mutex, OnceLock};

use crm_cli::commands::{config, doctor, migrate, seed};
use serde_json::Value;

const MEMORY_DB: &[(&str, &str)] =
    &[("CRM_DATABASE_URL", "sqlite::memory:"), ("CRM_DATABASE_MAX_CONNECTIONS", "1")];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(MEMORY_DB, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["error_class"], Value::Null);
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("CRM_DATABASE_URL", "postgres://localhost/crm")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn migrate_returns_db_failure_for_unreachable_database() {
    with_env(&[("CRM_DATABASE_URL", "sqlite://missing-dir/for/crm/cli.db")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 4, "expected database connectivity failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "db_connectivity");
    });
}

#[test]
fn seed_reports_demo_customers() {
    with_env(MEMORY_DB, || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("  - 1: Soliman Ortega (created)"));
        assert!(message.contains("  - 2: Jo-Anne Carpio-Ortega (created)"));
    });
}

#[test]
fn seed_output_is_stable_across_runs() {
    with_env(MEMORY_DB, || {
        let first = seed::run();
        let second = seed::run();

        assert_eq!(first.exit_code, 0);
        assert_eq!(second.exit_code, 0);
        assert_eq!(parse_payload(&first.output)["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn config_attributes_env_values() {
    with_env(&[("CRM_SERVER_PORT", "9191"), ("CRM_LOG_LEVEL", "debug")], || {
        let output = config::run();

        assert!(output.contains("- server.port = 9191 (source: env (CRM_SERVER_PORT))"));
        assert!(output.contains("- logging.level = debug (source: env (CRM_LOG_LEVEL))"));
    });
}

#[test]
fn doctor_reports_unmigrated_memory_database() {
    with_env(MEMORY_DB, || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1, "fresh database has pending migrations");

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][0]["status"], "pass");
        assert_eq!(report["checks"][1]["name"], "database_connectivity");
        assert_eq!(report["checks"][1]["status"], "pass");
        assert_eq!(report["checks"][2]["name"], "schema_state");
        assert_eq!(report["checks"][2]["status"], "fail");
    });
}

#[test]
fn doctor_skips_database_checks_when_config_is_invalid() {
    with_env(&[("CRM_DATABASE_URL", "postgres://localhost/crm")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
        assert_eq!(report["checks"][2]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CRM_DATABASE_URL",
        "CRM_DATABASE_MAX_CONNECTIONS",
        "CRM_DATABASE_TIMEOUT_SECS",
        "CRM_SERVER_BIND_ADDRESS",
        "CRM_SERVER_PORT",
        "CRM_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CRM_LOGGING_LEVEL",
        "CRM_LOGGING_FORMAT",
        "CRM_LOG_LEVEL",
        "CRM_LOG_FORMAT",
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
