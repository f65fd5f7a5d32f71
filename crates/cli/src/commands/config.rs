use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crm_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct ConfigFile {
    path: PathBuf,
    doc: Value,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file = resolve_config_path(None).and_then(|path| load_config_file(&path));

    let fields: [(&str, &[&str], String); 8] = [
        ("database.url", &["CRM_DATABASE_URL"], config.database.url.clone()),
        (
            "database.max_connections",
            &["CRM_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            &["CRM_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        ("server.bind_address", &["CRM_SERVER_BIND_ADDRESS"], config.server.bind_address.clone()),
        ("server.port", &["CRM_SERVER_PORT"], config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["CRM_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        ("logging.level", &["CRM_LOGGING_LEVEL", "CRM_LOG_LEVEL"], config.logging.level.clone()),
        (
            "logging.format",
            &["CRM_LOGGING_FORMAT", "CRM_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        format!(
            "- config file: {}",
            file.as_ref()
                .map(|file| file.path.display().to_string())
                .unwrap_or_else(|| "<none>".to_string())
        ),
    ];
    for (key_path, env_keys, value) in &fields {
        let source = field_source(key_path, env_keys, file.as_ref());
        lines.push(format!("- {key_path} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn load_config_file(path: &Path) -> Option<ConfigFile> {
    let raw = fs::read_to_string(path).ok()?;
    let doc = raw.parse::<Value>().ok()?;
    Some(ConfigFile { path: path.to_path_buf(), doc })
}

fn field_source(key_path: &str, env_keys: &[&str], file: Option<&ConfigFile>) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    match file {
        Some(file) if contains_path(&file.doc, key_path) => {
            format!("file ({})", file.path.display())
        }
        _ => "default".to_string(),
    }
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

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use toml::Value;

    use super::{contains_path, field_source, ConfigFile};

    fn file(raw: &str) -> ConfigFile {
        ConfigFile { path: PathBuf::from("crm.toml"), doc: raw.parse::<Value>().expect("toml") }
    }

    #[test]
    fn contains_path_walks_nested_tables() {
        let doc = file("[server]\nport = 9000\n").doc;

        assert!(contains_path(&doc, "server.port"));
        assert!(!contains_path(&doc, "server.bind_address"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn file_source_is_reported_when_key_present_and_env_unset() {
        let file = file("[server]\nport = 9000\n");

        assert_eq!(
            field_source("server.port", &["CRM_TEST_UNSET_SERVER_PORT"], Some(&file)),
            "file (crm.toml)"
        );
        assert_eq!(
            field_source("server.bind_address", &["CRM_TEST_UNSET_BIND"], Some(&file)),
            "default"
        );
        assert_eq!(field_source("server.port", &[], None), "default");
    }
}
