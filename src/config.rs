use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CustodyConfig {
    /// Directory of the sled database
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// sled tree holding device records and the index
    #[serde(default = "default_ledger_tree")]
    pub ledger_tree: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_db_path() -> String {
    "custody.db".to_string()
}

fn default_ledger_tree() -> String {
    "custody".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CustodyConfig {
    /// Read `CUSTODY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix("CUSTODY"))
    }

    pub fn from_source(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ledger_tree: default_ledger_tree(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let mut source = config::Map::new();
        for (key, value) in vars {
            source.insert(key.to_string(), value.to_string());
        }
        Environment::with_prefix("CUSTODY").source(Some(source))
    }

    #[test]
    fn test_default_config() {
        let config = CustodyConfig::from_source(environment(&[])).unwrap();
        assert_eq!(config, CustodyConfig::default());
        assert_eq!(config.db_path, "custody.db");
        assert_eq!(config.ledger_tree, "custody");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_custom_config() {
        let config = CustodyConfig::from_source(environment(&[
            ("CUSTODY_DB_PATH", "/var/lib/custody"),
            ("CUSTODY_LEDGER_TREE", "devices"),
            ("CUSTODY_LOG_LEVEL", "debug"),
            ("OTHER_LOG_LEVEL", "trace"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "/var/lib/custody");
        assert_eq!(config.ledger_tree, "devices");
        assert_eq!(config.log_level, "debug");
    }
}
