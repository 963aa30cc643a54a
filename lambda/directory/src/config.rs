use std::env;
use thiserror::Error;

const DIR_TABLE: &str = "DIR_TABLE";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("DIR_TABLE is required and must not be empty")]
    MissingTable,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) table_name: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_table_name(env::var(DIR_TABLE).ok())
    }

    fn from_table_name(value: Option<String>) -> Result<Self, ConfigError> {
        let table_name = value
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingTable)?;

        Ok(Self { table_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_is_trimmed() {
        let config = Config::from_table_name(Some("  StudyBuddyDir-dev ".to_string()))
            .expect("config should parse");
        assert_eq!(config.table_name, "StudyBuddyDir-dev");
    }

    #[test]
    fn missing_table_fails() {
        let err = Config::from_table_name(None).expect_err("expected missing table error");
        assert!(matches!(err, ConfigError::MissingTable));
    }

    #[test]
    fn blank_table_fails() {
        let err = Config::from_table_name(Some("   ".to_string()))
            .expect_err("expected missing table error");
        assert!(err.to_string().contains("DIR_TABLE"));
    }
}
