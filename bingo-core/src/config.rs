use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BingoConfig {
    pub database_file: String,
    pub busy_timeout: Duration,
    /// Deadline for a single engine operation against storage.
    pub operation_timeout: Duration,
    /// Consecutive rejected random draws allowed per board before the
    /// distributor gives up.
    pub max_fill_attempts: usize,
}

impl Default for BingoConfig {
    fn default() -> Self {
        Self {
            database_file: "bingo.db".to_string(),
            busy_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(10),
            max_fill_attempts: 10_000,
        }
    }
}

impl BingoConfig {
    pub fn new(database_file: impl Into<String>) -> Self {
        Self {
            database_file: database_file.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            return Err(CoreError::config("Database file cannot be empty"));
        }

        if self.operation_timeout.is_zero() {
            return Err(CoreError::config(
                "Operation timeout must be greater than 0",
            ));
        }

        if self.max_fill_attempts == 0 {
            return Err(CoreError::config(
                "Max fill attempts must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BingoConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_limits() {
        let mut config = BingoConfig::new("games.db");
        config.max_fill_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = BingoConfig::new("games.db");
        config.operation_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        assert!(BingoConfig::new("  ").validate().is_err());
    }
}
