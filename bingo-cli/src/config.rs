use bingo_core::{BingoConfig, UserId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    /// User the command acts as (voter, default board owner).
    pub actor: Option<UserId>,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bingo"),
            database_file: BingoConfig::default().database_file,
            actor: None,
            verbose: false,
        }
    }
}

impl CliConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn core_config(&self) -> BingoConfig {
        BingoConfig::new(self.database_file.clone())
    }

    /// Filter directive for the tracing subscriber.
    pub fn log_filter(&self) -> String {
        let level = if self.verbose { "debug" } else { "info" };
        format!("bingo={0},bingo_engine={0},bingo_core={0}", level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_lives_in_data_dir() {
        let config = CliConfig {
            data_dir: PathBuf::from("/tmp/games"),
            database_file: "office.db".to_string(),
            ..CliConfig::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/games/office.db"));
        assert!(config.core_config().validate().is_ok());
    }

    #[test]
    fn verbose_switches_filter() {
        let mut config = CliConfig::default();
        assert_eq!(
            config.log_filter(),
            "bingo=info,bingo_engine=info,bingo_core=info"
        );
        config.verbose = true;
        assert!(config.log_filter().starts_with("bingo=debug"));
    }
}
