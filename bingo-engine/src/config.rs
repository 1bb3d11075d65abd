use bingo_core::BingoConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Deadline applied to every storage-backed engine call.
    pub operation_timeout: Duration,
    pub max_fill_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&BingoConfig::default())
    }
}

impl From<&BingoConfig> for EngineConfig {
    fn from(config: &BingoConfig) -> Self {
        Self {
            operation_timeout: config.operation_timeout,
            max_fill_attempts: config.max_fill_attempts,
        }
    }
}
