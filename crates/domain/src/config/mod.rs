mod errors;
mod logging;

pub use errors::ConfigError;
pub use logging::LoggingConfig;

use serde::{Deserialize, Serialize};

/// Runtime-tunable knobs for the demo CLI. The core's own constants
/// (cache size/TTL, private blocking mode name) are fixed per spec and are
/// not configurable here.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub logging: LoggingConfig,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_query_timeout_ms() -> u64 {
    5_000
}

impl Config {
    pub fn load(cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = Self {
            logging: LoggingConfig::default(),
            query_timeout_ms: default_query_timeout_ms(),
        };
        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(timeout) = overrides.query_timeout_ms {
            self.query_timeout_ms = timeout;
        }
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub query_timeout_ms: Option<u64>,
}
