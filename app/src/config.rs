//! Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_engine::{protocol_for, ChainParams, LATEST_VERSION};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(String),

    #[error("malformed config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Everything the application needs at construction.
///
/// Chain parameters are flattened to the top level, so a config file reads
/// `{"max_validators": 50, "block_reward": "100", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub chain: ChainParams,

    /// Protocol version the chain starts with.
    pub genesis_protocol_version: u32,

    /// Height whose BeginBlock switches to `upgrade_protocol_version`.
    /// 0 disables the upgrade.
    pub upgrade_protocol_height: u64,

    pub upgrade_protocol_version: u32,

    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainParams::default(),
            genesis_protocol_version: LATEST_VERSION,
            upgrade_protocol_height: 0,
            upgrade_protocol_version: LATEST_VERSION,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json(&bytes)
    }

    /// Reject parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chain = &self.chain;
        if chain.minimum_staking_unit.is_zero() {
            return Err(invalid("minimum_staking_unit must be positive"));
        }
        if chain.max_validators == 0 {
            return Err(invalid("max_validators must be positive"));
        }
        if chain.weight_validator == 0 && chain.weight_delegator == 0 {
            return Err(invalid("distribution weights cannot both be zero"));
        }
        for (name, ratio) in [
            ("penalty_ratio_m", chain.penalty_ratio_m),
            ("penalty_ratio_l", chain.penalty_ratio_l),
            ("laziness_threshold", chain.laziness_threshold),
        ] {
            if !ratio.is_valid_fraction() {
                return Err(invalid(&format!("{name} must be a fraction in [0, 1]")));
            }
        }
        if chain.block_binding_window == 0 {
            return Err(invalid("block_binding_window must be positive"));
        }
        if protocol_for(self.genesis_protocol_version).is_none() {
            return Err(invalid(&format!(
                "unknown genesis protocol version {}",
                self.genesis_protocol_version
            )));
        }
        if self.upgrade_protocol_height > 0 {
            if protocol_for(self.upgrade_protocol_version).is_none() {
                return Err(invalid(&format!(
                    "unknown upgrade protocol version {}",
                    self.upgrade_protocol_version
                )));
            }
            if self.upgrade_protocol_version <= self.genesis_protocol_version {
                return Err(invalid("upgrade_protocol_version must be newer than the genesis version"));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}
