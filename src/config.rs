use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

/// Default no-capture limit: 60 full moves per side.
pub const DEFAULT_MOVE_LIMIT_PLIES: usize = 120;
pub const DEFAULT_REPETITION_THRESHOLD: usize = 3;
pub const DEFAULT_PORT: u16 = 3000;

/// How a repeated position is attributed to perpetual check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerpetualCheckPolicy {
    /// Only a side that checked with every move of the repetition cycle loses.
    #[default]
    Precise,
    /// Every repetition counts as perpetual check and the side to move loses.
    Simplified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub move_limit_plies: usize,
    pub repetition_threshold: usize,
    pub perpetual_check: PerpetualCheckPolicy,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            move_limit_plies: DEFAULT_MOVE_LIMIT_PLIES,
            repetition_threshold: DEFAULT_REPETITION_THRESHOLD,
            perpetual_check: PerpetualCheckPolicy::Precise,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub rules: RulesConfig,
}

impl ServerConfig {
    /// Read `XIANGQI_ADDR`, `XIANGQI_MOVE_LIMIT`, `XIANGQI_REPETITIONS` and
    /// `XIANGQI_PERPETUAL` from the environment, defaulting any that are unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = RulesConfig::default();

        let addr = parse_var(&lookup, "XIANGQI_ADDR", default_addr(), |raw| {
            raw.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;
        let move_limit_plies = parse_var(
            &lookup,
            "XIANGQI_MOVE_LIMIT",
            defaults.move_limit_plies,
            parse_positive,
        )?;
        let repetition_threshold = parse_var(
            &lookup,
            "XIANGQI_REPETITIONS",
            defaults.repetition_threshold,
            parse_positive,
        )?;
        let perpetual_check = parse_var(
            &lookup,
            "XIANGQI_PERPETUAL",
            defaults.perpetual_check,
            |raw| match raw.to_lowercase().as_str() {
                "precise" => Ok(PerpetualCheckPolicy::Precise),
                "simplified" => Ok(PerpetualCheckPolicy::Simplified),
                _ => Err("expected \"precise\" or \"simplified\"".to_string()),
            },
        )?;

        Ok(ServerConfig {
            addr,
            rules: RulesConfig {
                move_limit_plies,
                repetition_threshold,
                perpetual_check,
            },
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: default_addr(),
            rules: RulesConfig::default(),
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
}

fn parse_var<T, F, P>(lookup: &F, var: &'static str, default: T, parse: P) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    P: Fn(&str) -> Result<T, String>,
{
    match lookup(var) {
        Some(raw) => parse(raw.trim()).map_err(|reason| ConfigError::InvalidValue {
            var,
            value: raw,
            reason,
        }),
        None => Ok(default),
    }
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
