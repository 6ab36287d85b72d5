use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::MAX_STEPS;
use crate::engine::DEFAULT_SCENARIOS;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub sim_steps: usize,
    pub playback_base_interval_ms: u64,
    pub compute_timeout_ms: u64,
    pub price_path_scenarios: Vec<f64>,
    pub user_starting_balance: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            sim_steps: 300,
            playback_base_interval_ms: 500,
            compute_timeout_ms: 30_000,
            price_path_scenarios: DEFAULT_SCENARIOS.to_vec(),
            user_starting_balance: 10_000.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let sim_steps = env_map
            .get("SIM_STEPS")
            .map(|s| s.as_str())
            .unwrap_or("300")
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=MAX_STEPS).contains(n))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SIM_STEPS".to_string(),
                    format!("must be an integer in [1, {}]", MAX_STEPS),
                )
            })?;

        let playback_base_interval_ms = parse_millis(&env_map, "PLAYBACK_BASE_INTERVAL_MS", "500")?;
        let compute_timeout_ms = parse_millis(&env_map, "COMPUTE_TIMEOUT_MS", "30000")?;

        let price_path_scenarios = match env_map.get("PRICE_PATH_SCENARIOS") {
            Some(raw) => parse_scenarios(raw)?,
            None => DEFAULT_SCENARIOS.to_vec(),
        };

        let user_starting_balance = env_map
            .get("USER_STARTING_BALANCE")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<f64>()
            .ok()
            .filter(|b| b.is_finite() && *b >= 0.0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "USER_STARTING_BALANCE".to_string(),
                    "must be a non-negative number".to_string(),
                )
            })?;

        Ok(Config {
            port,
            sim_steps,
            playback_base_interval_ms,
            compute_timeout_ms,
            price_path_scenarios,
            user_starting_balance,
        })
    }

    pub fn playback_base_interval(&self) -> Duration {
        Duration::from_millis(self.playback_base_interval_ms)
    }

    pub fn compute_timeout(&self) -> Duration {
        Duration::from_millis(self.compute_timeout_ms)
    }
}

fn parse_millis(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<u64, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .ok_or_else(|| {
            ConfigError::InvalidValue(key.to_string(), "must be a positive integer (ms)".to_string())
        })
}

fn parse_scenarios(raw: &str) -> Result<Vec<f64>, ConfigError> {
    let scenarios = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|m| m.is_finite() && *m >= 0.0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "PRICE_PATH_SCENARIOS".to_string(),
                        format!("{} is not a non-negative number", s),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if scenarios.is_empty() {
        return Err(ConfigError::InvalidValue(
            "PRICE_PATH_SCENARIOS".to_string(),
            "must list at least one multiplier".to_string(),
        ));
    }
    Ok(scenarios)
}
