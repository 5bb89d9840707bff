use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

pub const HARD_MAX_PROJECTION_YEARS: u32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub max_projection_years: u32,
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
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            max_projection_years: HARD_MAX_PROJECTION_YEARS,
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

        let bind_addr = env_map
            .get("BIND_ADDR")
            .map(|s| s.as_str())
            .unwrap_or("0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IPv4 or IPv6 address".to_string(),
                )
            })?;

        let max_projection_years = env_map
            .get("MAX_PROJECTION_YEARS")
            .map(|s| s.as_str())
            .unwrap_or("50")
            .parse::<u32>()
            .ok()
            .filter(|years| (1..=HARD_MAX_PROJECTION_YEARS).contains(years))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MAX_PROJECTION_YEARS".to_string(),
                    format!("must be between 1 and {}", HARD_MAX_PROJECTION_YEARS),
                )
            })?;

        Ok(Config {
            port,
            bind_addr,
            max_projection_years,
        })
    }
}
