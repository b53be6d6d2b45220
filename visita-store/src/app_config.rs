use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

/// Tenant-tunable booking behavior. File/env values are the defaults;
/// rows in the `business_rules` table override them at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Per-transaction Postgres lock_timeout for slot admissions.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Whether admission also takes a hold on time-overlapping slots of
    /// the same resource and date; release hands the recorded holds back.
    #[serde(default = "default_overlap_release")]
    pub overlap_release: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_lock_timeout_ms() -> u64 {
    3000
}

fn default_overlap_release() -> bool {
    true
}

fn default_currency() -> String {
    "PKR".to_string()
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            overlap_release: default_overlap_release(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of VISITA)
            // Eg.. `VISITA_SERVER__PORT=8080` would set `server.port`
            .add_source(config::Environment::with_prefix("VISITA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
