use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{bail, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_event_interval")]
    pub event_interval_secs: u64,
    #[serde(default = "default_drift_interval")]
    pub drift_interval_secs: u64,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_seed_events")]
    pub seed_events: usize,
    /// Fixed RNG seed for reproducible runs; entropy when unset.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            event_interval_secs: default_event_interval(),
            drift_interval_secs: default_drift_interval(),
            max_events: default_max_events(),
            seed_events: default_seed_events(),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
            token_secret: default_token_secret(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

/// Longest token lifetime the agent accepts: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

fn default_bind_addr() -> String { "127.0.0.1:8080".to_string() }
fn default_page_size() -> usize { 20 }
fn default_event_interval() -> u64 { 5 }
fn default_drift_interval() -> u64 { 10 }
fn default_max_events() -> usize { 100 }
fn default_seed_events() -> usize { 20 }
fn default_username() -> String { "admin".to_string() }
fn default_password() -> String { "sentinel".to_string() }
fn default_token_secret() -> String { "sentinel-demo-secret".to_string() }
fn default_token_ttl() -> u64 { 3600 }

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn default_path() -> String {
        std::env::var("SENTINEL_CONFIG")
            .unwrap_or_else(|_| "./config/default.toml".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulator;
        if sim.event_interval_secs == 0 || sim.drift_interval_secs == 0 {
            bail!("simulator intervals must be at least one second");
        }
        if sim.event_interval_secs >= sim.drift_interval_secs {
            bail!(
                "event interval ({}s) must be shorter than drift interval ({}s)",
                sim.event_interval_secs,
                sim.drift_interval_secs
            );
        }
        if sim.max_events == 0 {
            bail!("simulator.max_events must be positive");
        }
        if self.agent.default_page_size == 0 {
            bail!("agent.default_page_size must be positive");
        }
        if self.auth.token_ttl_secs == 0 {
            bail!("auth.token_ttl_secs must be positive");
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "auth.token_ttl_secs ({}) exceeds the one-year limit of {}",
                self.auth.token_ttl_secs,
                MAX_TOKEN_TTL_SECS
            );
        }
        Ok(())
    }
}
