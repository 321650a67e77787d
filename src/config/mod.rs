//! Configuration for game rules, the advisor and logging

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::tile::DEFAULT_TILE_SIZE_M;

/// Top-level configuration, loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_random_seed() -> u64 {
    7
}

/// Timings and amounts driving capture, reinforcement and decay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_tile_size_m")]
    pub tile_size_m: f64,
    #[serde(default = "default_discovery_radius")]
    pub discovery_radius: u32,
    #[serde(default = "default_capture_duration_ms")]
    pub capture_duration_ms: u64,
    #[serde(default = "default_capture_reward")]
    pub capture_reward: u64,
    #[serde(default = "default_reinforce_interval_ms")]
    pub reinforce_interval_ms: u64,
    #[serde(default = "default_reinforce_amount")]
    pub reinforce_amount: f64,
    /// 0 settles decay on every tick.
    #[serde(default = "default_decay_interval_ms")]
    pub decay_interval_ms: u64,
    #[serde(default = "default_decay_rate_per_minute")]
    pub decay_rate_per_minute: f64,
}

fn default_tile_size_m() -> f64 {
    DEFAULT_TILE_SIZE_M
}

fn default_discovery_radius() -> u32 {
    5
}

fn default_capture_duration_ms() -> u64 {
    3_000
}

fn default_capture_reward() -> u64 {
    10
}

fn default_reinforce_interval_ms() -> u64 {
    2_000
}

fn default_reinforce_amount() -> f64 {
    5.0
}

fn default_decay_interval_ms() -> u64 {
    10_000
}

fn default_decay_rate_per_minute() -> f64 {
    2.0
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            tile_size_m: default_tile_size_m(),
            discovery_radius: default_discovery_radius(),
            capture_duration_ms: default_capture_duration_ms(),
            capture_reward: default_capture_reward(),
            reinforce_interval_ms: default_reinforce_interval_ms(),
            reinforce_amount: default_reinforce_amount(),
            decay_interval_ms: default_decay_interval_ms(),
            decay_rate_per_minute: default_decay_rate_per_minute(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_advisor_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_mission_refresh_ms")]
    pub mission_refresh_ms: u64,
    #[serde(default = "default_commentary_refresh_ms")]
    pub commentary_refresh_ms: u64,
    #[serde(default = "default_mission_nearby")]
    pub mission_nearby_zones: usize,
    #[serde(default = "default_commentary_nearby")]
    pub commentary_nearby_zones: usize,
}

fn default_advisor_timeout_ms() -> u64 {
    8_000
}

fn default_mission_refresh_ms() -> u64 {
    30_000
}

fn default_commentary_refresh_ms() -> u64 {
    20_000
}

fn default_mission_nearby() -> usize {
    10
}

fn default_commentary_nearby() -> usize {
    8
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_advisor_timeout_ms(),
            mission_refresh_ms: default_mission_refresh_ms(),
            commentary_refresh_ms: default_commentary_refresh_ms(),
            mission_nearby_zones: default_mission_nearby(),
            commentary_nearby_zones: default_commentary_nearby(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            random_seed: default_random_seed(),
            rules: RuleConfig::default(),
            advisor: AdvisorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        ensure!(self.advisor.timeout_ms > 0, "advisor.timeout_ms must be positive");
        Ok(())
    }
}

impl RuleConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tile_size_m.is_finite() && self.tile_size_m > 0.0,
            "rules.tile_size_m must be positive, got {}",
            self.tile_size_m
        );
        ensure!(
            self.capture_duration_ms > 0,
            "rules.capture_duration_ms must be positive"
        );
        ensure!(
            self.reinforce_interval_ms > 0,
            "rules.reinforce_interval_ms must be positive"
        );
        ensure!(
            self.reinforce_amount >= 0.0,
            "rules.reinforce_amount must not be negative"
        );
        ensure!(
            self.decay_rate_per_minute.is_finite() && self.decay_rate_per_minute >= 0.0,
            "rules.decay_rate_per_minute must not be negative"
        );
        Ok(())
    }
}
