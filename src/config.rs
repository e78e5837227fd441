//! # Configuration Module
//!
//! Handles loading and validating the bridge configuration from TOML files.
//!
//! Encoder sections are arrays of tables, one table per encoder instance:
//!
//! ```toml
//! [[fluid_level]]
//! tank_instance = 0
//! tank_type = "Fuel"
//! tank_capacity = 200.0
//! ```
//!
//! Their keys are handed to the encoders as configuration maps, so the
//! encoders' own validation applies to file and runtime configuration alike.

use serde::de::Error;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::encoders::ConfigMap;
use crate::error::{N2kBridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub rapid: Vec<EngineSection>,

    #[serde(default)]
    pub dynamic: Vec<EngineSection>,

    #[serde(default)]
    pub fluid_level: Vec<FluidLevelSection>,

    #[serde(default)]
    pub temperature: Vec<TemperatureSection>,
}

/// Run loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// How often due encoder ticks are checked
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How often throughput is logged
    #[serde(default = "default_stats_interval_s")]
    pub stats_interval_s: u64,
}

/// Where messages go
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Log every message through `tracing`
    Log,
    /// Append every message to a JSON Lines file
    Jsonl,
}

/// Transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_transport_kind")]
    pub kind: TransportKind,

    /// Capture file, required for `jsonl`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Also write a daily rolling log file into this directory
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

/// Sensor input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Read `<path> <value>` lines from standard input
    #[serde(default = "default_enabled")]
    pub stdin: bool,

    /// Drop numeric readings arriving faster than this (0 disables)
    #[serde(default)]
    pub min_delay_ms: u64,
}

/// `[[rapid]]` and `[[dynamic]]` entries
#[derive(Debug, Deserialize, Clone)]
pub struct EngineSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub engine_instance: u8,
}

/// `[[fluid_level]]` entries
#[derive(Debug, Deserialize, Clone)]
pub struct FluidLevelSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub tank_instance: u8,

    pub tank_type: String,

    /// liters
    pub tank_capacity: f64,
}

/// `[[temperature]]` entries
#[derive(Debug, Deserialize, Clone)]
pub struct TemperatureSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub temperature_instance: u8,

    pub temperature_source: String,
}

// Default value functions
fn default_poll_interval_ms() -> u64 { 10 }
fn default_stats_interval_s() -> u64 { 60 }

fn default_transport_kind() -> TransportKind { TransportKind::Log }

fn default_log_file_prefix() -> String { "n2k-bridge.log".to_string() }

fn default_enabled() -> bool { true }

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            stats_interval_s: default_stats_interval_s(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: default_transport_kind(),
            path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            stdin: default_enabled(),
            min_delay_ms: 0,
        }
    }
}

impl EngineSection {
    /// Encoder configuration map
    pub fn settings(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert("engine_instance".into(), json!(self.engine_instance));
        map
    }
}

impl FluidLevelSection {
    /// Encoder configuration map
    pub fn settings(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert("tank_instance".into(), json!(self.tank_instance));
        map.insert("tank_type".into(), json!(self.tank_type));
        map.insert("tank_capacity".into(), json!(self.tank_capacity));
        map
    }
}

impl TemperatureSection {
    /// Encoder configuration map
    pub fn settings(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert("temperature_instance".into(), json!(self.temperature_instance));
        map.insert("temperature_source".into(), json!(self.temperature_source));
        map
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use n2k_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml").unwrap();
    /// println!("Polling every {} ms", config.runner.poll_interval_ms);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing or validation fails
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of encoder sections with `enabled = true`
    pub fn enabled_encoders(&self) -> usize {
        self.rapid.iter().filter(|s| s.enabled).count()
            + self.dynamic.iter().filter(|s| s.enabled).count()
            + self.fluid_level.iter().filter(|s| s.enabled).count()
            + self.temperature.iter().filter(|s| s.enabled).count()
    }

    /// Validate configuration values
    ///
    /// Encoder keys are checked when they are applied to the encoders.
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.runner.poll_interval_ms == 0 || self.runner.poll_interval_ms > 100 {
            return Err(invalid("poll_interval_ms must be between 1 and 100"));
        }

        if self.runner.stats_interval_s == 0 || self.runner.stats_interval_s > 3600 {
            return Err(invalid("stats_interval_s must be between 1 and 3600"));
        }

        if self.transport.kind == TransportKind::Jsonl
            && self.transport.path.as_ref().map_or(true, |p| p.as_os_str().is_empty())
        {
            return Err(invalid("transport path is required for kind = \"jsonl\""));
        }

        if let Some(directory) = &self.logging.directory {
            if directory.as_os_str().is_empty() {
                return Err(invalid("logging directory cannot be empty"));
            }
            if self.logging.file_prefix.is_empty() {
                return Err(invalid("logging file_prefix cannot be empty"));
            }
        }

        if self.input.min_delay_ms > 60_000 {
            return Err(invalid("input min_delay_ms must be at most 60000"));
        }

        if self.enabled_encoders() == 0 {
            return Err(invalid("at least one encoder section must be enabled"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> N2kBridgeError {
    N2kBridgeError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[runner]
poll_interval_ms = 5
stats_interval_s = 30

[transport]
kind = "jsonl"
path = "/tmp/capture.jsonl"

[logging]
directory = "/var/log/n2k"

[input]
stdin = false
min_delay_ms = 250

[[rapid]]
engine_instance = 0

[[dynamic]]
engine_instance = 0
enabled = false

[[fluid_level]]
tank_instance = 1
tank_type = "Fuel"
tank_capacity = 200.0

[[fluid_level]]
tank_instance = 2
tank_type = "Water"
tank_capacity = 120

[[temperature]]
temperature_instance = 0
temperature_source = "Engine Room Temperature"
"#;

    fn create_valid_config() -> Config {
        Config {
            runner: RunnerConfig::default(),
            transport: TransportConfig::default(),
            logging: LoggingConfig::default(),
            input: InputConfig::default(),
            rapid: vec![EngineSection {
                enabled: true,
                engine_instance: 0,
            }],
            dynamic: Vec::new(),
            fluid_level: Vec::new(),
            temperature: Vec::new(),
        }
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(FULL).unwrap();

        assert_eq!(config.runner.poll_interval_ms, 5);
        assert_eq!(config.runner.stats_interval_s, 30);
        assert_eq!(config.transport.kind, TransportKind::Jsonl);
        assert_eq!(config.transport.path, Some(PathBuf::from("/tmp/capture.jsonl")));
        assert_eq!(config.logging.directory, Some(PathBuf::from("/var/log/n2k")));
        assert_eq!(config.logging.file_prefix, "n2k-bridge.log");
        assert!(!config.input.stdin);
        assert_eq!(config.input.min_delay_ms, 250);
        assert_eq!(config.rapid.len(), 1);
        assert!(!config.dynamic[0].enabled);
        assert_eq!(config.fluid_level.len(), 2);
        assert_eq!(config.fluid_level[1].tank_capacity, 120.0);
        assert_eq!(config.enabled_encoders(), 4);
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_toml("[[rapid]]\nengine_instance = 1\n").unwrap();

        assert_eq!(config.runner.poll_interval_ms, default_poll_interval_ms());
        assert_eq!(config.runner.stats_interval_s, default_stats_interval_s());
        assert_eq!(config.transport.kind, TransportKind::Log);
        assert!(config.logging.directory.is_none());
        assert!(config.input.stdin);
        assert_eq!(config.input.min_delay_ms, 0);
        assert!(config.rapid[0].enabled);
    }

    #[test]
    fn test_section_settings_maps() {
        let config = Config::from_toml(FULL).unwrap();

        let tank = config.fluid_level[0].settings();
        assert_eq!(tank["tank_instance"], 1);
        assert_eq!(tank["tank_type"], "Fuel");
        assert_eq!(tank["tank_capacity"], 200.0);

        let temperature = config.temperature[0].settings();
        assert_eq!(temperature["temperature_source"], "Engine Room Temperature");

        assert_eq!(config.rapid[0].settings()["engine_instance"], 0);
    }

    #[test]
    fn test_unknown_transport_kind_fails_to_parse() {
        let result = Config::from_toml("[transport]\nkind = \"can\"\n[[rapid]]\nengine_instance = 0\n");
        assert!(matches!(result, Err(N2kBridgeError::Config(_))));
    }

    #[test]
    fn test_engine_instance_out_of_range_fails_to_parse() {
        assert!(Config::from_toml("[[rapid]]\nengine_instance = 256\n").is_err());
    }

    #[test]
    fn test_missing_tank_type_fails_to_parse() {
        let result = Config::from_toml("[[fluid_level]]\ntank_instance = 0\ntank_capacity = 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_valid_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_poll_interval_zero() {
        let mut config = create_valid_config();
        config.runner.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_too_high() {
        let mut config = create_valid_config();
        config.runner.poll_interval_ms = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_bounds_valid() {
        for &ms in &[1, 10, 100] {
            let mut config = create_valid_config();
            config.runner.poll_interval_ms = ms;
            assert!(config.validate().is_ok(), "Poll interval {} should be valid", ms);
        }
    }

    #[test]
    fn test_stats_interval_zero() {
        let mut config = create_valid_config();
        config.runner.stats_interval_s = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_jsonl_requires_path() {
        let mut config = create_valid_config();
        config.transport.kind = TransportKind::Jsonl;
        assert!(config.validate().is_err());

        config.transport.path = Some(PathBuf::new());
        assert!(config.validate().is_err());

        config.transport.path = Some(PathBuf::from("capture.jsonl"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_log_directory() {
        let mut config = create_valid_config();
        config.logging.directory = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_delay_too_high() {
        let mut config = create_valid_config();
        config.input.min_delay_ms = 60_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_enabled_encoder() {
        let mut config = create_valid_config();
        config.rapid[0].enabled = false;
        assert!(config.validate().is_err());

        config.rapid.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.enabled_encoders(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/n2k-bridge.toml");
        assert!(matches!(result, Err(N2kBridgeError::Io(_))));
    }

    #[test]
    fn test_default_config_file_is_valid() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml")).unwrap();
        assert!(config.enabled_encoders() > 0);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_poll_interval_ms(), 10);
        assert_eq!(default_stats_interval_s(), 60);
        assert_eq!(default_transport_kind(), TransportKind::Log);
        assert_eq!(default_log_file_prefix(), "n2k-bridge.log");
        assert!(default_enabled());
    }
}
