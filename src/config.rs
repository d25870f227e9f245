//! Run configuration.
//!
//! Loaded from TOML; every section is optional and falls back to the
//! defaults below.
//!
//! ```
//! use u_convoy::config::ConvoyConfig;
//!
//! let config = ConvoyConfig::from_toml_str(r#"
//!     [input]
//!     people = "data/participants.csv"
//!
//!     [policy]
//!     faction_band = 3
//!
//!     [solver]
//!     backend = "search"
//!     time_limit_seconds = 10
//! "#).unwrap();
//!
//! assert_eq!(config.policy.faction_band, 3);
//! assert_eq!(config.policy.max_minors_per_vehicle, 50);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConvoyConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub policy: Policy,
    pub solver: SolverSettings,
}

impl ConvoyConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        if self.input.delimiter.len() != 1 || !self.input.delimiter.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            )));
        }
        Ok(())
    }
}

/// Values given on the command line. Each `Some` replaces the value from
/// the file (or the default).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub people: Option<PathBuf>,
    pub teams: Option<PathBuf>,
    pub vehicles: Option<PathBuf>,
    pub encoding: Option<InputEncoding>,
    pub output: Option<PathBuf>,
    pub model_dump: Option<PathBuf>,
    pub faction_band: Option<i64>,
    pub max_minors: Option<u32>,
    pub min_certified: Option<u32>,
    pub backend: Option<Backend>,
}

impl ConvoyConfig {
    /// Applies `overrides` and validates the result.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let ConfigOverrides {
            people,
            teams,
            vehicles,
            encoding,
            output,
            model_dump,
            faction_band,
            max_minors,
            min_certified,
            backend,
        } = overrides;

        if let Some(p) = people {
            self.input.people = p;
        }
        if let Some(p) = teams {
            self.input.teams = p;
        }
        if let Some(p) = vehicles {
            self.input.vehicles = p;
        }
        if let Some(e) = encoding {
            self.input.encoding = e;
        }
        if let Some(dir) = output {
            self.output.directory = dir;
        }
        if let Some(p) = model_dump {
            self.output.model_dump = Some(p);
        }
        if let Some(k) = faction_band {
            self.policy.faction_band = k;
        }
        if let Some(n) = max_minors {
            self.policy.max_minors_per_vehicle = n;
        }
        if let Some(n) = min_certified {
            self.policy.min_certified_per_vehicle = n;
        }
        if let Some(b) = backend {
            self.solver.backend = b;
        }

        self.validate()?;
        Ok(self)
    }
}

/// Input file locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub people: PathBuf,
    pub teams: PathBuf,
    pub vehicles: PathBuf,
    /// Field delimiter shared by all input and output files.
    pub delimiter: String,
    /// Character encoding of the three input files.
    pub encoding: InputEncoding,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            people: PathBuf::from("data/participants.csv"),
            teams: PathBuf::from("data/teams.csv"),
            vehicles: PathBuf::from("data/vehicles.csv"),
            delimiter: ";".to_string(),
            encoding: InputEncoding::default(),
        }
    }
}

impl InputConfig {
    /// Delimiter as a byte. Assumes `validate` passed.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b';')
    }
}

/// Character encoding of the input files.
///
/// Spreadsheet exports on Windows are usually `windows-1252`. A UTF-8
/// byte-order mark takes precedence over the declared encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
pub enum InputEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    #[value(name = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "windows-1252", alias = "cp1252")]
    #[value(name = "windows-1252", alias = "cp1252")]
    Windows1252,
}

/// Output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the person export, vehicle summary and manifests.
    pub directory: PathBuf,
    /// Optional path for an LP-format dump of the assignment model.
    pub model_dump: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            model_dump: None,
        }
    }
}

/// Policy thresholds applied per vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Policy {
    /// Signed faction sum must lie in `[-faction_band, faction_band]`.
    pub faction_band: i64,
    /// Upper bound on minors from placed teams.
    pub max_minors_per_vehicle: u32,
    /// Lower bound on certified members from placed teams.
    pub min_certified_per_vehicle: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            faction_band: 2,
            max_minors_per_vehicle: 50,
            min_certified_per_vehicle: 1,
        }
    }
}

impl Policy {
    pub fn with_faction_band(mut self, band: i64) -> Self {
        self.faction_band = band;
        self
    }

    pub fn with_max_minors(mut self, max: u32) -> Self {
        self.max_minors_per_vehicle = max;
        self
    }

    pub fn with_min_certified(mut self, min: u32) -> Self {
        self.min_certified_per_vehicle = min;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.faction_band < 0 {
            return Err(ConfigError::Invalid(format!(
                "faction_band must be non-negative, got {}",
                self.faction_band
            )));
        }
        Ok(())
    }
}

/// Solver backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Mixed-integer programming via `good_lp`.
    #[default]
    Milp,
    /// Built-in depth-first search.
    Search,
}

/// Solver adapter settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverSettings {
    pub backend: Backend,
    /// Wall-clock limit for the search backend.
    pub time_limit_seconds: Option<u64>,
    /// Node limit for the search backend.
    pub node_limit: Option<u64>,
}

impl SolverSettings {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds.map(Duration::from_secs)
    }
}
