//! # Tickbus Configuration
//!
//! Loads the three tick settings once at startup.
//!
//! ## Hierarchy (lowest to highest)
//! 1. Built-in defaults
//! 2. Optional `.env` file
//! 3. Process environment (`SEND_INTERVAL`, `READ_INTERVAL`, `TIMEOUT`)
//! 4. Explicit [`Overrides`] (command-line flags)
//!
//! Every setting is extracted and validated on its own. A missing, unparsable or
//! out-of-range value never fails the load: it is replaced by the default and
//! reported as a [`ConfigError`] in [`ConfigLoad::warnings`].

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Serialized},
    value::{Dict, Value},
    Figment,
};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

mod error;

pub use error::ConfigError;

pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_READ_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Env file consulted when no explicit path is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

const SEND_INTERVAL_VAR: &str = "SEND_INTERVAL";
const READ_INTERVAL_VAR: &str = "READ_INTERVAL";
const TIMEOUT_VAR: &str = "TIMEOUT";
const KNOWN_VARS: [&str; 3] = [SEND_INTERVAL_VAR, READ_INTERVAL_VAR, TIMEOUT_VAR];

/// Validated, immutable run settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickbusConfig {
    /// Producer tick period.
    pub send_interval: Duration,
    /// Consumer tick period.
    pub read_interval: Duration,
    /// Total run duration.
    pub timeout: Duration,
}

impl Default for TickbusConfig {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_secs(DEFAULT_SEND_INTERVAL_SECS),
            read_interval: Duration::from_secs(DEFAULT_READ_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Highest-priority values, typically taken from command-line flags.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
}

/// Result of a load: the corrected config plus everything that was corrected.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: TickbusConfig,
    pub warnings: Vec<ConfigError>,
}

impl ConfigLoad {
    /// Logs every recovered problem, then the effective settings.
    pub fn log(&self) {
        for warning in &self.warnings {
            warn!("{warning}");
        }
        info!(
            send_interval = ?self.config.send_interval,
            read_interval = ?self.config.read_interval,
            timeout = ?self.config.timeout,
            "configuration loaded"
        );
    }
}

/// Largest accepted value for any setting, in seconds.
pub const MAX_SECS: i64 = u32::MAX as i64;

/// Settings as read, before range correction.
#[derive(Debug, Validate)]
struct RawSettings {
    #[validate(range(min = 1, max = MAX_SECS, message = "must be > 0 and <= 4294967295"))]
    send_interval: i64,
    #[validate(range(min = 1, max = MAX_SECS, message = "must be > 0 and <= 4294967295"))]
    read_interval: i64,
    #[validate(range(min = 0, max = MAX_SECS, message = "must be >= 0 and <= 4294967295"))]
    timeout: i64,
}

/// Builder for a configuration load.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    env_file: Option<PathBuf>,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn load(&self) -> ConfigLoad {
        let mut warnings = Vec::new();

        let env_path = self
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
        let env_file = read_env_file(&env_path).unwrap_or_else(|err| {
            warnings.push(err);
            Dict::new()
        });

        let figment = Figment::new()
            .merge(Serialized::defaults(env_file))
            .merge(Env::raw().only(&KNOWN_VARS))
            .merge(Serialized::defaults(&self.overrides));

        let mut raw = RawSettings {
            send_interval: extract(
                &figment,
                SEND_INTERVAL_VAR,
                DEFAULT_SEND_INTERVAL_SECS,
                true,
                &mut warnings,
            ),
            read_interval: extract(
                &figment,
                READ_INTERVAL_VAR,
                DEFAULT_READ_INTERVAL_SECS,
                false,
                &mut warnings,
            ),
            timeout: extract(
                &figment,
                TIMEOUT_VAR,
                DEFAULT_TIMEOUT_SECS,
                false,
                &mut warnings,
            ),
        };

        if let Err(errors) = raw.validate() {
            for (field, field_errors) in errors.field_errors() {
                let (var, slot, default) = match &*field {
                    "send_interval" => (
                        SEND_INTERVAL_VAR,
                        &mut raw.send_interval,
                        DEFAULT_SEND_INTERVAL_SECS,
                    ),
                    "read_interval" => (
                        READ_INTERVAL_VAR,
                        &mut raw.read_interval,
                        DEFAULT_READ_INTERVAL_SECS,
                    ),
                    "timeout" => (TIMEOUT_VAR, &mut raw.timeout, DEFAULT_TIMEOUT_SECS),
                    _ => continue,
                };
                warnings.push(ConfigError::Validation {
                    var,
                    value: *slot,
                    default,
                    errors: field_errors.clone(),
                });
                *slot = default as i64;
            }
        }

        ConfigLoad {
            config: TickbusConfig {
                send_interval: secs(raw.send_interval),
                read_interval: secs(raw.read_interval),
                timeout: secs(raw.timeout),
            },
            warnings,
        }
    }
}

/// Reads the known variables from an env file without touching the process
/// environment.
fn read_env_file(path: &Path) -> Result<Dict, ConfigError> {
    let entries = dotenvy::from_path_iter(path).map_err(|err| env_file_error(path, err))?;

    let mut dict = Dict::new();
    for entry in entries {
        let (key, value) = entry.map_err(|err| env_file_error(path, err))?;
        if !KNOWN_VARS.contains(&key.as_str()) {
            continue;
        }
        let value = match value.trim().parse::<i64>() {
            Ok(number) => Value::from(number),
            Err(_) => Value::from(value),
        };
        dict.insert(key.to_lowercase(), value);
    }
    Ok(dict)
}

fn env_file_error(path: &Path, err: dotenvy::Error) -> ConfigError {
    match err {
        dotenvy::Error::Io(source) => ConfigError::EnvFileUnavailable {
            path: path.to_path_buf(),
            source,
        },
        source => ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        },
    }
}

fn extract(
    figment: &Figment,
    var: &'static str,
    default: u64,
    warn_missing: bool,
    warnings: &mut Vec<ConfigError>,
) -> i64 {
    match figment.extract_inner::<i64>(&var.to_lowercase()) {
        Ok(value) => value,
        Err(err) if err.missing() => {
            if warn_missing {
                warnings.push(ConfigError::Missing { var, default });
            }
            default as i64
        }
        Err(err) => {
            warnings.push(ConfigError::Parsing {
                var,
                default,
                source: Box::new(err),
            });
            default as i64
        }
    }
}

fn secs(value: i64) -> Duration {
    Duration::from_secs(u64::try_from(value).unwrap_or_default())
}
