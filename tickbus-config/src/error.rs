//! Error types for configuration loading and validation.
//!
//! None of these abort startup: the loader records each one, logs it and falls
//! back to the default for the affected setting.

use std::path::PathBuf;

use thiserror::Error;
use validator::ValidationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The env file does not exist or cannot be read.
    #[error("can not read env file {}: {source}", .path.display())]
    EnvFileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The env file exists but is malformed.
    #[error("env file {} is malformed: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// A required variable is not set anywhere.
    #[error("'{var}' is not set. Default value ({default}) will be used")]
    Missing { var: &'static str, default: u64 },

    /// A variable is set but is not an integer.
    #[error("value of '{var}' is not an integer. Default value ({default}) will be used: {source}")]
    Parsing {
        var: &'static str,
        default: u64,
        #[source]
        source: Box<figment::Error>,
    },

    /// A variable is an integer outside its allowed range.
    #[error(
        "value of '{var}' can not be {value}: {}. Default value ({default}) will be used",
        format_validation_errors(.errors)
    )]
    Validation {
        var: &'static str,
        value: i64,
        default: u64,
        errors: Vec<ValidationError>,
    },
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| match &error.message {
            Some(msg) => msg.to_string(),
            None => error.code.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    /// Environment variable the error refers to, if any.
    pub fn var(&self) -> Option<&'static str> {
        match self {
            ConfigError::Missing { var, .. }
            | ConfigError::Parsing { var, .. }
            | ConfigError::Validation { var, .. } => Some(var),
            ConfigError::EnvFileUnavailable { .. } | ConfigError::EnvFile { .. } => None,
        }
    }
}
