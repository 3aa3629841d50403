use serde::Deserialize;

use crate::HttpClientError;

/// Configuration section the options are bound from by default.
pub const DEFAULT_SECTION: &str = "httpClient";

/// Environment variable read by [`ClientOptions::from_env`].
pub const RETRIES_ENV: &str = "HTTP_CLIENT_RETRIES";

/// Configures retry behavior. Read once at startup and shared read-only.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Number of retries after the initial attempt.
    pub retries: u32,
}

impl ClientOptions {
    /// Binds options from the named section of a JSON configuration document.
    ///
    /// A missing section yields the defaults; a section that does not match
    /// the options shape is a [`HttpClientError::Config`].
    pub fn from_section(config: &serde_json::Value, section: &str) -> Result<Self, HttpClientError> {
        match config.get(section) {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => Self::deserialize(value).map_err(|err| {
                HttpClientError::Config(format!("invalid '{section}' section: {err}"))
            }),
        }
    }

    /// Reads options from `HTTP_CLIENT_RETRIES`, falling back to defaults
    /// when it is unset.
    pub fn from_env() -> Result<Self, HttpClientError> {
        match std::env::var(RETRIES_ENV) {
            Ok(raw) => parse_retries(&raw).map(|retries| Self { retries }),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(err) => Err(HttpClientError::Config(format!("{RETRIES_ENV}: {err}"))),
        }
    }
}

fn parse_retries(raw: &str) -> Result<u32, HttpClientError> {
    raw.trim().parse::<u32>().map_err(|err| {
        HttpClientError::Config(format!("{RETRIES_ENV} must be a non-negative integer: {err}"))
    })
}
