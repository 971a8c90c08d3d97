//! Registry errors

use std::fmt;

use crate::mapconfig::ConfigError;

/// Errors raised by configuration registration and resolution.
///
/// Clone is required so a single compilation outcome can be handed to
/// every concurrent waiter.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// The configuration failed to compile; fix the input, do not retry
    Config(ConfigError),
    /// No entry for the token; the caller should register again
    NotFound(String),
    /// The backing store is unreachable; the registration failed
    StoreUnavailable(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Config(e) => write!(f, "{}", e),
            RegistryError::NotFound(token) => {
                write!(f, "No configuration for token '{}'", token)
            }
            RegistryError::StoreUnavailable(detail) => {
                write!(f, "Configuration store unavailable: {}", detail)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(err: ConfigError) -> Self {
        RegistryError::Config(err)
    }
}
