// Recognition API key storage
//
// Looked up in order:
// 1. System keychain (preferred)
// 2. EXPENSOR_API_KEY environment variable (CI/headless)
//
// Keys are NEVER stored in settings.json

use std::env;

use crate::error::ConfigError;

/// Environment variable consulted when the keychain has no key.
pub const API_KEY_ENV: &str = "EXPENSOR_API_KEY";

#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "expensor";
#[cfg(feature = "keychain")]
const KEYCHAIN_ACCOUNT: &str = "recognition";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Keychain,
    Environment,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

impl std::fmt::Debug for KeyLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLookup")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("source", &self.source)
            .finish()
    }
}

pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    lookup_env(API_KEY_ENV)
}

fn lookup_env(name: &str) -> KeyLookup {
    match env::var(name) {
        Ok(key) if !key.trim().is_empty() => KeyLookup {
            key: Some(key.trim().to_string()),
            source: KeySource::Environment,
        },
        _ => KeyLookup {
            key: None,
            source: KeySource::None,
        },
    }
}

/// Store the API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| ConfigError::Keychain(format!("failed to create entry: {}", e)))?;

    entry
        .set_password(key)
        .map_err(|e| ConfigError::Keychain(format!("failed to store key: {}", e)))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), ConfigError> {
    Err(ConfigError::KeychainUnavailable)
}

/// Delete the API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| ConfigError::Keychain(format!("failed to access entry: {}", e)))?;

    entry
        .delete_credential()
        .map_err(|e| ConfigError::Keychain(format!("failed to delete key: {}", e)))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), ConfigError> {
    Err(ConfigError::KeychainUnavailable)
}

pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "probe").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}
