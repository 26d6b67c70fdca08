/// Error type for settings and key storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading or writing the settings file failed
    Io(String),
    /// settings.json is not valid
    Parse(String),
    /// Keychain access failed
    Keychain(String),
    /// Built without keychain support
    KeychainUnavailable,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "invalid settings.json: {}", msg),
            ConfigError::Keychain(msg) => write!(f, "keychain error: {}", msg),
            ConfigError::KeychainUnavailable => write!(
                f,
                "keychain support not enabled; set {} instead",
                crate::keys::API_KEY_ENV
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
