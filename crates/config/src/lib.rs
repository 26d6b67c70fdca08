// Configuration loading

pub mod error;
pub mod keys;
pub mod settings;

pub use error::ConfigError;
pub use keys::{delete_api_key, get_api_key, keychain_available, set_api_key, KeyLookup, KeySource};
pub use settings::Settings;
