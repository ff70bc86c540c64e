//! # Configuration
//!
//! Sizing and diagnostics knobs, loaded once at startup from TOML.
//!
//! ```toml
//! entity_capacity = 100000
//! component_capacity = 4096
//! slow_system_warn_us = 2000
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Startup configuration for an [`crate::Ecs`].
///
/// Every key is optional; missing keys take the [`Default`] value.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Entity slots reserved up front.
    pub entity_capacity: usize,
    /// Initial capacity of each component pool.
    pub component_capacity: usize,
    /// A system update slower than this logs a warning. `0` disables the check.
    pub slow_system_warn_us: u64,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            component_capacity: 256,
            slow_system_warn_us: 0,
        }
    }
}

impl EcsConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the text is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        toml::from_str(text).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EcsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_default() {
        let config = EcsConfig::from_toml_str("entity_capacity = 10").unwrap();
        assert_eq!(config.entity_capacity, 10);
        assert_eq!(config.component_capacity, EcsConfig::default().component_capacity);
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(EcsConfig::from_toml_str("").unwrap(), EcsConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EcsConfig::from_toml_str("capacity = 3").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EcsConfig::load("/nonexistent/tessera.toml").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }
}
