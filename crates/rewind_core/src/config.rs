//! # Registry Configuration
//!
//! Construction parameters for registered sets, loadable from TOML.
//!
//! ```toml
//! set_capacity = 256
//! frames_capacity = 60
//! page_size = 512
//! default_packing = "continuous"
//! store_empty_types_as_data_sets = false
//! ```
//!
//! Missing keys fall back to [`RegistryConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::Packing;
use crate::error::{StorageError, StorageResult};
use crate::memory::DEFAULT_PAGE_SIZE;

/// Parameters shared by every set a registry creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Initial id and slot capacity of each set.
    pub set_capacity: usize,
    /// Frames kept by each set and group for rollback.
    pub frames_capacity: usize,
    /// Payload page size. Must be a power of two.
    pub page_size: usize,
    /// Packing of sets not registered as stable.
    pub default_packing: Packing,
    /// Store payload-free kinds as zero-sized data sets instead of plain
    /// sparse sets.
    pub store_empty_types_as_data_sets: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            set_capacity: 100,
            frames_capacity: 120,
            page_size: DEFAULT_PAGE_SIZE,
            default_packing: Packing::Continuous,
            store_empty_types_as_data_sets: false,
        }
    }
}

impl RegistryConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] on syntax errors, unknown keys
    /// or values rejected by [`RegistryConfig::validate`].
    pub fn from_toml_str(source: &str) -> StorageResult<Self> {
        let config: Self = toml::from_str(source).map_err(|err| StorageError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the file can not be read or
    /// does not hold a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| StorageError::InvalidConfig(format!("{}: {err}", path.display())))?;
        let config = Self::from_toml_str(&source)?;

        tracing::debug!("loaded registry config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the page size is not a
    /// power of two or no frame can be kept.
    pub fn validate(&self) -> StorageResult<()> {
        if !self.page_size.is_power_of_two() {
            return Err(StorageError::InvalidConfig(format!(
                "page_size must be a power of two, got {}",
                self.page_size
            )));
        }
        if self.frames_capacity == 0 {
            return Err(StorageError::InvalidConfig(
                "frames_capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Packing for a kind registered with the given stability.
    #[inline]
    #[must_use]
    pub fn packing_for(&self, stable: bool) -> Packing {
        if stable {
            Packing::WithHoles
        } else {
            self.default_packing
        }
    }
}
