//! Bucket configuration: the raw options object, its validated form, and
//! loaders for YAML and JSON documents.
//!
//! A configuration document looks like:
//!
//! ```yaml
//! capacity: 10
//! fillQuantity: 1
//! fillTime: 1000
//! initialCapacity: 0   # optional, defaults to capacity
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BucketError, ConfigError};
use crate::quantity::{Quantity, coerce};

/// Unvalidated bucket configuration as supplied by the caller.
///
/// Field names in error messages are the camelCase keys used here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BucketOptions {
    /// Maximum tokens the bucket can hold
    pub capacity: Option<Quantity>,
    /// Tokens added per `fill_time`
    pub fill_quantity: Option<Quantity>,
    /// Clock units over which `fill_quantity` tokens accrue
    pub fill_time: Option<Quantity>,
    /// Starting tokens; defaults to `capacity`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_capacity: Option<Quantity>,
}

impl BucketOptions {
    /// Options with the three required fields set.
    pub fn new(
        capacity: impl Into<Quantity>,
        fill_quantity: impl Into<Quantity>,
        fill_time: impl Into<Quantity>,
    ) -> Self {
        Self {
            capacity: Some(capacity.into()),
            fill_quantity: Some(fill_quantity.into()),
            fill_time: Some(fill_time.into()),
            initial_capacity: None,
        }
    }

    /// Start with `initial_capacity` tokens instead of a full bucket.
    #[must_use]
    pub fn with_initial_capacity(mut self, initial_capacity: impl Into<Quantity>) -> Self {
        self.initial_capacity = Some(initial_capacity.into());
        self
    }

    /// Validate every field and produce a [`BucketConfig`].
    ///
    /// Fields are checked in the order `capacity`, `fillQuantity`, `fillTime`,
    /// `initialCapacity`; the first failure is returned.
    pub fn validate(&self) -> Result<BucketConfig, BucketError> {
        let capacity = coerce(self.capacity.as_ref(), "capacity", false)?;
        let fill_quantity = coerce(self.fill_quantity.as_ref(), "fillQuantity", false)?;
        let fill_time = coerce(self.fill_time.as_ref(), "fillTime", false)?;

        let initial_capacity = match &self.initial_capacity {
            Some(raw) => {
                let initial = coerce(Some(raw), "initialCapacity", true)?;
                if initial > capacity {
                    return Err(BucketError::InitialCapacityTooLarge {
                        initial_capacity: initial,
                        capacity,
                    });
                }
                initial
            }
            None => capacity,
        };

        Ok(BucketConfig {
            capacity,
            fill_quantity,
            fill_time,
            initial_capacity,
        })
    }
}

impl TryFrom<&BucketOptions> for BucketConfig {
    type Error = BucketError;

    fn try_from(options: &BucketOptions) -> Result<Self, Self::Error> {
        options.validate()
    }
}

impl TryFrom<BucketOptions> for BucketConfig {
    type Error = BucketError;

    fn try_from(options: BucketOptions) -> Result<Self, Self::Error> {
        options.validate()
    }
}

/// Validated bucket configuration.
///
/// Only obtainable through [`BucketOptions::validate`], so every instance
/// satisfies `capacity, fill_quantity, fill_time >= 1` and
/// `initial_capacity <= capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketConfig {
    capacity: u64,
    fill_quantity: u64,
    fill_time: u64,
    initial_capacity: u64,
}

impl BucketConfig {
    /// Maximum tokens the bucket can hold.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tokens added per `fill_time`.
    pub fn fill_quantity(&self) -> u64 {
        self.fill_quantity
    }

    /// Clock units over which `fill_quantity` tokens accrue.
    pub fn fill_time(&self) -> u64 {
        self.fill_time
    }

    /// Tokens in the bucket when it is created.
    pub fn initial_capacity(&self) -> u64 {
        self.initial_capacity
    }
}

/// Parse and validate a YAML configuration document.
///
/// An empty or `null` document is reported as [`BucketError::MissingConfig`].
pub fn from_yaml_str(document: &str) -> Result<BucketConfig, ConfigError> {
    let options: Option<BucketOptions> = if document.trim().is_empty() {
        None
    } else {
        serde_yml::from_str(document)?
    };
    validate_document(options)
}

/// Parse and validate a JSON configuration document.
///
/// A `null` document is reported as [`BucketError::MissingConfig`].
pub fn from_json_str(document: &str) -> Result<BucketConfig, ConfigError> {
    let options: Option<BucketOptions> = serde_json::from_str(document)?;
    validate_document(options)
}

/// Load a configuration file. Files ending in `.json` are parsed as JSON,
/// everything else as YAML.
pub fn from_path(path: impl AsRef<Path>) -> Result<BucketConfig, ConfigError> {
    let path = path.as_ref();
    let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!(path = %path.display(), "Loading bucket config");

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_str(&document)
    } else {
        from_yaml_str(&document)
    }
}

fn validate_document(options: Option<BucketOptions>) -> Result<BucketConfig, ConfigError> {
    let options = options.ok_or(BucketError::MissingConfig)?;
    Ok(options.validate()?)
}
