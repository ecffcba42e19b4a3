//! Error types for bucket construction, `take`, and configuration loading.
//!
//! Every validation failure falls into one of two categories, exposed through
//! [`BucketError::kind`]:
//!
//! - [`ErrorKind::Type`]: the input is not a finite integer at all.
//! - [`ErrorKind::Range`]: the input is an integer but outside the allowed bounds.
//!
//! Messages echo the offending field name and value exactly as supplied.

use thiserror::Error;

/// Category of a [`BucketError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input is missing, non-numeric, fractional, or non-finite.
    Type,
    /// Input is numeric but out of the permitted bounds.
    Range,
}

/// Validation errors raised by [`TokenBucket`](crate::TokenBucket) and
/// [`BucketOptions`](crate::BucketOptions).
///
/// A failed call never mutates bucket state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BucketError {
    /// No configuration object was supplied at all.
    #[error("constructor requires {{capacity, fillQuantity, fillTime}}")]
    MissingConfig,

    /// Value could not be coerced to an integer without loss.
    #[error("{name} must be a positive finite integer (was `{value}`)")]
    NotAnInteger {
        /// Field or argument name
        name: String,
        /// Original value as supplied
        value: String,
    },

    /// Value is integral but negative, or zero where zero is not allowed.
    #[error("{name} must be a positive finite integer (was `{value}`)")]
    OutOfRange {
        /// Field or argument name
        name: String,
        /// Original value as supplied
        value: String,
    },

    /// `initialCapacity` is larger than `capacity`.
    #[error(
        "Initial capacity cannot be greater than bucket capacity \
         (initialCapacity was `{initial_capacity}`, capacity was `{capacity}`)"
    )]
    InitialCapacityTooLarge {
        /// Requested starting tokens
        initial_capacity: u64,
        /// Bucket capacity
        capacity: u64,
    },

    /// A single `take` asked for more tokens than the bucket can ever hold.
    #[error(
        "Cannot remove more tokens than the bucket capacity \
         (tried to take `{tokens}`, capacity is `{capacity}`)"
    )]
    ExceedsCapacity {
        /// Requested tokens
        tokens: u64,
        /// Bucket capacity
        capacity: u64,
    },
}

impl BucketError {
    /// Returns whether this is a type or a range failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BucketError::MissingConfig | BucketError::NotAnInteger { .. } => ErrorKind::Type,
            BucketError::OutOfRange { .. }
            | BucketError::InitialCapacityTooLarge { .. }
            | BucketError::ExceedsCapacity { .. } => ErrorKind::Range,
        }
    }

    /// Returns `true` for [`ErrorKind::Type`] failures.
    pub fn is_type(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    /// Returns `true` for [`ErrorKind::Range`] failures.
    pub fn is_range(&self) -> bool {
        self.kind() == ErrorKind::Range
    }
}

/// Errors raised while loading a bucket configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or shape error
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// JSON syntax or shape error
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Document parsed but failed bucket validation
    #[error(transparent)]
    Invalid(#[from] BucketError),
}
