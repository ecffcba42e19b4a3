//! Simple Token Bucket - a process-local token bucket rate limiter.
//!
//! A bucket holds up to `capacity` tokens and refills at `fillQuantity` tokens
//! per `fillTime` clock units. [`TokenBucket::take`] either withdraws the
//! requested tokens and returns `0`, or leaves the bucket alone and returns the
//! minimum time to wait before retrying. The bucket itself never sleeps.
//!
//! # Modules
//!
//! - [`bucket`]: the single-owner [`TokenBucket`] and its refill accounting.
//! - [`shared`]: [`SharedBucket`], a mutex-guarded bucket for concurrent tasks.
//! - [`config`]: raw [`BucketOptions`], validated [`BucketConfig`], YAML/JSON loading.
//! - [`clock`]: the injectable [`Clock`] and the provided time sources.
//! - [`quantity`]: raw numeric input and its validation.
//! - [`error`]: [`BucketError`] and [`ConfigError`].
//!
//! # Example
//!
//! ```
//! use simple_token_bucket::{BucketOptions, TokenBucket};
//!
//! // 10 tokens, one new token every second, starting empty
//! let options = BucketOptions::new(10, 1, 1000).with_initial_capacity(0);
//! let mut bucket = TokenBucket::new(options)?;
//!
//! let wait_ms = bucket.take(3)?;
//! assert!(wait_ms > 2900);
//! # Ok::<(), simple_token_bucket::BucketError>(())
//! ```

pub mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod quantity;
pub mod shared;

pub use bucket::{TokenBucket, Withdrawal};
pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use config::{BucketConfig, BucketOptions};
pub use error::{BucketError, ConfigError, ErrorKind};
pub use quantity::Quantity;
pub use shared::SharedBucket;
