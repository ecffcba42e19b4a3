//! Token bucket shared between concurrent tasks.
//!
//! [`TokenBucket::take`] needs `&mut self`, which is enough for a single owner.
//! When several tasks draw from one bucket, [`SharedBucket`] holds the bucket
//! behind a mutex so each refill-decide-deduct cycle runs under one lock and
//! two callers can never both see the same tokens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::bucket::{TokenBucket, Withdrawal};
use crate::clock::{Clock, MonotonicClock};
use crate::error::BucketError;
use crate::quantity::Quantity;

/// Cloneable handle to a mutex-guarded [`TokenBucket`].
///
/// Clones share the same bucket.
pub struct SharedBucket<C = MonotonicClock> {
    inner: Arc<Mutex<TokenBucket<C>>>,
}

impl<C> Clone for SharedBucket<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> SharedBucket<C> {
    /// Wrap a bucket for shared use.
    #[must_use]
    pub fn new(bucket: TokenBucket<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bucket)),
        }
    }

    /// Run one [`TokenBucket::take`] under the lock.
    ///
    /// Returns the wait time in clock units.
    pub async fn try_take(&self, tokens: impl Into<Quantity>) -> Result<u64, BucketError> {
        let mut bucket = self.inner.lock().await;
        bucket.take(tokens)
    }

    /// Run one [`TokenBucket::withdraw`] under the lock.
    pub async fn try_withdraw(
        &self,
        tokens: impl Into<Quantity>,
    ) -> Result<Withdrawal, BucketError> {
        let mut bucket = self.inner.lock().await;
        bucket.withdraw(tokens)
    }

    /// Take `tokens`, sleeping between attempts until they are granted.
    ///
    /// Wait times are slept as milliseconds, so the bucket must run on a
    /// millisecond clock such as the default [`MonotonicClock`]. The lock is
    /// released while sleeping. Validation and capacity errors are returned
    /// immediately.
    ///
    /// Cancel-safe: a dropped future has consumed nothing.
    pub async fn acquire(&self, tokens: impl Into<Quantity>) -> Result<(), BucketError> {
        let tokens = tokens.into();
        loop {
            let Withdrawal { wait, granted } = self.try_withdraw(tokens.clone()).await?;
            if granted {
                return Ok(());
            }

            // A refused take can report a zero wait; sleep at least one tick
            let wait = wait.max(1);
            debug!(tokens = %tokens, wait_ms = wait, "Waiting for tokens");
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
    }

    /// Tokens available as of the last accounting checkpoint.
    pub async fn available(&self) -> u64 {
        self.inner.lock().await.available()
    }

    /// Maximum tokens the bucket can hold.
    pub async fn capacity(&self) -> u64 {
        self.inner.lock().await.capacity()
    }
}

impl<C: Clock> From<TokenBucket<C>> for SharedBucket<C> {
    fn from(bucket: TokenBucket<C>) -> Self {
        Self::new(bucket)
    }
}
