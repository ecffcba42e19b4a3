//! Token bucket with exact integer refill accounting.
//!
//! Tokens accrue at `fill_quantity` per `fill_time` clock units, up to
//! `capacity`. State is a checkpoint of whole tokens (`left`) and the instant
//! they were last authoritative (`last`); fractional tokens are never stored.
//! Instead, `last` only advances by the time the credited whole tokens
//! account for, so the leftover fraction of elapsed time carries into the next
//! refill and repeated flooring does not drift.

use tracing::{debug, trace};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{BucketConfig, BucketOptions};
use crate::error::BucketError;
use crate::quantity::{Quantity, coerce};

/// Name used for `take` arguments in error messages.
const TAKE_ARGUMENT: &str = "TokenBucket::take: argument";

/// Outcome of a single [`TokenBucket::withdraw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    /// Clock units to wait until the requested tokens would be available
    pub wait: u64,
    /// Whether the tokens were deducted
    pub granted: bool,
}

/// Single-owner token bucket.
///
/// [`take`](Self::take) never blocks: it returns how long the caller must
/// wait, in clock units, and consumes tokens only when enough are left after
/// refill. Whole-token accounting means the wait can come out as zero while
/// the request is still short; use [`withdraw`](Self::withdraw) when
/// the caller needs to know whether anything was taken.
///
/// ```
/// use simple_token_bucket::{BucketOptions, ManualClock, TokenBucket};
///
/// let clock = ManualClock::new(0);
/// let options = BucketOptions::new(2, 1, 1);
/// let mut bucket = TokenBucket::with_clock(options, clock.clone()).unwrap();
///
/// assert_eq!(bucket.take(1).unwrap(), 0);
/// assert_eq!(bucket.take(1).unwrap(), 0);
/// assert_eq!(bucket.take(1).unwrap(), 1);
/// clock.advance(1);
/// assert_eq!(bucket.take(1).unwrap(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct TokenBucket<C = MonotonicClock> {
    capacity: u64,
    fill_quantity: u64,
    fill_time: u64,
    /// Whole tokens available at `last`
    left: u64,
    /// Accounting checkpoint in clock units
    last: u64,
    clock: C,
}

impl TokenBucket<MonotonicClock> {
    /// Create a bucket on the default millisecond [`MonotonicClock`].
    pub fn new(options: BucketOptions) -> Result<Self, BucketError> {
        Self::with_clock(options, MonotonicClock::new())
    }
}

impl<C: Clock> TokenBucket<C> {
    /// Validate `options` and create a bucket driven by `clock`.
    pub fn with_clock(options: BucketOptions, clock: C) -> Result<Self, BucketError> {
        let config = options.validate()?;
        Ok(Self::from_config(config, clock))
    }

    /// Create a bucket from an already validated configuration.
    pub fn from_config(config: BucketConfig, clock: C) -> Self {
        let last = clock.now();
        debug!(
            capacity = config.capacity(),
            fill_quantity = config.fill_quantity(),
            fill_time = config.fill_time(),
            initial = config.initial_capacity(),
            "Token bucket created"
        );
        Self {
            capacity: config.capacity(),
            fill_quantity: config.fill_quantity(),
            fill_time: config.fill_time(),
            left: config.initial_capacity(),
            last,
            clock,
        }
    }

    /// Attempt to withdraw `tokens`.
    ///
    /// Returns the minimum number of clock units to wait until `tokens` would
    /// be available. Tokens are deducted only if enough were left after
    /// refill; a refused request leaves the bucket untouched apart from
    /// crediting refill. A refused request can still report `0` when the time
    /// carried since the checkpoint already covers the shortfall, so `0` alone
    /// does not prove the tokens were taken. See [`withdraw`](Self::withdraw).
    ///
    /// # Errors
    ///
    /// - [`BucketError::NotAnInteger`] / [`BucketError::OutOfRange`] when
    ///   `tokens` is not a positive integer.
    /// - [`BucketError::ExceedsCapacity`] when `tokens > capacity`.
    ///
    /// Neither error changes the bucket.
    pub fn take(&mut self, tokens: impl Into<Quantity>) -> Result<u64, BucketError> {
        self.withdraw(tokens).map(|withdrawal| withdrawal.wait)
    }

    /// Like [`take`](Self::take), but also reports whether the tokens were
    /// deducted.
    ///
    /// # Errors
    ///
    /// Same as [`take`](Self::take).
    pub fn withdraw(&mut self, tokens: impl Into<Quantity>) -> Result<Withdrawal, BucketError> {
        let tokens = coerce(Some(&tokens.into()), TAKE_ARGUMENT, false)?;
        if tokens > self.capacity {
            return Err(BucketError::ExceedsCapacity {
                tokens,
                capacity: self.capacity,
            });
        }

        self.refill(self.clock.now());
        let wait = self.wait_time(tokens, self.clock.now());

        let granted = tokens <= self.left;
        if granted {
            self.left -= tokens;
        } else {
            debug!(tokens, left = self.left, wait, "Insufficient tokens");
        }

        trace!(tokens, left = self.left, last = self.last, wait, granted, "take");
        Ok(Withdrawal { wait, granted })
    }

    /// Credit whole tokens earned since `last`.
    fn refill(&mut self, now: u64) {
        let elapsed = u128::from(now.saturating_sub(self.last));
        let fill_quantity = u128::from(self.fill_quantity);
        let fill_time = u128::from(self.fill_time);

        let fill_tokens = elapsed * fill_quantity / fill_time;
        // Time those whole tokens took to accrue; always <= elapsed
        let time_consumed = fill_tokens * fill_time / fill_quantity;

        let left = u128::from(self.left) + fill_tokens;
        if left > u128::from(self.capacity) {
            self.left = self.capacity;
            self.last = now;
        } else {
            // left <= capacity and time_consumed <= elapsed, so both fit in u64
            self.left = left as u64;
            self.last += time_consumed as u64;
        }
    }

    /// Clock units until `tokens` are available, given state as of `now`.
    fn wait_time(&self, tokens: u64, now: u64) -> u64 {
        if tokens <= self.left {
            return 0;
        }
        let needed = u128::from(tokens - self.left);
        let since_last = u128::from(now.saturating_sub(self.last));

        // ceil(needed * fill_time / fill_quantity - since_last); since_last is
        // whole, so it can come out of the ceiling
        let wait = (needed * u128::from(self.fill_time))
            .div_ceil(u128::from(self.fill_quantity))
            .saturating_sub(since_last);
        u64::try_from(wait).unwrap_or(u64::MAX)
    }

    /// Maximum tokens the bucket can hold.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tokens added per [`fill_time`](Self::fill_time).
    pub fn fill_quantity(&self) -> u64 {
        self.fill_quantity
    }

    /// Clock units over which [`fill_quantity`](Self::fill_quantity) tokens accrue.
    pub fn fill_time(&self) -> u64 {
        self.fill_time
    }

    /// Tokens available as of the last accounting checkpoint.
    ///
    /// Does not credit refill; call [`take`](Self::take) for an up-to-date view.
    pub fn available(&self) -> u64 {
        self.left
    }

    /// The last accounting checkpoint, in clock units.
    pub fn last_fill(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;

    fn manual_bucket(options: BucketOptions) -> (TokenBucket<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let bucket = TokenBucket::with_clock(options, clock.clone()).unwrap();
        (bucket, clock)
    }

    #[test]
    fn test_default_initial_capacity() {
        let (mut bucket, clock) = manual_bucket(BucketOptions::new(2, 1, 1));
        assert_eq!(bucket.take(1).unwrap(), 0);
        assert_eq!(bucket.take(1).unwrap(), 0);
        assert_eq!(bucket.take(1).unwrap(), 1);
        clock.advance(1);
        assert_eq!(bucket.take(1).unwrap(), 0);
    }

    #[test]
    fn test_empty_bucket_wait_without_deduction() {
        let (mut bucket, _clock) =
            manual_bucket(BucketOptions::new(10, 1, 1000).with_initial_capacity(0));
        assert_eq!(bucket.take(3).unwrap(), 3000);
        assert_eq!(bucket.available(), 0);
    }

    #[test]
    fn test_wait_rounds_up() {
        // 30 tokens per 60000 -> one token every 2000
        let (mut bucket, _clock) =
            manual_bucket(BucketOptions::new(10, 30, 60000).with_initial_capacity(1));
        assert_eq!(bucket.take(1).unwrap(), 0);
        assert_eq!(bucket.take(1).unwrap(), 2000);

        // 3 tokens per 10 -> 3.33.. units per token
        let (mut bucket, _clock) =
            manual_bucket(BucketOptions::new(5, 3, 10).with_initial_capacity(0));
        assert_eq!(bucket.take(1).unwrap(), 4);
    }

    #[test]
    fn test_refill_keeps_fractional_time() {
        // 3 tokens per 10 units
        let (mut bucket, clock) =
            manual_bucket(BucketOptions::new(100, 3, 10).with_initial_capacity(0));
        clock.advance(5);
        // floor(5 * 3 / 10) = 1 token, accounting for floor(10 / 3) = 3 units
        assert_eq!(bucket.take(1).unwrap(), 0);
        assert_eq!(bucket.last_fill(), 3);
        clock.advance(5);
        // elapsed 7 since checkpoint -> 2 tokens
        assert_eq!(bucket.take(2).unwrap(), 0);
        assert_eq!(bucket.available(), 0);
        assert_eq!(bucket.last_fill(), 9);
    }

    #[test]
    fn test_saturation_snaps_checkpoint() {
        let (mut bucket, clock) =
            manual_bucket(BucketOptions::new(10, 1, 1000).with_initial_capacity(5));
        clock.advance(1_000_000);
        assert_eq!(bucket.take(1).unwrap(), 0);
        assert_eq!(bucket.available(), 9);
        assert_eq!(bucket.last_fill(), 1_000_000);
    }

    #[test]
    fn test_exceeds_capacity_leaves_state() {
        let (mut bucket, clock) =
            manual_bucket(BucketOptions::new(10, 1, 1000).with_initial_capacity(1));
        clock.advance(500);
        let err = bucket.take(11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert_eq!(
            err.to_string(),
            "Cannot remove more tokens than the bucket capacity \
             (tried to take `11`, capacity is `10`)"
        );
        assert_eq!(bucket.available(), 1);
        assert_eq!(bucket.last_fill(), 0);
        assert_eq!(bucket.take(1).unwrap(), 0);
    }

    #[test]
    fn test_invalid_take_arguments() {
        let (mut bucket, _clock) =
            manual_bucket(BucketOptions::new(10, 1, 1000).with_initial_capacity(1));
        for value in [Quantity::from(1.2), Quantity::from("foo"), Quantity::from(f64::NAN)] {
            let err = bucket.take(value.clone()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type);
            assert_eq!(
                err.to_string(),
                format!(
                    "TokenBucket::take: argument must be a positive finite integer \
                     (was `{value}`)"
                )
            );
        }
        for value in [0, -1] {
            let err = bucket.take(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Range);
            assert!(err.to_string().contains(&format!("was `{value}`")));
        }
        assert_eq!(bucket.available(), 1);
    }

    #[test]
    fn test_clock_before_checkpoint_is_zero_elapsed() {
        let clock = ManualClock::new(100);
        let options = BucketOptions::new(2, 1, 1).with_initial_capacity(0);
        let mut bucket = TokenBucket::with_clock(options, clock.clone()).unwrap();
        clock.set(50);
        assert_eq!(bucket.take(1).unwrap(), 1);
        assert_eq!(bucket.available(), 0);
        assert_eq!(bucket.last_fill(), 100);
    }

    #[test]
    fn test_extreme_rates_do_not_overflow() {
        let (mut bucket, clock) =
            manual_bucket(BucketOptions::new(u64::MAX, u64::MAX, 1).with_initial_capacity(0));
        clock.set(u64::MAX);
        assert_eq!(bucket.take(u64::MAX).unwrap(), 0);

        let (mut bucket, _clock) =
            manual_bucket(BucketOptions::new(u64::MAX, 1, u64::MAX).with_initial_capacity(0));
        assert_eq!(bucket.take(u64::MAX).unwrap(), u64::MAX);
    }

    #[test]
    fn test_zero_wait_can_be_refused() {
        // 52 tokens per 2694 units; at 1968 only 37 whole tokens are credited
        // and the checkpoint stops at 1916, 52 units short of the clock
        let (mut bucket, clock) =
            manual_bucket(BucketOptions::new(38, 52, 2694).with_initial_capacity(0));
        clock.set(1968);
        assert_eq!(bucket.take(38).unwrap(), 0);
        assert_eq!(bucket.available(), 37);
        assert_eq!(bucket.last_fill(), 1916);

        // The carried 52 units are worth one more token on the next refill
        assert_eq!(
            bucket.withdraw(38).unwrap(),
            Withdrawal {
                wait: 0,
                granted: true
            }
        );
        assert_eq!(bucket.available(), 0);
        assert_eq!(bucket.last_fill(), 1967);
    }

    #[test]
    fn test_withdraw_refused_at_zero_wait() {
        let (mut bucket, clock) =
            manual_bucket(BucketOptions::new(38, 52, 2694).with_initial_capacity(0));
        clock.set(1968);
        assert_eq!(
            bucket.withdraw(38).unwrap(),
            Withdrawal {
                wait: 0,
                granted: false
            }
        );
        assert_eq!(bucket.available(), 37);
    }

    #[test]
    fn test_withdraw_reports_grant() {
        let (mut bucket, _clock) =
            manual_bucket(BucketOptions::new(10, 1, 1000).with_initial_capacity(1));
        assert!(bucket.withdraw(1).unwrap().granted);
        let refused = bucket.withdraw(1).unwrap();
        assert!(!refused.granted);
        assert_eq!(refused.wait, 1000);
        assert!(bucket.withdraw(11).is_err());
    }
}
