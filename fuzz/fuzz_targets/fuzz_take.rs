#![no_main]

//! Fuzz target for bucket accounting.
//!
//! # Goal
//! Drive a bucket with arbitrary configuration and an arbitrary sequence of
//! takes and clock moves, and verify that:
//! - Nothing panics or overflows
//! - `0 <= left <= capacity` after every step
//! - The checkpoint never runs ahead of the clock
//! - Rejected takes do not touch the bucket

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use simple_token_bucket::{BucketOptions, Clock, ManualClock, TokenBucket};

#[derive(Debug, Arbitrary)]
enum Step {
    Take(u64),
    TakeSigned(i64),
    TakeFloat(f64),
    TakeText(String),
    Advance(u64),
    Set(u64),
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u64,
    fill_quantity: u64,
    fill_time: u64,
    initial_capacity: Option<u64>,
    start: u64,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    fuzz_bucket(input);
});

fn fuzz_bucket(input: Input) {
    let clock = ManualClock::new(input.start);
    let mut options = BucketOptions::new(input.capacity, input.fill_quantity, input.fill_time);
    if let Some(initial) = input.initial_capacity {
        options = options.with_initial_capacity(initial);
    }

    let Ok(mut bucket) = TokenBucket::with_clock(options, clock.clone()) else {
        return;
    };
    let capacity = bucket.capacity();

    for step in input.steps.into_iter().take(256) {
        let before = (bucket.available(), bucket.last_fill());
        let result = match step {
            Step::Take(n) => bucket.take(n),
            Step::TakeSigned(n) => bucket.take(n),
            Step::TakeFloat(n) => bucket.take(n),
            Step::TakeText(s) => bucket.take(s),
            Step::Advance(d) => {
                clock.advance(d.min(u64::MAX - clock.now()));
                continue;
            }
            Step::Set(t) => {
                clock.set(t);
                continue;
            }
        };

        if result.is_err() {
            assert_eq!((bucket.available(), bucket.last_fill()), before);
        }
        assert!(bucket.available() <= capacity);
        assert!(bucket.last_fill() <= clock.now().max(before.1));
    }
}
