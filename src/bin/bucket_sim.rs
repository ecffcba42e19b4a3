//! Replays a sequence of takes against a bucket loaded from a config file.
//!
//! Time is simulated with a manual clock that advances by `--interval`
//! between takes, so results are deterministic. Each take prints its wait
//! time and whether the tokens were granted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use simple_token_bucket::{ManualClock, TokenBucket, Withdrawal, config};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bucket_sim", about = "Simulate token bucket takes")]
struct Args {
    /// Bucket config file (YAML, or JSON with a .json extension)
    #[arg(env = "BUCKET_CONFIG")]
    config: PathBuf,

    /// Tokens requested by each take
    #[arg(long, default_value_t = 1)]
    tokens: u64,

    /// Number of takes to perform
    #[arg(long, default_value_t = 10)]
    takes: u32,

    /// Simulated time between takes, in the bucket's millisecond clock
    #[arg(long, default_value = "0ms", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Emit logs as JSON
    #[arg(long, env = "BUCKET_LOG_JSON")]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = match config::from_path(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let clock = ManualClock::new(0);
    let mut bucket = TokenBucket::from_config(config, clock.clone());
    let step = args.interval.as_millis() as u64;

    for i in 0..args.takes {
        if i > 0 {
            clock.advance(step);
        }
        match bucket.withdraw(args.tokens) {
            Ok(Withdrawal { wait, granted }) => {
                tracing::info!(take = i, left = bucket.available(), wait, granted, "take");
                println!("{wait}\t{}", if granted { "granted" } else { "refused" });
            }
            Err(e) => {
                tracing::error!("take {} failed: {}", i, e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
