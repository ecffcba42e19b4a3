#![no_main]

//! Fuzz target for configuration loading.
//!
//! Arbitrary YAML and JSON documents must either load into a config that
//! upholds the bucket invariants or fail with an error, never panic.

use libfuzzer_sys::fuzz_target;
use simple_token_bucket::config;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = std::str::from_utf8(data) else {
        return;
    };

    for loaded in [config::from_yaml_str(document), config::from_json_str(document)] {
        if let Ok(config) = loaded {
            assert!(config.capacity() >= 1);
            assert!(config.fill_quantity() >= 1);
            assert!(config.fill_time() >= 1);
            assert!(config.initial_capacity() <= config.capacity());
        }
    }
});
