#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary TOML must never panic the config loader: malformed input is a
// parse error, out-of-range values are a validate() error.
fuzz_target!(|data: &str| {
    if let Ok(cfg) = toml::from_str::<firedock_config::Config>(data) {
        let _ = cfg.validate();
    }
});
