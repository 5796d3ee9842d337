//! Fuzz target: stored configuration blob
//!
//! Feeds arbitrary bytes to the NVS config decoder, the same path the
//! boot sequence takes for whatever is in flash.
//!
//! Invariants checked:
//! - No panics under arbitrary byte inputs
//! - Any config that decodes also passes range validation, so re-saving
//!   it through the adapter succeeds and reloads identically
//!
//! cargo fuzz run fuzz_stored_config

#![no_main]

use envmon::adapters::nvs::{decode_config, NvsAdapter};
use envmon::app::ports::ConfigPort;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = decode_config(data) else {
        return;
    };

    let nvs = NvsAdapter::new().expect("simulation backend never fails");
    nvs.save(&cfg).expect("decoded config must re-validate");
    let reloaded = nvs.load().expect("saved config must reload");
    // NaN thresholds are rejected by validation, so equality is well defined.
    assert_eq!(reloaded, cfg);
});
