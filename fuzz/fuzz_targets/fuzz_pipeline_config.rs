//! Fuzz target for pipeline configuration parsing.
//!
//! Both TOML and JSON parsing, and validation of whatever parses, must
//! return errors rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tsa_config::{validate_pipeline, PipelineConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<PipelineConfig>(data) {
        let _ = validate_pipeline(&config);
    }
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = PipelineConfig::from_toml_str(text) {
            let _ = validate_pipeline(&config);
        }
    }
});
