//! TOML session-configuration loading, following the DTO-plus-flattened-extra
//! pattern used elsewhere in this codebase: unknown keys are collected into
//! an `extra` map instead of being silently ignored by serde, and surfaced
//! as a load error.

use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

use crate::config::{DriverConfig, DriverState, SharedConfig};

#[derive(Debug, Deserialize, Default)]
struct TomlConfigRoot {
    device_index: Option<u32>,
    front_end_model: Option<String>,
    adc_sample_rate: Option<u64>,
    decimation: Option<usize>,
    ring_slot_count: Option<usize>,
    real_block_size: Option<usize>,
    debug_log: Option<String>,
    verbose: Option<bool>,
    gain_dbfs: Option<f32>,

    #[serde(flatten)]
    extra: HashMap<String, toml::Value>,
}

fn sorted_keys(extra: &HashMap<String, toml::Value>) -> Vec<&str> {
    let mut keys: Vec<&str> = extra.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

fn apply_patch(defaults: DriverConfig, patch: TomlConfigRoot) -> Result<DriverConfig, String> {
    if !patch.extra.is_empty() {
        return Err(format!(
            "unknown configuration key(s): {}",
            sorted_keys(&patch.extra).join(", ")
        ));
    }
    let mut cfg = defaults;
    if let Some(v) = patch.device_index {
        cfg.device_index = v;
    }
    if let Some(v) = patch.front_end_model {
        cfg.front_end_model = v;
    }
    if let Some(v) = patch.adc_sample_rate {
        cfg.adc_sample_rate_default = v;
    }
    if let Some(v) = patch.decimation {
        cfg.decimation_default = v;
    }
    if let Some(v) = patch.ring_slot_count {
        cfg.ring_slot_count = v;
    }
    if let Some(v) = patch.real_block_size {
        cfg.real_block_size = v;
    }
    if let Some(v) = patch.debug_log {
        cfg.debug_log = Some(v);
    }
    if let Some(v) = patch.verbose {
        cfg.verbose = v;
    }
    if let Some(v) = patch.gain_dbfs {
        cfg.gain_dbfs = v;
    }
    Ok(cfg)
}

/// Parse a TOML document, overlay it on top of [`DriverConfig::default`],
/// validate, and wrap the result in a fresh [`SharedConfig`].
pub fn from_toml_str(text: &str) -> Result<SharedConfig, String> {
    let patch: TomlConfigRoot = toml::from_str(text).map_err(|e| e.to_string())?;
    let cfg = apply_patch(DriverConfig::default(), patch)?;
    cfg.validate().map_err(|e| e.to_string())?;
    let state = DriverState::from_config(&cfg);
    Ok(SharedConfig::from_parts(cfg, state))
}

pub fn from_file(path: &str) -> Result<SharedConfig, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
    from_toml_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let shared = from_toml_str("").unwrap();
        assert_eq!(shared.config().front_end_model, "dummy");
    }

    #[test]
    fn overrides_are_applied() {
        let shared = from_toml_str("decimation = 2\nfront_end_model = \"bbrf103\"\n").unwrap();
        assert_eq!(shared.config().decimation_default, 2);
        assert_eq!(shared.config().front_end_model, "bbrf103");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = from_toml_str("bogus_key = 1\n").unwrap_err();
        assert!(err.contains("bogus_key"));
    }

    #[test]
    fn invalid_block_size_is_rejected_after_overlay() {
        let err = from_toml_str("real_block_size = 17\n").unwrap_err();
        assert!(err.contains("real_block_size") || err.contains("multiple"));
    }
}
