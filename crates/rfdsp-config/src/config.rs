use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rfdsp_core::dsp_types::{BASE_FFT_SAVE_SIZE, NDECIDX};

/// RF signal path. HF uses direct sampling; VHF uses a heterodyne IF carrier
/// and mirrors the spectrum about DC (sideband flag set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RfMode {
    #[default]
    Hf,
    Vhf,
}

/// Immutable, validated session configuration. Built once at `init` time,
/// either from defaults or overlaid with a TOML file.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub device_index: u32,
    /// Front-end model tag: "dummy", "hf103", "bbrf103", "rx888", "rx888r2",
    /// "rx888r3", "rx999", "lucy".
    pub front_end_model: String,
    pub adc_sample_rate_default: u64,
    pub decimation_default: usize,
    /// Number of slots in each ring buffer (`N`).
    pub ring_slot_count: usize,
    /// Real-ring block size in samples (`B`); must be a multiple of
    /// `BASE_FFT_SIZE - BASE_FFT_SCRAP_SIZE`.
    pub real_block_size: usize,
    pub debug_log: Option<String>,
    pub verbose: bool,
    /// Model-specific ADC-to-dBFS scale used to normalize filter kernels.
    pub gain_dbfs: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            front_end_model: "dummy".to_string(),
            adc_sample_rate_default: 64_000_000,
            decimation_default: 0,
            ring_slot_count: 64,
            real_block_size: BASE_FFT_SAVE_SIZE * 8,
            debug_log: None,
            verbose: false,
            gain_dbfs: 1.0,
        }
    }
}

impl DriverConfig {
    /// Validate the invariants this crate depends on; called once after
    /// construction, before the config is wrapped in [`SharedConfig`].
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.ring_slot_count < 2 {
            return Err("ring_slot_count must be at least 2");
        }
        if self.real_block_size == 0 || self.real_block_size % BASE_FFT_SAVE_SIZE != 0 {
            return Err("real_block_size must be a non-zero multiple of BASE_FFT_SIZE - BASE_FFT_SCRAP_SIZE");
        }
        if self.decimation_default >= NDECIDX {
            return Err("decimation_default out of range");
        }
        if self.gain_dbfs <= 0.0 {
            return Err("gain_dbfs must be positive");
        }
        Ok(())
    }
}

/// Mutable runtime state, read/written while the stream is alive.
#[derive(Debug, Clone)]
pub struct DriverState {
    pub decimation: usize,
    pub rf_mode: RfMode,
    pub adc_sample_rate: u64,
    pub center_frequency_hz: u64,
    pub dither: bool,
    pub pga: bool,
    pub rand: bool,
    pub bias_t_hf: bool,
    pub bias_t_vhf: bool,
}

impl DriverState {
    pub fn from_config(cfg: &DriverConfig) -> Self {
        Self {
            decimation: cfg.decimation_default,
            rf_mode: RfMode::Hf,
            adc_sample_rate: cfg.adc_sample_rate_default,
            center_frequency_hz: 0,
            dither: false,
            pga: false,
            rand: false,
            bias_t_hf: false,
            bias_t_vhf: false,
        }
    }
}

/// Clonable handle pairing an immutable, `Arc`-shared configuration with a
/// lock-guarded mutable state snapshot. Mirrors the `Arc<Config> +
/// Arc<RwLock<State>>` pattern used throughout this codebase's other
/// components.
#[derive(Clone)]
pub struct SharedConfig {
    cfg: Arc<DriverConfig>,
    state: Arc<RwLock<DriverState>>,
}

impl SharedConfig {
    pub fn from_parts(cfg: DriverConfig, state: DriverState) -> Self {
        if let Err(e) = cfg.validate() {
            panic!("invalid driver configuration: {}", e);
        }
        Self {
            cfg: Arc::new(cfg),
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn new(cfg: DriverConfig) -> Self {
        let state = DriverState::from_config(&cfg);
        Self::from_parts(cfg, state)
    }

    pub fn config(&self) -> Arc<DriverConfig> {
        Arc::clone(&self.cfg)
    }

    pub fn state_read(&self) -> RwLockReadGuard<'_, DriverState> {
        self.state.read().unwrap()
    }

    pub fn state_write(&self) -> RwLockWriteGuard<'_, DriverState> {
        self.state.write().unwrap()
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(DriverConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_misaligned_block_size() {
        let mut cfg = DriverConfig::default();
        cfg.real_block_size = 123;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_decimation() {
        let mut cfg = DriverConfig::default();
        cfg.decimation_default = NDECIDX;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shared_config_roundtrips_state_writes() {
        let shared = SharedConfig::default();
        {
            let mut st = shared.state_write();
            st.decimation = 3;
        }
        assert_eq!(shared.state_read().decimation, 3);
    }
}
