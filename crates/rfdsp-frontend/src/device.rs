//! Front-end model sum type (C7). Each supported ADC board is a variant
//! carrying the same mutable runtime state; the per-model behavior that
//! used to live in a hierarchy of C++ subclasses (`RadioHardware` and its
//! overrides) is reduced to per-variant constant step tables and a `name`/
//! `best_rf_mode` pair, dispatched through [`FrontEnd`].

use rfdsp_config::RfMode;
use rfdsp_core::error::{DriverError, DriverResult};

use crate::adapter::{FrontEnd, Led};

/// Runtime state common to every model. Held per-instance; the constant
/// tables a model answers capability queries with live in [`ModelSpec`]
/// instead, since they never change for the life of the process.
#[derive(Debug, Clone)]
pub struct CommonState {
    rf_mode: RfMode,
    adc_sample_rate: u64,
    lo_freq_hf: u64,
    lo_freq_vhf: u64,
    rf_attn_step_hf: usize,
    rf_attn_step_vhf: usize,
    if_gain_step_hf: usize,
    if_gain_step_vhf: usize,
    bias_t_hf: bool,
    bias_t_vhf: bool,
    dither: bool,
    pga: bool,
    rand: bool,
}

impl Default for CommonState {
    fn default() -> Self {
        Self {
            rf_mode: RfMode::Hf,
            adc_sample_rate: 64_000_000,
            lo_freq_hf: 0,
            lo_freq_vhf: 0,
            rf_attn_step_hf: 0,
            rf_attn_step_vhf: 0,
            if_gain_step_hf: 0,
            if_gain_step_vhf: 0,
            bias_t_hf: false,
            bias_t_vhf: false,
            dither: false,
            pga: false,
            rand: false,
        }
    }
}

/// Per-model constant data: name, preferred mode, mode support, and
/// calibration step tables. These are representative attenuator/gain
/// ladders (the retrieval pack did not carry the per-model calibration
/// source files, only the base-class interface), not literal hardware
/// constants — see `DESIGN.md`.
struct ModelSpec {
    name: &'static str,
    best_mode: RfMode,
    supports_vhf: bool,
    rf_attn_hf: &'static [f32],
    rf_attn_vhf: &'static [f32],
    if_gain_hf: &'static [f32],
    if_gain_vhf: &'static [f32],
    gain_dbfs: f32,
}

const NO_STEPS: &[f32] = &[0.0];

const HF103_SPEC: ModelSpec = ModelSpec {
    name: "HF103",
    best_mode: RfMode::Hf,
    supports_vhf: false,
    rf_attn_hf: &[0.0, -3.0, -6.0, -9.0, -12.0, -15.0, -18.0, -21.0, -24.0, -27.0, -30.0],
    rf_attn_vhf: NO_STEPS,
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0],
    if_gain_vhf: NO_STEPS,
    gain_dbfs: 1.0,
};

const BBRF103_SPEC: ModelSpec = ModelSpec {
    name: "BBRF103",
    best_mode: RfMode::Hf,
    supports_vhf: true,
    rf_attn_hf: &[0.0, -3.0, -6.0, -9.0, -12.0, -15.0, -18.0, -21.0, -24.0, -27.0, -30.0],
    rf_attn_vhf: &[0.0, -6.0, -12.0, -18.0, -24.0, -30.0],
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0],
    if_gain_vhf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
    gain_dbfs: 1.0,
};

const RX888_SPEC: ModelSpec = ModelSpec {
    name: "RX888",
    best_mode: RfMode::Hf,
    supports_vhf: false,
    rf_attn_hf: NO_STEPS,
    rf_attn_vhf: NO_STEPS,
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0, 27.0, 30.0],
    if_gain_vhf: NO_STEPS,
    gain_dbfs: 1.0,
};

const RX888R2_SPEC: ModelSpec = ModelSpec {
    name: "RX888R2",
    best_mode: RfMode::Hf,
    supports_vhf: true,
    rf_attn_hf: NO_STEPS,
    rf_attn_vhf: &[0.0, -6.0, -12.0, -18.0, -24.0, -30.0],
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0, 27.0, 30.0],
    if_gain_vhf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
    gain_dbfs: 1.0,
};

const RX888R3_SPEC: ModelSpec = ModelSpec {
    name: "RX888R3",
    best_mode: RfMode::Hf,
    supports_vhf: true,
    rf_attn_hf: NO_STEPS,
    rf_attn_vhf: &[0.0, -6.0, -12.0, -18.0, -24.0, -30.0],
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0, 27.0, 30.0],
    if_gain_vhf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0],
    gain_dbfs: 1.0,
};

const RX999_SPEC: ModelSpec = ModelSpec {
    name: "RX999",
    best_mode: RfMode::Vhf,
    supports_vhf: true,
    rf_attn_hf: &[0.0, -3.0, -6.0, -9.0, -12.0, -15.0],
    rf_attn_vhf: &[0.0, -6.0, -12.0, -18.0, -24.0, -30.0, -36.0, -42.0],
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0],
    if_gain_vhf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0],
    gain_dbfs: 1.0,
};

const LUCY_SPEC: ModelSpec = ModelSpec {
    name: "Lucy",
    best_mode: RfMode::Hf,
    supports_vhf: false,
    rf_attn_hf: &[0.0, -3.0, -6.0, -9.0, -12.0],
    rf_attn_vhf: NO_STEPS,
    if_gain_hf: &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
    if_gain_vhf: NO_STEPS,
    gain_dbfs: 1.0,
};

const DUMMY_SPEC: ModelSpec = ModelSpec {
    name: "Dummy",
    best_mode: RfMode::Hf,
    supports_vhf: true,
    rf_attn_hf: &[0.0, -10.0, -20.0],
    rf_attn_vhf: &[0.0, -10.0, -20.0],
    if_gain_hf: &[0.0, 10.0, 20.0],
    if_gain_vhf: &[0.0, 10.0, 20.0],
    gain_dbfs: 1.0,
};

/// A concrete front-end device. Construct through [`FrontEndDevice::from_model_name`]
/// using the model tag carried in `DriverConfig::front_end_model`.
pub enum FrontEndDevice {
    Hf103(CommonState),
    Bbrf103(CommonState),
    Rx888(CommonState),
    Rx888R2(CommonState),
    Rx888R3(CommonState),
    Rx999(CommonState),
    Lucy(CommonState),
    Dummy(CommonState),
}

impl FrontEndDevice {
    pub fn from_model_name(model: &str) -> DriverResult<Self> {
        let state = CommonState::default();
        Ok(match model.to_ascii_lowercase().as_str() {
            "hf103" => FrontEndDevice::Hf103(state),
            "bbrf103" => FrontEndDevice::Bbrf103(state),
            "rx888" => FrontEndDevice::Rx888(state),
            "rx888r2" => FrontEndDevice::Rx888R2(state),
            "rx888r3" => FrontEndDevice::Rx888R3(state),
            "rx999" => FrontEndDevice::Rx999(state),
            "lucy" => FrontEndDevice::Lucy(state),
            "dummy" => FrontEndDevice::Dummy(state),
            _ => return Err(DriverError::NotCompatible),
        })
    }

    fn spec(&self) -> &'static ModelSpec {
        match self {
            FrontEndDevice::Hf103(_) => &HF103_SPEC,
            FrontEndDevice::Bbrf103(_) => &BBRF103_SPEC,
            FrontEndDevice::Rx888(_) => &RX888_SPEC,
            FrontEndDevice::Rx888R2(_) => &RX888R2_SPEC,
            FrontEndDevice::Rx888R3(_) => &RX888R3_SPEC,
            FrontEndDevice::Rx999(_) => &RX999_SPEC,
            FrontEndDevice::Lucy(_) => &LUCY_SPEC,
            FrontEndDevice::Dummy(_) => &DUMMY_SPEC,
        }
    }

    fn state(&self) -> &CommonState {
        match self {
            FrontEndDevice::Hf103(s)
            | FrontEndDevice::Bbrf103(s)
            | FrontEndDevice::Rx888(s)
            | FrontEndDevice::Rx888R2(s)
            | FrontEndDevice::Rx888R3(s)
            | FrontEndDevice::Rx999(s)
            | FrontEndDevice::Lucy(s)
            | FrontEndDevice::Dummy(s) => s,
        }
    }

    fn state_mut(&mut self) -> &mut CommonState {
        match self {
            FrontEndDevice::Hf103(s)
            | FrontEndDevice::Bbrf103(s)
            | FrontEndDevice::Rx888(s)
            | FrontEndDevice::Rx888R2(s)
            | FrontEndDevice::Rx888R3(s)
            | FrontEndDevice::Rx999(s)
            | FrontEndDevice::Lucy(s)
            | FrontEndDevice::Dummy(s) => s,
        }
    }
}

impl FrontEnd for FrontEndDevice {
    fn name(&self) -> &'static str {
        self.spec().name
    }

    fn best_rf_mode(&self) -> RfMode {
        self.spec().best_mode
    }

    fn supports_mode(&self, mode: RfMode) -> bool {
        match mode {
            RfMode::Hf => true,
            RfMode::Vhf => self.spec().supports_vhf,
        }
    }

    fn rf_mode(&self) -> RfMode {
        self.state().rf_mode
    }

    fn set_rf_mode(&mut self, mode: RfMode) -> DriverResult<()> {
        if !self.supports_mode(mode) {
            return Err(DriverError::NotCompatible);
        }
        self.state_mut().rf_mode = mode;
        Ok(())
    }

    fn adc_sample_rate(&self) -> u64 {
        self.state().adc_sample_rate
    }

    fn set_adc_sample_rate(&mut self, rate_hz: u64) -> DriverResult<()> {
        if rate_hz == 0 {
            return Err(DriverError::NotCompatible);
        }
        self.state_mut().adc_sample_rate = rate_hz;
        Ok(())
    }

    fn set_lo_freq(&mut self, mode: RfMode, freq_hz: u64) -> DriverResult<u64> {
        if !self.supports_mode(mode) {
            return Err(DriverError::NotCompatible);
        }
        let st = self.state_mut();
        match mode {
            RfMode::Hf => st.lo_freq_hf = freq_hz,
            RfMode::Vhf => st.lo_freq_vhf = freq_hz,
        }
        Ok(self.lo_freq(mode))
    }

    fn lo_freq(&self, mode: RfMode) -> u64 {
        match mode {
            RfMode::Hf => self.state().lo_freq_hf,
            RfMode::Vhf => self.state().lo_freq_vhf,
        }
    }

    fn rf_attenuation_steps(&self, mode: RfMode) -> &'static [f32] {
        match mode {
            RfMode::Hf => self.spec().rf_attn_hf,
            RfMode::Vhf => self.spec().rf_attn_vhf,
        }
    }

    fn rf_attenuation_step_index(&self, mode: RfMode) -> usize {
        match mode {
            RfMode::Hf => self.state().rf_attn_step_hf,
            RfMode::Vhf => self.state().rf_attn_step_vhf,
        }
    }

    /// Sets the attenuator step for `mode`'s own attenuator network. VHF
    /// requests write `rf_attn_step_vhf` and never fall through to the HF
    /// field, even on models that happen to share a step count between
    /// modes — this is the fix for the routing defect the original driver
    /// had around VHF attenuation.
    fn set_rf_attenuation(&mut self, mode: RfMode, step: usize) -> DriverResult<()> {
        if !self.supports_mode(mode) {
            return Err(DriverError::NotCompatible);
        }
        if step >= self.rf_attenuation_steps(mode).len() {
            return Err(DriverError::NotCompatible);
        }
        let st = self.state_mut();
        match mode {
            RfMode::Hf => st.rf_attn_step_hf = step,
            RfMode::Vhf => st.rf_attn_step_vhf = step,
        }
        Ok(())
    }

    fn if_gain_steps(&self, mode: RfMode) -> &'static [f32] {
        match mode {
            RfMode::Hf => self.spec().if_gain_hf,
            RfMode::Vhf => self.spec().if_gain_vhf,
        }
    }

    fn if_gain_step_index(&self, mode: RfMode) -> usize {
        match mode {
            RfMode::Hf => self.state().if_gain_step_hf,
            RfMode::Vhf => self.state().if_gain_step_vhf,
        }
    }

    fn set_if_gain(&mut self, mode: RfMode, step: usize) -> DriverResult<()> {
        if !self.supports_mode(mode) {
            return Err(DriverError::NotCompatible);
        }
        if step >= self.if_gain_steps(mode).len() {
            return Err(DriverError::NotCompatible);
        }
        let st = self.state_mut();
        match mode {
            RfMode::Hf => st.if_gain_step_hf = step,
            RfMode::Vhf => st.if_gain_step_vhf = step,
        }
        Ok(())
    }

    fn bias_t(&self, mode: RfMode) -> bool {
        match mode {
            RfMode::Hf => self.state().bias_t_hf,
            RfMode::Vhf => self.state().bias_t_vhf,
        }
    }

    fn set_bias_t(&mut self, mode: RfMode, on: bool) -> DriverResult<()> {
        if !self.supports_mode(mode) {
            return Err(DriverError::NotCompatible);
        }
        let st = self.state_mut();
        match mode {
            RfMode::Hf => st.bias_t_hf = on,
            RfMode::Vhf => st.bias_t_vhf = on,
        }
        Ok(())
    }

    fn dither(&self) -> bool {
        self.state().dither
    }

    fn set_dither(&mut self, on: bool) -> DriverResult<()> {
        self.state_mut().dither = on;
        Ok(())
    }

    fn pga(&self) -> bool {
        self.state().pga
    }

    fn set_pga(&mut self, on: bool) -> DriverResult<()> {
        self.state_mut().pga = on;
        Ok(())
    }

    fn rand(&self) -> bool {
        self.state().rand
    }

    fn set_rand(&mut self, on: bool) -> DriverResult<()> {
        self.state_mut().rand = on;
        Ok(())
    }

    fn set_led(&mut self, _led: Led) -> DriverResult<()> {
        Ok(())
    }

    fn gain_dbfs(&self) -> f32 {
        self.spec().gain_dbfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_name_is_rejected() {
        assert!(FrontEndDevice::from_model_name("not-a-real-board").is_err());
    }

    #[test]
    fn vhf_only_step_is_independent_of_hf_step() {
        let mut dev = FrontEndDevice::from_model_name("bbrf103").unwrap();
        dev.set_rf_attenuation(RfMode::Hf, 2).unwrap();
        dev.set_rf_attenuation(RfMode::Vhf, 1).unwrap();
        assert_eq!(dev.rf_attenuation_step_index(RfMode::Hf), 2);
        assert_eq!(dev.rf_attenuation_step_index(RfMode::Vhf), 1);
    }

    #[test]
    fn vhf_only_models_reject_vhf_operations_when_unsupported() {
        let mut dev = FrontEndDevice::from_model_name("hf103").unwrap();
        assert!(!dev.supports_mode(RfMode::Vhf));
        assert!(dev.set_rf_mode(RfMode::Vhf).is_err());
        assert!(dev.set_rf_attenuation(RfMode::Vhf, 0).is_err());
        assert!(dev.set_bias_t(RfMode::Vhf, true).is_err());
    }

    #[test]
    fn step_index_out_of_range_is_rejected() {
        let mut dev = FrontEndDevice::from_model_name("dummy").unwrap();
        let n = dev.rf_attenuation_steps(RfMode::Hf).len();
        assert!(dev.set_rf_attenuation(RfMode::Hf, n).is_err());
    }

    #[test]
    fn rx999_prefers_vhf_by_default() {
        let dev = FrontEndDevice::from_model_name("rx999").unwrap();
        assert_eq!(dev.best_rf_mode(), RfMode::Vhf);
    }

    #[test]
    fn lo_freq_set_and_readback_round_trips_per_mode() {
        let mut dev = FrontEndDevice::from_model_name("bbrf103").unwrap();
        dev.set_rf_mode(RfMode::Vhf).unwrap();
        let readback = dev.set_lo_freq(RfMode::Vhf, 100_000_000).unwrap();
        assert_eq!(readback, 100_000_000);
        assert_eq!(dev.lo_freq(RfMode::Hf), 0);
    }
}
