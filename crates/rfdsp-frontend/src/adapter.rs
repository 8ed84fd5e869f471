//! Front-end adapter capability trait (C7): the common surface every
//! supported ADC board exposes to the stream controller, regardless of
//! which transport or calibration table backs it.

use rfdsp_config::RfMode;
use rfdsp_core::error::DriverResult;

/// Front-panel indicator a front-end may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Yellow,
    Red,
    Blue,
}

/// Capability surface shared by every front-end model. A front-end that
/// does not physically implement a knob (e.g. a VHF-only attenuator table
/// queried in HF mode) answers with [`rfdsp_core::error::DriverError::NotCompatible`]
/// rather than silently degrading to a neighboring mode's behavior — this
/// is the fix for the VHF-attenuation routing defect called out against
/// the original driver.
pub trait FrontEnd: Send {
    fn name(&self) -> &'static str;

    /// The RF mode this front-end should be placed in absent any explicit
    /// request, e.g. the mode its antenna port and LNA path are tuned for.
    fn best_rf_mode(&self) -> RfMode;

    fn supports_mode(&self, mode: RfMode) -> bool;

    fn rf_mode(&self) -> RfMode;
    fn set_rf_mode(&mut self, mode: RfMode) -> DriverResult<()>;

    fn adc_sample_rate(&self) -> u64;
    fn set_adc_sample_rate(&mut self, rate_hz: u64) -> DriverResult<()>;

    /// Program the local oscillator (HF: direct-sampling passthrough
    /// frequency; VHF: heterodyne IF carrier) and read back the carrier the
    /// hardware actually settled on.
    fn set_lo_freq(&mut self, mode: RfMode, freq_hz: u64) -> DriverResult<u64>;
    fn lo_freq(&self, mode: RfMode) -> u64;

    /// RF attenuator steps, in dB, for the given mode's attenuator network.
    fn rf_attenuation_steps(&self, mode: RfMode) -> &'static [f32];
    fn rf_attenuation_step_index(&self, mode: RfMode) -> usize;
    fn set_rf_attenuation(&mut self, mode: RfMode, step: usize) -> DriverResult<()>;

    /// IF/baseband gain steps, in dB, for the given mode's gain stage.
    fn if_gain_steps(&self, mode: RfMode) -> &'static [f32];
    fn if_gain_step_index(&self, mode: RfMode) -> usize;
    fn set_if_gain(&mut self, mode: RfMode, step: usize) -> DriverResult<()>;

    fn bias_t(&self, mode: RfMode) -> bool;
    fn set_bias_t(&mut self, mode: RfMode, on: bool) -> DriverResult<()>;

    fn dither(&self) -> bool;
    fn set_dither(&mut self, on: bool) -> DriverResult<()>;

    fn pga(&self) -> bool;
    fn set_pga(&mut self, on: bool) -> DriverResult<()>;

    fn rand(&self) -> bool;
    fn set_rand(&mut self, on: bool) -> DriverResult<()>;

    fn set_led(&mut self, led: Led) -> DriverResult<()>;

    /// ADC full-scale-to-dBFS gain used to normalize filter kernel taps so
    /// the DSP path sees a consistent scale regardless of front-end.
    fn gain_dbfs(&self) -> f32;
}
