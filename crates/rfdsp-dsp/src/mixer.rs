//! Fine-tune residual mixer (C5): a sub-bin complex rotation applied to
//! dequeued I/Q blocks before delivery to the sink.

use std::sync::Mutex;

use rfdsp_core::dsp_types::{ComplexSample, BASE_FFT_HALF_SIZE};

struct FineTuneState {
    /// Normalized residual frequency in [-1, 1).
    residual: f64,
    /// Running unit-magnitude phasor, advanced by `residual` each sample.
    phasor: ComplexSample,
}

/// Residual sub-bin rotation applied in place to a decimated I/Q block.
/// Bypassed entirely (no-op, no lock contention beyond the read) when the
/// residual is zero.
pub struct FineTuneMixer {
    state: Mutex<FineTuneState>,
}

impl FineTuneMixer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FineTuneState {
                residual: 0.0,
                phasor: ComplexSample::new(1.0, 0.0),
            }),
        }
    }

    /// Update the residual frequency under the fine-tune mutex. The
    /// running phasor is reset to unit phase so retuning does not carry
    /// over a stale rotation reference.
    pub fn set_residual(&self, residual: f64) {
        let mut st = self.state.lock().unwrap();
        st.residual = residual;
        st.phasor = ComplexSample::new(1.0, 0.0);
    }

    pub fn residual(&self) -> f64 {
        self.state.lock().unwrap().residual
    }

    /// Rotate every sample of `block` by the running phasor, advancing it
    /// by `exp(j*2*pi*residual)` per sample.
    pub fn apply(&self, block: &mut [ComplexSample]) {
        let mut st = self.state.lock().unwrap();
        if st.residual == 0.0 {
            return;
        }
        let angle = 2.0 * std::f64::consts::PI * st.residual;
        let step = ComplexSample::new(angle.cos() as f32, angle.sin() as f32);
        for sample in block.iter_mut() {
            st.phasor *= step;
            *sample *= st.phasor;
        }
    }
}

impl Default for FineTuneMixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantize a requested normalized offset `o` (tuner carrier / half the
/// ADC sample rate) to the nearest multiple-of-4 FFT bin, and compute the
/// fine-tune residual left over after that quantization.
///
/// Returns `(center_frequency_bin, residual)`.
pub fn quantize_offset(offset: f64, decimation: usize, lsb: bool) -> (i32, f64) {
    let half = BASE_FFT_HALF_SIZE as f64;
    let raw = (offset * half / 4.0).round() * 4.0;
    let bin = raw.clamp(0.0, half) as i32;
    let mut residual = (bin as f64 / half - offset) * (1u64 << decimation) as f64;
    if lsb {
        residual = -residual;
    }
    (bin, residual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_error_is_within_four_bins() {
        let half = BASE_FFT_HALF_SIZE as f64;
        for millis in 0..1000 {
            let offset = millis as f64 / 1000.0;
            let (bin, _residual) = quantize_offset(offset, 0, false);
            let err = (bin as f64 / half - offset).abs();
            assert!(err <= 4.0 / (2.0 * half), "offset={offset} err={err}");
        }
    }

    #[test]
    fn bin_is_always_multiple_of_four_and_in_range() {
        for millis in 0..1000 {
            let offset = millis as f64 / 1000.0;
            let (bin, _) = quantize_offset(offset, 3, true);
            assert_eq!(bin % 4, 0);
            assert!(bin >= 0 && bin as usize <= BASE_FFT_HALF_SIZE);
        }
    }

    #[test]
    fn zero_residual_is_a_no_op() {
        let mixer = FineTuneMixer::new();
        let mut block = vec![ComplexSample::new(1.0, 2.0), ComplexSample::new(-1.0, 0.5)];
        let before = block.clone();
        mixer.apply(&mut block);
        assert_eq!(block, before);
    }

    #[test]
    fn nonzero_residual_rotates_samples() {
        let mixer = FineTuneMixer::new();
        mixer.set_residual(0.25);
        let mut block = vec![ComplexSample::new(1.0, 0.0); 4];
        mixer.apply(&mut block);
        // A quarter-turn-per-sample rotation should not leave samples
        // unchanged, and magnitude should be preserved.
        assert!(block.iter().any(|s| (s.re - 1.0).abs() > 1e-3 || s.im.abs() > 1e-3));
        for s in &block {
            assert!((s.norm() - 1.0).abs() < 1e-4);
        }
    }
}
