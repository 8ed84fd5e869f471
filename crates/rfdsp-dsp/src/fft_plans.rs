//! FFT plan cache (C3): one forward real→complex plan of length
//! `BASE_FFT_SIZE`, and one in-place complex inverse plan per decimation
//! index. Built once at session init and shared read-only for the
//! program's lifetime — both `rustfft` and `realfft` plans are `Send +
//! Sync` and may be driven concurrently from multiple worker threads given
//! distinct scratch buffers, which is the "new-array execute" contract
//! this design assumes of its FFT library.

use std::sync::Arc;

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use rfdsp_core::dsp_types::{fft_size_for_decimation, BASE_FFT_SIZE, NDECIDX};

pub struct FftPlans {
    pub forward: Arc<dyn RealToComplex<f32>>,
    pub inverse: Vec<Arc<dyn Fft<f32>>>,
}

impl FftPlans {
    pub fn new() -> Self {
        let mut real_planner = RealFftPlanner::<f32>::new();
        let forward = real_planner.plan_fft_forward(BASE_FFT_SIZE);

        let mut planner = FftPlanner::<f32>::new();
        let inverse = (0..NDECIDX)
            .map(|d| planner.plan_fft_inverse(fft_size_for_decimation(d)))
            .collect();

        Self { forward, inverse }
    }

    /// Scratch length required by the forward plan; callers that use
    /// `process_with_scratch` size their scratch buffer from this.
    pub fn forward_scratch_len(&self) -> usize {
        self.forward.get_scratch_len()
    }

    pub fn forward_output_len(&self) -> usize {
        BASE_FFT_SIZE / 2 + 1
    }

    pub fn forward_input_len(&self) -> usize {
        BASE_FFT_SIZE
    }

    /// Allocate an appropriately-sized output buffer for the forward plan.
    pub fn new_forward_output(&self) -> Vec<Complex<f32>> {
        self.forward.make_output_vec()
    }
}

impl Default for FftPlans {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_inverse_lengths_match_model() {
        let plans = FftPlans::new();
        assert_eq!(plans.inverse.len(), NDECIDX);
        for (d, plan) in plans.inverse.iter().enumerate() {
            assert_eq!(plan.len(), fft_size_for_decimation(d));
        }
        assert_eq!(plans.forward_output_len(), BASE_FFT_SIZE / 2 + 1);
    }

    #[test]
    fn forward_plan_processes_impulse() {
        let plans = FftPlans::new();
        let mut input = vec![0.0f32; BASE_FFT_SIZE];
        input[0] = 1.0;
        let mut output = plans.new_forward_output();
        plans.forward.process(&mut input, &mut output).unwrap();
        // DC bin of an impulse is 1.0 for every bin.
        assert!(output.iter().all(|c| (c.re - 1.0).abs() < 1e-3 && c.im.abs() < 1e-3));
    }
}
