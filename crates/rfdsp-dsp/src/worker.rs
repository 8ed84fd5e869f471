//! DSP worker (C4): the overlap-save real→complex convolution/decimation/
//! tuning engine. Consumes real blocks from the real ring, produces I/Q
//! blocks on the I/Q ring.

use std::sync::{Arc, Mutex};

use num_complex::Complex;
use realfft::RealToComplex;
use rustfft::Fft;

use rfdsp_core::dsp_types::{
    half_fft_size_for_decimation, output_scrap_for_decimation, ComplexSample, RawSample,
    BASE_FFT_SAVE_SIZE, BASE_FFT_SCRAP_SIZE, BASE_FFT_SIZE,
};
use rfdsp_core::ring::BlockRing;

use crate::fft_plans::FftPlans;
use crate::filter_bank::FilterBank;

/// Shared DSP parameters, written only by the controller under this
/// mutex and sampled once per input block by every worker (`mutexR2iqControl`
/// in the original design).
#[derive(Debug, Clone, Copy)]
pub struct WorkerParams {
    pub decimation: usize,
    /// Lower-sideband flag: when set, Q is negated to mirror the spectrum.
    pub lsb: bool,
    pub rand: bool,
    /// Always a multiple of 4, in `[0, BASE_FFT_SIZE/2]`.
    pub center_frequency_bin: i32,
}

impl Default for WorkerParams {
    fn default() -> Self {
        Self {
            decimation: 0,
            lsb: false,
            rand: false,
            center_frequency_bin: 0,
        }
    }
}

fn convert_samples(src: &[RawSample], rand: bool, dst: &mut [f32]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        let v = if rand && (s & 1) != 0 { s ^ (-2i16) } else { s };
        *d = v as f32;
    }
}

/// Copy the per-bin shift-and-filter-multiply result for one FFT window
/// into `shifted[0..two_h]`, per spec step 3. `shifted` must already be
/// zeroed for its full `two_h` length (the zero-padding is "for free").
fn shift_filter_decimate(
    freq: &[Complex<f32>],
    kernel: &[Complex<f32>],
    center_bin: usize,
    h: usize,
    shifted: &mut [Complex<f32>],
) {
    let half = freq.len() - 1; // BASE_FFT_SIZE / 2
    let two_h = 2 * h;

    // Upper half: positions [0, upper_count), bins [c, c+upper_count).
    let upper_count = (half - center_bin).min(h);
    for i in 0..upper_count {
        shifted[i] = freq[center_bin + i] * kernel[i];
    }

    // Lower half: bins starting at max(c-H, 0), positions starting at
    // H + max(H-c, 0), for as many steps as both bounds allow.
    let c = center_bin as isize;
    let h_i = h as isize;
    let half_i = half as isize;
    let shift = c - h_i;
    let b0 = shift.max(0) as usize;
    let pos0 = h + (h_i - c).max(0) as usize;
    let count = (two_h.saturating_sub(pos0)).min(half.saturating_sub(b0));
    for i in 0..count {
        let b = b0 + i;
        let pos = pos0 + i;
        let filt_idx = (b as isize - shift + (half_i - h_i)) as usize;
        shifted[pos] = freq[b] * kernel[filt_idx];
    }
}

/// Owns the scratch buffers and shared collaborators of one DSP worker
/// thread. `N_MAX_R2IQ_THREADS` such workers may exist, but only `K=1` is
/// the supported/tested configuration for in-order I/Q delivery (§5).
pub struct DspWorker {
    real_ring: Arc<BlockRing<RawSample>>,
    iq_ring: Arc<BlockRing<ComplexSample>>,
    filters: Arc<FilterBank>,
    plans: Arc<FftPlans>,
    params: Arc<Mutex<WorkerParams>>,
}

impl DspWorker {
    pub fn new(
        real_ring: Arc<BlockRing<RawSample>>,
        iq_ring: Arc<BlockRing<ComplexSample>>,
        filters: Arc<FilterBank>,
        plans: Arc<FftPlans>,
        params: Arc<Mutex<WorkerParams>>,
    ) -> Self {
        Self {
            real_ring,
            iq_ring,
            filters,
            plans,
            params,
        }
    }

    /// Run until the real ring is stopped. No recoverable failure mode:
    /// the worker exits cleanly once `read_slot()` returns `None`.
    pub fn run(&self) {
        let block_size = self.real_ring.block_size();
        let windows_per_block = block_size / BASE_FFT_SAVE_SIZE;
        let out_block_size = self.iq_ring.block_size();

        let mut time_buf = vec![0f32; block_size + BASE_FFT_SCRAP_SIZE];
        let mut freq_buf = self.plans.new_forward_output();
        let mut shifted = vec![Complex::new(0.0f32, 0.0f32); BASE_FFT_SIZE / 2];

        let mut out_slot = None;
        let mut out_pos = 0usize;

        'outer: while let Some(read_guard) = self.real_ring.read_slot() {
            let params = *self.params.lock().unwrap();

            if let Some(prev) = read_guard.peek_sibling(-1) {
                let prev_len = prev.len();
                let start = prev_len.saturating_sub(BASE_FFT_SCRAP_SIZE);
                let taken = prev_len - start;
                convert_samples(&prev[start..], params.rand, &mut time_buf[..taken]);
                if taken < BASE_FFT_SCRAP_SIZE {
                    for v in time_buf[taken..BASE_FFT_SCRAP_SIZE].iter_mut() {
                        *v = 0.0;
                    }
                }
            }
            convert_samples(
                &read_guard,
                params.rand,
                &mut time_buf[BASE_FFT_SCRAP_SIZE..],
            );
            drop(read_guard);

            let d = params.decimation;
            let h = half_fft_size_for_decimation(d);
            let two_h = 2 * h;
            let scrap_out = output_scrap_for_decimation(d);
            let kernel = self.filters.kernel(d);

            for k in 0..windows_per_block {
                let base = k * BASE_FFT_SAVE_SIZE;
                let mut window = time_buf[base..base + BASE_FFT_SIZE].to_vec();
                if self
                    .plans
                    .forward
                    .process(&mut window, &mut freq_buf)
                    .is_err()
                {
                    break 'outer;
                }

                for v in shifted[..two_h].iter_mut() {
                    *v = Complex::new(0.0, 0.0);
                }
                shift_filter_decimate(
                    &freq_buf,
                    kernel,
                    params.center_frequency_bin as usize,
                    h,
                    &mut shifted[..two_h],
                );

                self.plans.inverse[d].process(&mut shifted[..two_h]);

                let mut produced = &shifted[scrap_out..two_h];
                while !produced.is_empty() {
                    if out_slot.is_none() {
                        out_slot = self.iq_ring.write_slot();
                        out_pos = 0;
                        if out_slot.is_none() {
                            break 'outer;
                        }
                    }
                    let slot = out_slot.as_mut().unwrap();
                    let room = out_block_size - out_pos;
                    let take = room.min(produced.len());
                    for (dst, src) in slot[out_pos..out_pos + take]
                        .iter_mut()
                        .zip(produced[..take].iter())
                    {
                        *dst = if params.lsb {
                            ComplexSample::new(src.re, -src.im)
                        } else {
                            *src
                        };
                    }
                    out_pos += take;
                    produced = &produced[take..];
                    if out_pos == out_block_size {
                        out_slot = None;
                        out_pos = 0;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_filter_decimate_handles_boundary_centers() {
        let half = BASE_FFT_SIZE / 2;
        let h = half / 4; // decimation index 1
        let freq = vec![Complex::new(1.0f32, 0.0); half + 1];
        let kernel = vec![Complex::new(1.0f32, 0.0); half];
        let mut shifted = vec![Complex::new(0.0f32, 0.0); 2 * h];

        shift_filter_decimate(&freq, &kernel, 0, h, &mut shifted);
        assert!(shifted.iter().all(|c| c.re.is_finite() && c.im.is_finite()));

        let mut shifted2 = vec![Complex::new(0.0f32, 0.0); 2 * h];
        shift_filter_decimate(&freq, &kernel, half, h, &mut shifted2);
        assert!(shifted2.iter().all(|c| c.re.is_finite() && c.im.is_finite()));
    }

    #[test]
    fn convert_samples_applies_xor_only_to_odd_lsb() {
        let src = [3i16, 4i16, -5i16];
        let mut dst = [0f32; 3];
        convert_samples(&src, true, &mut dst);
        assert_eq!(dst[0], (3i16 ^ -2i16) as f32);
        assert_eq!(dst[1], 4.0);
        assert_eq!(dst[2], (-5i16 ^ -2i16) as f32);

        let mut dst2 = [0f32; 3];
        convert_samples(&src, false, &mut dst2);
        assert_eq!(dst2, [3.0, 4.0, -5.0]);
    }
}
