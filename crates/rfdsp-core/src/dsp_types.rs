use num_complex;

/// Sample type carried by the real ADC ring (C1).
pub type RawSample = i16;

/// Sample type used throughout the floating-point DSP path.
pub type RealSample = f32;

pub use std::f32::consts as sample_consts;

/// Complex baseband sample (C4/C5 output, I/Q ring element type).
pub type ComplexSample = num_complex::Complex<RealSample>;

/// Signed sample counter, wide enough to never wrap during a session.
pub type SampleCount = i64;

/// Number of decimation levels (`NDECIDX` in the glossary).
pub const NDECIDX: usize = 7;

/// Base forward FFT length (`BASE_FFT_SIZE`).
pub const BASE_FFT_SIZE: usize = 8192;

/// Half of the base FFT length; filter kernels live in this many bins.
pub const BASE_FFT_HALF_SIZE: usize = BASE_FFT_SIZE / 2;

/// Overlap-save scrap length carried between consecutive input blocks.
pub const BASE_FFT_SCRAP_SIZE: usize = 1024;

/// Net real samples consumed per forward-FFT window (`BASE_FFT_SIZE - BASE_FFT_SCRAP_SIZE`).
pub const BASE_FFT_SAVE_SIZE: usize = BASE_FFT_SIZE - BASE_FFT_SCRAP_SIZE;

/// Complex output FFT length for a given decimation index, `BASE_FFT_SIZE / 2^(d+1)`.
pub const fn fft_size_for_decimation(d: usize) -> usize {
    BASE_FFT_SIZE >> (d + 1)
}

/// Half of [`fft_size_for_decimation`], i.e. `H` in the overlap-save bin-shift algorithm.
pub const fn half_fft_size_for_decimation(d: usize) -> usize {
    fft_size_for_decimation(d) / 2
}

/// Overlap-save scrap length in the decimated output domain for decimation `d`.
pub const fn output_scrap_for_decimation(d: usize) -> usize {
    (BASE_FFT_SCRAP_SIZE / 2) >> d
}
