pub mod fft_plans;
pub mod filter_bank;
pub mod mixer;
pub mod worker;

pub use fft_plans::FftPlans;
pub use filter_bank::FilterBank;
pub use mixer::{quantize_offset, FineTuneMixer};
pub use worker::{DspWorker, WorkerParams};
