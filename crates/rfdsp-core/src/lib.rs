//! Core types shared across the driver: DSP numeric aliases, the closed
//! error taxonomy, structured logging setup, and the block ring buffer.

pub mod debug;
pub mod dsp_types;
pub mod error;
pub mod ring;

pub use dsp_types::{ComplexSample, RawSample, RealSample, SampleCount};
pub use error::{DriverError, DriverResult};
pub use ring::BlockRing;
