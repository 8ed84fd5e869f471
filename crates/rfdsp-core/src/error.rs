use thiserror::Error;

/// Closed error taxonomy returned by every fallible driver operation.
///
/// There is no `Success` variant: Rust expresses "no error" as `Ok(())`,
/// not as a sentinel value of the error type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("underlying USB handle could not be claimed")]
    TransportOpenFailed,

    #[error("device is already in use")]
    TransportBusy,

    #[error("a control or bulk transfer returned a non-zero status")]
    TransportTransferFailed,

    #[error("operation is not supported by the current front-end mode")]
    NotCompatible,

    #[error("decimation index out of range (must be in [0, 7))")]
    DecimationOutOfRange,

    #[error("LED selector not in {{Yellow, Red, Blue}}")]
    NotAnLed,

    #[error("requested block size would violate ring buffer invariants")]
    BufferSizeInvalid,
}

pub type DriverResult<T> = Result<T, DriverError>;
