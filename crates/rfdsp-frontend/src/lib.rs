pub mod adapter;
pub mod device;

pub use adapter::{FrontEnd, Led};
pub use device::FrontEndDevice;
