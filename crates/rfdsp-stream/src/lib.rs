pub mod bridge;
pub mod controller;
pub mod producer;
pub mod stats;

pub use bridge::{ClientBridge, ReadOutcome, BRIDGE_SLOTS};
pub use controller::StreamController;
pub use stats::StreamStats;
