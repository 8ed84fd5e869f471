//! Stand-in for the out-of-scope USB transport: while the Dummy front-end
//! is selected, fills the real ring with a constant sample value so the
//! rest of the pipeline (C1-C5) can be exercised end to end without real
//! hardware (S1-S4).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rfdsp_core::dsp_types::RawSample;
use rfdsp_core::ring::BlockRing;

/// Fixed pattern emitted by the Dummy front-end's simulated ADC stream.
pub const DUMMY_SAMPLE_VALUE: RawSample = 0x5A5A;

/// Runs until `running` is cleared or the real ring is stopped, whichever
/// happens first. Backpressure from the ring (blocking in `write_slot`)
/// is the only pacing; there is no real ADC clock to match in the Dummy
/// case.
pub fn run_dummy_producer(real_ring: &Arc<BlockRing<RawSample>>, running: &Arc<AtomicBool>) {
    while running.load(Ordering::Acquire) {
        let Some(mut slot) = real_ring.write_slot() else {
            break;
        };
        for s in slot.iter_mut() {
            *s = DUMMY_SAMPLE_VALUE;
        }
    }
}
