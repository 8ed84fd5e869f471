//! Stats thread: once a second (10x/sec in verbose mode), derives sample
//! rates from the ring buffers' own write/read counters and logs them.
//! Uses `crossbeam_channel::tick` instead of a raw sleep loop so it wakes
//! promptly on shutdown via `select!` over the tick and a stop channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, Receiver};

use rfdsp_core::dsp_types::{ComplexSample, RawSample};
use rfdsp_core::ring::BlockRing;

/// Rolling rates computed by the stats thread, in samples per second.
#[derive(Debug, Default)]
pub struct StreamStats {
    pub real_samples_per_sec: AtomicU64,
    pub iq_samples_per_sec: AtomicU64,
}

pub fn run_stats_loop(
    real_ring: Arc<BlockRing<RawSample>>,
    iq_ring: Arc<BlockRing<ComplexSample>>,
    stats: Arc<StreamStats>,
    verbose: bool,
    stop_rx: Receiver<()>,
) {
    let period = if verbose {
        Duration::from_millis(100)
    } else {
        Duration::from_secs(1)
    };
    let ticks = crossbeam_channel::tick(period);

    let mut last_real = real_ring.counters().0;
    let mut last_iq = iq_ring.counters().0;

    loop {
        select! {
            recv(ticks) -> _ => {
                let real_now = real_ring.counters().0;
                let iq_now = iq_ring.counters().0;
                let real_block_size = real_ring.block_size().max(1) as u64;
                let iq_block_size = iq_ring.block_size().max(1) as u64;

                let real_rate = real_now.saturating_sub(last_real) * real_block_size
                    * (1000 / period.as_millis().max(1) as u64).max(1);
                let iq_rate = iq_now.saturating_sub(last_iq) * iq_block_size
                    * (1000 / period.as_millis().max(1) as u64).max(1);

                stats.real_samples_per_sec.store(real_rate, Ordering::Relaxed);
                stats.iq_samples_per_sec.store(iq_rate, Ordering::Relaxed);
                tracing::debug!(real_rate, iq_rate, "stream stats tick");

                last_real = real_now;
                last_iq = iq_now;
            }
            recv(stop_rx) -> _ => {
                tracing::debug!("stats thread stopping");
                break;
            }
        }
    }
}
