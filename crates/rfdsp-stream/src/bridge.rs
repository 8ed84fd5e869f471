//! Internal sink-to-stream bridge: a bounded queue of pre-sized byte
//! blocks feeding a poll-style `read_stream` consumer (the shape an SDR
//! plugin ABI wrapper would sit behind; that wrapper itself is out of
//! scope here, only this bridge is).

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Number of prealloc'd slots the bridge holds before it starts dropping
/// the oldest unread one and latching an overflow.
pub const BRIDGE_SLOTS: usize = 16;

/// Outcome of a [`ClientBridge::read_stream`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(Vec<u8>),
    /// The bridge dropped one or more blocks since the last successful
    /// read; the queue is flushed along with this result.
    Overflow,
    Timeout,
}

struct BridgeState {
    slots: VecDeque<Vec<u8>>,
    overflow: bool,
}

/// Bounded MTU-sized block queue between a producer callback (invoked from
/// the sink-delivery thread) and a polling consumer.
pub struct ClientBridge {
    mtu: usize,
    state: Mutex<BridgeState>,
    not_empty: Condvar,
}

impl ClientBridge {
    pub fn new(mtu: usize) -> Self {
        Self {
            mtu,
            state: Mutex::new(BridgeState {
                slots: VecDeque::with_capacity(BRIDGE_SLOTS),
                overflow: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Push one block. If the queue is already at capacity, the oldest
    /// unread slot is dropped and the overflow flag is latched.
    pub fn push(&self, data: &[u8]) {
        let mut st = self.state.lock().unwrap();
        if st.slots.len() >= BRIDGE_SLOTS {
            st.slots.pop_front();
            st.overflow = true;
        }
        st.slots.push_back(data.to_vec());
        drop(st);
        self.not_empty.notify_one();
    }

    /// Wait up to `timeout` for a block. An overflow since the last read
    /// is reported once, clearing the queue.
    pub fn read_stream(&self, timeout: Duration) -> ReadOutcome {
        let st = self.state.lock().unwrap();
        let (mut st, wait_result) = self
            .not_empty
            .wait_timeout_while(st, timeout, |s| s.slots.is_empty() && !s.overflow)
            .unwrap();

        if st.overflow {
            st.overflow = false;
            st.slots.clear();
            return ReadOutcome::Overflow;
        }
        if wait_result.timed_out() && st.slots.is_empty() {
            return ReadOutcome::Timeout;
        }
        match st.slots.pop_front() {
            Some(data) => ReadOutcome::Data(data),
            None => ReadOutcome::Timeout,
        }
    }

    /// Current queued-block count, for diagnostics and tests.
    pub fn count(&self) -> usize {
        self.state.lock().unwrap().slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_read_round_trips() {
        let bridge = ClientBridge::new(4);
        bridge.push(&[1, 2, 3, 4]);
        assert_eq!(
            bridge.read_stream(Duration::from_millis(10)),
            ReadOutcome::Data(vec![1, 2, 3, 4])
        );
    }

    #[test]
    fn read_with_no_data_times_out() {
        let bridge = ClientBridge::new(4);
        assert_eq!(
            bridge.read_stream(Duration::from_millis(5)),
            ReadOutcome::Timeout
        );
    }

    #[test]
    fn overflow_latches_and_drains_queue() {
        let bridge = ClientBridge::new(1);
        for i in 0..(BRIDGE_SLOTS + 1) {
            bridge.push(&[i as u8]);
        }
        assert_eq!(bridge.count(), BRIDGE_SLOTS);
        let outcome = bridge.read_stream(Duration::from_millis(10));
        assert_eq!(outcome, ReadOutcome::Overflow);
        assert_eq!(bridge.count(), 0);
    }

    #[test]
    fn overflow_flag_clears_after_being_reported() {
        let bridge = ClientBridge::new(1);
        for i in 0..(BRIDGE_SLOTS + 2) {
            bridge.push(&[i as u8]);
        }
        assert_eq!(bridge.read_stream(Duration::from_millis(10)), ReadOutcome::Overflow);
        bridge.push(&[42]);
        assert_eq!(
            bridge.read_stream(Duration::from_millis(10)),
            ReadOutcome::Data(vec![42])
        );
    }
}
