//! Fixed-capacity, N-slot, single-producer/single-consumer block ring (C1).
//!
//! Translated from a raw-pointer C++ ring buffer into owned storage plus
//! RAII slot handles: `write_slot()`/`read_slot()` return guards that commit
//! the index advance on `Drop`, so a caller cannot forget to release a slot.
//! No `unsafe` — each slot is its own `Mutex<Vec<T>>`, and index bookkeeping
//! lives in a separate `Mutex<RingState>` guarded by two `Condvar`s.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::{DriverError, DriverResult};

/// Number of busy-spin iterations attempted before parking on a condvar.
const SPIN_ITERS: usize = 100;

#[derive(Debug, Clone, Copy)]
struct RingState {
    read: usize,
    write: usize,
    write_count: u64,
    read_count: u64,
    stopped: bool,
    block_size: usize,
}

/// A fixed-capacity ring of `n` slots, each holding `block_size` elements.
pub struct BlockRing<T> {
    n: usize,
    state: Mutex<RingState>,
    not_full: Condvar,
    not_empty: Condvar,
    slots: Vec<Mutex<Vec<T>>>,
}

impl<T> BlockRing<T>
where
    T: Clone + Default,
{
    /// Create a ring with `n` slots (n >= 2) and no block size set yet.
    /// The ring starts in the stopped state; call [`start`](Self::start)
    /// once `set_block_size` has been called.
    pub fn new(n: usize) -> Self {
        assert!(n >= 2, "ring must have at least 2 slots");
        Self {
            n,
            state: Mutex::new(RingState {
                read: 0,
                write: 0,
                write_count: 0,
                read_count: 0,
                stopped: true,
                block_size: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            slots: (0..n).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// Set the per-slot block size. Idempotent if unchanged; otherwise
    /// reallocates every slot's backing storage and resets the indices.
    pub fn set_block_size(&self, block_size: usize) -> DriverResult<()> {
        if block_size == 0 {
            return Err(DriverError::BufferSizeInvalid);
        }
        {
            let mut st = self.state.lock().unwrap();
            if st.block_size == block_size {
                return Ok(());
            }
            st.block_size = block_size;
            st.read = 0;
            st.write = 0;
            st.write_count = 0;
            st.read_count = 0;
        }
        for slot in &self.slots {
            let mut v = slot.lock().unwrap();
            *v = vec![T::default(); block_size];
        }
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        self.state.lock().unwrap().block_size
    }

    pub fn slot_count(&self) -> usize {
        self.n
    }

    /// Reset to empty and mark the ring running.
    pub fn start(&self) {
        let mut st = self.state.lock().unwrap();
        st.read = 0;
        st.write = 0;
        st.write_count = 0;
        st.read_count = 0;
        st.stopped = false;
    }

    /// Mark the ring stopped and wake every blocked waiter on both sides.
    pub fn stop(&self) {
        let mut st = self.state.lock().unwrap();
        st.stopped = true;
        // Force the write index away from `read` so a thread spinning on
        // the raw index comparison (not yet parked on a condvar) also
        // observes a state change.
        st.write = self.n / 2;
        drop(st);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().unwrap().stopped
    }

    /// `(write_count, read_count)`, for invariant checks and stats threads.
    pub fn counters(&self) -> (u64, u64) {
        let st = self.state.lock().unwrap();
        (st.write_count, st.read_count)
    }

    fn is_full(st: &RingState, n: usize) -> bool {
        (st.write + 1) % n == st.read
    }

    fn is_empty(st: &RingState) -> bool {
        st.read == st.write
    }

    /// Acquire the current producer slot, blocking while full. Returns
    /// `None` once the ring has been stopped.
    pub fn write_slot(&self) -> Option<WriteSlot<'_, T>> {
        for _ in 0..SPIN_ITERS {
            let st = self.state.lock().unwrap();
            if st.stopped {
                return None;
            }
            if !Self::is_full(&st, self.n) {
                let index = st.write;
                drop(st);
                let guard = self.slots[index].lock().unwrap();
                return Some(WriteSlot {
                    ring: self,
                    index,
                    guard,
                });
            }
        }
        let mut st = self.state.lock().unwrap();
        while !st.stopped && Self::is_full(&st, self.n) {
            st = self.not_full.wait(st).unwrap();
        }
        if st.stopped {
            return None;
        }
        let index = st.write;
        drop(st);
        let guard = self.slots[index].lock().unwrap();
        Some(WriteSlot {
            ring: self,
            index,
            guard,
        })
    }

    /// Acquire the current consumer slot, blocking while empty. Returns
    /// `None` once the ring has been stopped.
    pub fn read_slot(&self) -> Option<ReadSlot<'_, T>> {
        for _ in 0..SPIN_ITERS {
            let st = self.state.lock().unwrap();
            if st.stopped {
                return None;
            }
            if !Self::is_empty(&st) {
                let index = st.read;
                drop(st);
                let guard = self.slots[index].lock().unwrap();
                return Some(ReadSlot {
                    ring: self,
                    index,
                    guard,
                });
            }
        }
        let mut st = self.state.lock().unwrap();
        while !st.stopped && Self::is_empty(&st) {
            st = self.not_empty.wait(st).unwrap();
        }
        if st.stopped {
            return None;
        }
        let index = st.read;
        drop(st);
        let guard = self.slots[index].lock().unwrap();
        Some(ReadSlot {
            ring: self,
            index,
            guard,
        })
    }

    fn commit_write(&self, index: usize) {
        let mut st = self.state.lock().unwrap();
        let was_empty = Self::is_empty(&st);
        st.write = (index + 1) % self.n;
        st.write_count += 1;
        drop(st);
        if was_empty {
            self.not_empty.notify_all();
        }
    }

    fn commit_read(&self, index: usize) {
        let mut st = self.state.lock().unwrap();
        let was_full = Self::is_full(&st, self.n);
        st.read = (index + 1) % self.n;
        st.read_count += 1;
        drop(st);
        if was_full {
            self.not_full.notify_all();
        }
    }

    fn peek(&self, from_index: usize, offset: isize) -> Option<PeekSlot<'_, T>> {
        let n = self.n as isize;
        let idx = (((from_index as isize + offset) % n) + n) % n;
        let guard = self.slots[idx as usize].lock().ok()?;
        Some(PeekSlot { guard })
    }
}

/// RAII handle to the current producer slot. Committing (`write_done` in
/// the original design) happens automatically on `Drop`.
pub struct WriteSlot<'a, T> {
    ring: &'a BlockRing<T>,
    index: usize,
    guard: MutexGuard<'a, Vec<T>>,
}

impl<'a, T> Deref for WriteSlot<'a, T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.guard
    }
}

impl<'a, T> DerefMut for WriteSlot<'a, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.guard
    }
}

impl<'a, T> Drop for WriteSlot<'a, T> {
    fn drop(&mut self) {
        self.ring.commit_write(self.index);
    }
}

/// RAII handle to the current consumer slot. Releasing (`read_done` in the
/// original design) happens automatically on `Drop`.
pub struct ReadSlot<'a, T>
where
    T: Clone + Default,
{
    ring: &'a BlockRing<T>,
    index: usize,
    guard: MutexGuard<'a, Vec<T>>,
}

impl<'a, T> ReadSlot<'a, T>
where
    T: Clone + Default,
{
    /// Non-blocking, read-only borrow of a neighboring slot, e.g.
    /// `peek_sibling(-1)` for the scrap carried from the previous block.
    /// Valid only while this read handle is held.
    pub fn peek_sibling(&self, offset: isize) -> Option<PeekSlot<'_, T>> {
        self.ring.peek(self.index, offset)
    }
}

impl<'a, T> Deref for ReadSlot<'a, T>
where
    T: Clone + Default,
{
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.guard
    }
}

impl<'a, T> Drop for ReadSlot<'a, T>
where
    T: Clone + Default,
{
    fn drop(&mut self) {
        self.ring.commit_read(self.index);
    }
}

/// Non-blocking, read-only view of a ring slot obtained via
/// [`ReadSlot::peek_sibling`].
pub struct PeekSlot<'a, T> {
    guard: MutexGuard<'a, Vec<T>>,
}

impl<'a, T> Deref for PeekSlot<'a, T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_full_invariants() {
        let ring: BlockRing<i16> = BlockRing::new(4);
        ring.set_block_size(8).unwrap();
        ring.start();
        assert!(ring.is_stopped() == false);

        // fill until full (n-1 writes fit before wrap would collide with read)
        for _ in 0..3 {
            let mut w = ring.write_slot().unwrap();
            w[0] = 1;
        }
        let (wc, rc) = ring.counters();
        assert_eq!(wc, 3);
        assert_eq!(rc, 0);
        assert!((wc as i64 - rc as i64) >= 0 && (wc as i64 - rc as i64) <= 3);
    }

    #[test]
    fn write_then_read_round_trip() {
        let ring: BlockRing<i16> = BlockRing::new(4);
        ring.set_block_size(4).unwrap();
        ring.start();
        {
            let mut w = ring.write_slot().unwrap();
            w.copy_from_slice(&[1, 2, 3, 4]);
        }
        {
            let r = ring.read_slot().unwrap();
            assert_eq!(&*r, &[1, 2, 3, 4]);
        }
        let (wc, rc) = ring.counters();
        assert_eq!(wc, 1);
        assert_eq!(rc, 1);
    }

    #[test]
    fn peek_sibling_sees_previous_block() {
        let ring: BlockRing<i16> = BlockRing::new(4);
        ring.set_block_size(2).unwrap();
        ring.start();
        {
            let mut w = ring.write_slot().unwrap();
            w.copy_from_slice(&[10, 11]);
        }
        {
            let mut w = ring.write_slot().unwrap();
            w.copy_from_slice(&[20, 21]);
        }
        let r = ring.read_slot().unwrap();
        assert_eq!(&*r, &[10, 11]);
        // no prior slot has been committed relative to this one yet, but the
        // slot one step ahead (not yet read) is observable for diagnostics
        let sibling = r.peek_sibling(1).unwrap();
        assert_eq!(&*sibling, &[20, 21]);
    }

    #[test]
    fn stop_wakes_blocked_writer_and_reader() {
        let ring: Arc<BlockRing<i16>> = Arc::new(BlockRing::new(2));
        ring.set_block_size(1).unwrap();
        ring.start();

        // fill the ring so the next writer would block
        {
            let _w = ring.write_slot().unwrap();
        }

        let ring2 = Arc::clone(&ring);
        let writer = thread::spawn(move || ring2.write_slot().is_none());

        let ring3 = Arc::clone(&ring);
        let reader_ring = Arc::new(BlockRing::<i16>::new(2));
        reader_ring.set_block_size(1).unwrap();
        reader_ring.start();
        let reader_ring2 = Arc::clone(&reader_ring);
        let reader = thread::spawn(move || reader_ring2.read_slot().is_none());

        thread::sleep(std::time::Duration::from_millis(20));
        ring3.stop();
        reader_ring.stop();

        assert!(writer.join().unwrap());
        assert!(reader.join().unwrap());
    }

    #[test]
    fn stop_then_start_resets_counters() {
        let ring: BlockRing<i16> = BlockRing::new(4);
        ring.set_block_size(2).unwrap();
        ring.start();
        {
            let _w = ring.write_slot().unwrap();
        }
        ring.stop();
        ring.start();
        let (wc, rc) = ring.counters();
        assert_eq!(wc, 0);
        assert_eq!(rc, 0);
    }
}
