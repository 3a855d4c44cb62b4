// Mon Jul 20 2026 - Alex

use crate::shm::ShmError;
use crate::sync::SharedSemaphore;
use std::sync::atomic::{AtomicU32, Ordering};

/// Multi-reader/single-writer admission gate using the first/last-reader
/// idiom: readers bump a shared counter under a short-held counting lock,
/// the first reader in takes the write lock on behalf of all readers, the
/// last reader out releases it. Writers take the write lock directly.
///
/// There is no writer priority: a continuous stream of readers starves a
/// writer indefinitely. That matches the protocol this gate implements and
/// is an accepted limitation, not a bug.
#[repr(C)]
pub struct ReadWriteGate {
    count_lock: SharedSemaphore,
    write_lock: SharedSemaphore,
    reader_count: AtomicU32,
}

impl ReadWriteGate {
    /// # Safety
    /// Same contract as [`SharedSemaphore::init`]: once, before sharing.
    pub unsafe fn init(&self) -> Result<(), ShmError> {
        self.count_lock.init(1)?;
        self.write_lock.init(1)?;
        self.reader_count.store(0, Ordering::Relaxed);
        Ok(())
    }

    pub fn begin_read(&self) {
        self.count_lock.acquire();
        if self.reader_count.fetch_add(1, Ordering::AcqRel) == 0 {
            self.write_lock.acquire();
        }
        self.count_lock.release();
    }

    pub fn end_read(&self) {
        self.count_lock.acquire();
        if self.reader_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.write_lock.release();
        }
        self.count_lock.release();
    }

    pub fn begin_write(&self) {
        self.write_lock.acquire();
    }

    pub fn end_write(&self) {
        self.write_lock.release();
    }

    pub fn reader_count(&self) -> u32 {
        self.reader_count.load(Ordering::Acquire)
    }

    /// # Safety
    /// See [`SharedSemaphore::destroy`].
    pub unsafe fn destroy(&self) {
        self.count_lock.destroy();
        self.write_lock.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::MaybeUninit;
    use std::time::{Duration, Instant};

    fn fresh() -> Box<ReadWriteGate> {
        let boxed: Box<MaybeUninit<ReadWriteGate>> = Box::new(MaybeUninit::zeroed());
        unsafe {
            let gate = Box::into_raw(boxed) as *mut ReadWriteGate;
            (*gate).init().unwrap();
            Box::from_raw(gate)
        }
    }

    #[test]
    fn test_readers_do_not_block_each_other() {
        let gate = fresh();
        gate.begin_read();
        gate.begin_read();
        assert_eq!(gate.reader_count(), 2);
        gate.end_read();
        gate.end_read();
        assert_eq!(gate.reader_count(), 0);
    }

    #[test]
    fn test_writer_blocks_until_readers_leave() {
        let gate = fresh();
        gate.begin_read();
        gate.begin_read();

        let hold = Duration::from_millis(150);
        std::thread::scope(|s| {
            let released_at = Instant::now() + hold;
            s.spawn(|| {
                std::thread::sleep(hold);
                gate.end_read();
                gate.end_read();
            });

            // Arrives while read-count is 2; must not proceed until it
            // returns to 0.
            gate.begin_write();
            assert!(Instant::now() >= released_at);
            assert_eq!(gate.reader_count(), 0);
            gate.end_write();
        });
    }

    #[test]
    fn test_readers_block_behind_active_writer() {
        let gate = fresh();
        gate.begin_write();

        let hold = Duration::from_millis(100);
        std::thread::scope(|s| {
            let released_at = Instant::now() + hold;
            s.spawn(|| {
                std::thread::sleep(hold);
                gate.end_write();
            });

            gate.begin_read();
            assert!(Instant::now() >= released_at);
            gate.end_read();
        });
    }

    #[test]
    fn test_write_lock_released_by_last_reader_only() {
        let gate = fresh();
        gate.begin_read();
        gate.begin_read();
        gate.end_read();
        // One reader still inside: a writer must not get through.
        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                gate.begin_write();
                gate.end_write();
            });
            std::thread::sleep(Duration::from_millis(50));
            assert!(!handle.is_finished());
            gate.end_read();
        });
    }
}
