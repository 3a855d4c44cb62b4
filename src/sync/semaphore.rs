// Mon Jul 20 2026 - Alex

use crate::shm::ShmError;
use std::cell::UnsafeCell;

/// POSIX unnamed semaphore embedded in the shared arena, initialized with
/// the process-shared flag so every forked worker operates on the same
/// kernel object. Unlike a mutex there is no owner: one process may acquire
/// and a different one release, which the reader/writer gate relies on.
#[repr(C)]
pub struct SharedSemaphore {
    inner: UnsafeCell<libc::sem_t>,
}

unsafe impl Send for SharedSemaphore {}
unsafe impl Sync for SharedSemaphore {}

impl SharedSemaphore {
    /// Initialize the semaphore in place with the given count.
    ///
    /// # Safety
    /// Must be called exactly once, before any other process touches the
    /// memory, and the memory must stay mapped for the semaphore's lifetime.
    pub unsafe fn init(&self, value: u32) -> Result<(), ShmError> {
        if libc::sem_init(self.inner.get(), 1, value) != 0 {
            return Err(ShmError::PrimitiveInit(errno()));
        }
        Ok(())
    }

    pub fn acquire(&self) {
        loop {
            let rc = unsafe { libc::sem_wait(self.inner.get()) };
            if rc == 0 {
                return;
            }
            if errno() != libc::EINTR {
                // sem_wait only fails on EINVAL for a torn-down semaphore;
                // by then the run is over and blocking forever is worse.
                return;
            }
        }
    }

    pub fn try_acquire(&self) -> bool {
        unsafe { libc::sem_trywait(self.inner.get()) == 0 }
    }

    pub fn release(&self) {
        unsafe {
            libc::sem_post(self.inner.get());
        }
    }

    /// Acquire with an RAII release. Only for sections where the releasing
    /// process is the acquiring one (question flag flips, exam loading).
    pub fn guard(&self) -> SemGuard<'_> {
        self.acquire();
        SemGuard { sem: self }
    }

    pub fn try_guard(&self) -> Option<SemGuard<'_>> {
        if self.try_acquire() {
            Some(SemGuard { sem: self })
        } else {
            None
        }
    }

    /// # Safety
    /// No process may be blocked on or about to use the semaphore.
    pub unsafe fn destroy(&self) {
        libc::sem_destroy(self.inner.get());
    }
}

pub struct SemGuard<'a> {
    sem: &'a SharedSemaphore,
}

impl Drop for SemGuard<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
