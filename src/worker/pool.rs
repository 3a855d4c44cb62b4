// Wed Jul 22 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to fork worker {id}: {source}")]
    Fork {
        id: usize,
        source: std::io::Error,
    },
}

/// Forked worker processes sharing the coordinator's arena mapping. Each
/// child runs the provided body and leaves through `_exit`, so no parent
/// state (arena teardown included) runs twice.
pub struct WorkerPool {
    children: Vec<libc::pid_t>,
}

impl WorkerPool {
    /// Fork `count` workers. The body receives the worker id; its return
    /// value ends the child process. Fork failure mid-spawn is reported
    /// after the already-running children are left to finish on their own
    /// (the caller's `wait_all`/Drop reaps them).
    pub fn spawn<F>(count: usize, body: F) -> Result<Self, PoolError>
    where
        F: Fn(usize),
    {
        let mut pool = Self {
            children: Vec::with_capacity(count),
        };

        for id in 0..count {
            let pid = unsafe { libc::fork() };
            match pid {
                -1 => {
                    return Err(PoolError::Fork {
                        id,
                        source: std::io::Error::last_os_error(),
                    });
                }
                0 => {
                    body(id);
                    unsafe { libc::_exit(0) };
                }
                child => pool.children.push(child),
            }
        }

        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Block until every child has exited. Returns the number reaped.
    pub fn wait_all(&mut self) -> usize {
        let mut reaped = 0;
        for pid in self.children.drain(..) {
            loop {
                let mut status: libc::c_int = 0;
                let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
                if rc == pid {
                    reaped += 1;
                    break;
                }
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::EINTR) {
                    continue;
                }
                log::warn!("waitpid for worker pid {} failed: {}", pid, err);
                break;
            }
        }
        reaped
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.children.is_empty() {
            self.wait_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_spawn_and_reap() {
        let mut pool = WorkerPool::spawn(3, |_id| {
            // Child does nothing and exits cleanly.
        })
        .unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.wait_all(), 3);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_children_do_not_share_parent_writes() {
        // Plain (non-arena) memory is copy-on-write after fork: a child
        // write must not be visible here.
        let flag = AtomicU32::new(0);
        let mut pool = WorkerPool::spawn(1, |_id| {
            flag.store(1, Ordering::SeqCst);
        })
        .unwrap();
        pool.wait_all();
        assert_eq!(flag.load(Ordering::SeqCst), 0);
    }
}
