// Mon Jul 20 2026 - Alex

use crate::shm::{ShmError, SharedState};
use memmap2::{MmapMut, MmapOptions};
use std::ffi::CString;
use std::fs::File;
use std::os::unix::io::FromRawFd;

/// Owner-side handle to the shared arena. Created by the coordinator before
/// any worker is forked; children inherit the mapping, so they never reopen
/// the region by name. Drop unlinks the region and destroys the embedded
/// primitives; forked children exit via `_exit` and never run it.
pub struct SharedArena {
    map: MmapMut,
    name: CString,
}

impl SharedArena {
    pub fn create(name: &str) -> Result<Self, ShmError> {
        if !name.starts_with('/') || name.len() > 250 {
            return Err(ShmError::InvalidName(name.to_string()));
        }
        let c_name =
            CString::new(name).map_err(|_| ShmError::InvalidName(name.to_string()))?;

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR,
                0o666 as libc::mode_t,
            )
        };
        if fd == -1 {
            return Err(ShmError::Open(std::io::Error::last_os_error()));
        }
        let file = unsafe { File::from_raw_fd(fd) };

        let size = std::mem::size_of::<SharedState>();
        file.set_len(size as u64).map_err(ShmError::Truncate)?;

        let mut map = unsafe { MmapOptions::new().len(size).map_mut(&file) }
            .map_err(ShmError::Map)?;
        if map.len() < size {
            return Err(ShmError::RegionTooSmall {
                have: map.len(),
                need: size,
            });
        }

        if let Err(e) = unsafe { SharedState::init_at(map.as_mut_ptr() as *mut SharedState) } {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            return Err(e);
        }

        Ok(Self { map, name: c_name })
    }

    pub fn state(&self) -> &SharedState {
        unsafe { &*(self.map.as_ptr() as *const SharedState) }
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn name(&self) -> &str {
        self.name.to_str().unwrap_or("")
    }
}

impl Drop for SharedArena {
    fn drop(&mut self) {
        unsafe {
            self.state().destroy();
            libc::shm_unlink(self.name.as_ptr());
        }
    }
}
