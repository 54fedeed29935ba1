//! Pinning thread producer/consumer ke CPU tertentu.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AffinityError {
    #[error("cpu {cpu} is out of range (limit {limit})")]
    OutOfRange { cpu: usize, limit: usize },

    #[error("sched_setaffinity failed for cpu {cpu}: {source}")]
    Os {
        cpu: usize,
        #[source]
        source: io::Error,
    },

    #[error("thread pinning is not supported on this platform")]
    Unsupported,
}

/// Pin thread pemanggil ke `cpu`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> Result<(), AffinityError> {
    let limit = libc::CPU_SETSIZE as usize;
    if cpu >= limit {
        return Err(AffinityError::OutOfRange { cpu, limit });
    }

    // SAFETY: cpu_set_t adalah plain-old-data, zeroed adalah set kosong yang
    // valid. CPU_SET hanya menulis bit di set lokal dan cpu < CPU_SETSIZE.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };

    if rc != 0 {
        return Err(AffinityError::Os {
            cpu,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_cpu: usize) -> Result<(), AffinityError> {
    Err(AffinityError::Unsupported)
}
