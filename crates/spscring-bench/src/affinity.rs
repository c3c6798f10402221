//! Thread-to-core pinning.
//!
//! Producer and consumer are pinned to distinct cores so the measurement
//! covers cross-core cache-line traffic rather than scheduler migrations.

use std::io;
use tracing::{debug, warn};

/// Restricts the calling thread to `core`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> io::Result<()> {
    if core >= libc::CPU_SETSIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("core {core} is outside the CPU set"),
        ));
    }

    // SAFETY: cpu_set_t is a plain bit array; all-zero is the empty set.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: core < CPU_SETSIZE, checked above.
    unsafe { libc::CPU_SET(core, &mut set) };

    // SAFETY: pid 0 is the calling thread; `set` outlives the call.
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_core: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "thread pinning requires Linux",
    ))
}

/// Pins the calling thread if a core is given; failures only warn.
pub fn pin_or_warn(core: Option<usize>, role: &'static str) {
    let Some(core) = core else {
        return;
    };
    match pin_current_thread(core) {
        Ok(()) => debug!(core, role, "pinned thread"),
        Err(e) => warn!(core, role, error = %e, "could not pin thread, running unpinned"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_core() {
        let err = pin_current_thread(usize::MAX).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported
        ));
    }

    #[test]
    fn test_pin_or_warn_never_panics() {
        std::thread::spawn(|| {
            pin_or_warn(Some(0), "test");
            pin_or_warn(None, "test");
        })
        .join()
        .unwrap();
    }
}
