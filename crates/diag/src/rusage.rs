//! Peak resident memory of the current process

use std::fmt;

use crate::error::{Result, SystemError};

/// Unit the OS reports `ru_maxrss` in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RssUnit {
    /// Linux and the BSDs
    Kilobytes,
    /// macOS and iOS
    Bytes,
}

impl RssUnit {
    /// Unit used by the platform this crate was compiled for
    pub const fn native() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::Bytes
        } else {
            Self::Kilobytes
        }
    }

    fn multiplier(self) -> u64 {
        match self {
            Self::Kilobytes => 1024,
            Self::Bytes => 1,
        }
    }
}

/// Peak resident set size since process start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakMemory {
    raw: u64,
    unit: RssUnit,
}

impl PeakMemory {
    /// Build from a raw counter value in the given unit
    pub const fn new(raw: u64, unit: RssUnit) -> Self {
        Self { raw, unit }
    }

    /// Value exactly as the OS reported it
    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// Unit of [`raw`](Self::raw)
    pub fn unit(&self) -> RssUnit {
        self.unit
    }

    /// Peak normalised to bytes
    pub fn bytes(&self) -> u64 {
        self.raw.saturating_mul(self.unit.multiplier())
    }
}

/// Prints as `maxrss = <raw>`
impl fmt::Display for PeakMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "maxrss = {}", self.raw)
    }
}

/// Query `getrusage(RUSAGE_SELF)` for the peak resident set size.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn max_rss() -> Result<PeakMemory> {
    use std::mem::MaybeUninit;

    let mut usage = MaybeUninit::<libc::rusage>::uninit();
    // SAFETY: getrusage fully initialises `usage` when it returns 0.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return Err(SystemError::from_os_error(&std::io::Error::last_os_error()));
    }
    let usage = unsafe { usage.assume_init() };

    let raw = u64::try_from(usage.ru_maxrss).map_err(|_| SystemError::Platform {
        message: format!("getrusage reported negative ru_maxrss {}", usage.ru_maxrss),
        code: None,
    })?;
    tracing::trace!(raw, "getrusage(RUSAGE_SELF)");

    Ok(PeakMemory::new(raw, RssUnit::native()))
}

/// Peak resident memory is only available through `getrusage`.
#[cfg(not(unix))]
pub fn max_rss() -> Result<PeakMemory> {
    Err(SystemError::NotSupported(
        "peak resident memory (getrusage)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_raw_value() {
        let peak = PeakMemory::new(123_456, RssUnit::Kilobytes);
        assert_eq!(peak.to_string(), "maxrss = 123456");
    }

    #[test]
    fn test_bytes_normalisation() {
        assert_eq!(PeakMemory::new(2, RssUnit::Kilobytes).bytes(), 2048);
        assert_eq!(PeakMemory::new(2, RssUnit::Bytes).bytes(), 2);
        assert_eq!(PeakMemory::new(u64::MAX, RssUnit::Kilobytes).bytes(), u64::MAX);
    }

    #[cfg(unix)]
    #[test]
    fn test_max_rss_is_positive_and_monotonic() {
        let first = max_rss().unwrap();
        assert!(first.raw() > 0);
        assert_eq!(first.unit(), RssUnit::native());

        let block = vec![1u8; 8 * 1024 * 1024];
        assert_eq!(block.iter().map(|&b| b as usize).sum::<usize>(), block.len());

        let second = max_rss().unwrap();
        assert!(second.raw() >= first.raw());
    }
}
