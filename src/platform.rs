// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Host platform family detection.
//!
//! The probe only branches on the coarse platform family: whether load
//! averages exist at all (not on Windows), whether the raw `/proc` text
//! source is preferred (Linux), and whether cgroup accounting is attempted
//! (Linux only). Resolved once at compile time; tests inject other values
//! through the probe builders.

/// Operating system name the process was built for.
pub const OS_NAME: &str = std::env::consts::OS;

/// Processor architecture the process was built for.
pub const OS_ARCH: &str = std::env::consts::ARCH;

/// Coarse platform family used to select metric sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
    Other,
}

impl Platform {
    /// Platform family of the running process.
    pub const fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }

    /// Whether cgroup v1 accounting files can exist on this platform.
    pub const fn is_linux(self) -> bool {
        matches!(self, Platform::Linux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_matches_target() {
        let platform = Platform::current();
        #[cfg(target_os = "linux")]
        assert_eq!(platform, Platform::Linux);
        #[cfg(target_os = "macos")]
        assert_eq!(platform, Platform::Macos);
        #[cfg(windows)]
        assert_eq!(platform, Platform::Windows);
    }

    #[test]
    fn test_only_linux_attempts_cgroups() {
        assert!(Platform::Linux.is_linux());
        assert!(!Platform::Macos.is_linux());
        assert!(!Platform::Windows.is_linux());
        assert!(!Platform::Other.is_linux());
    }
}
