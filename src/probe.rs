// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Snapshot assembly.
//!
//! [`OsProbe`] composes the capability-gated metric reader, the
//! load-average resolver, and the cgroup accountant into one best-effort
//! sample. `sample()` never fails: each constituent degrades to its own
//! unavailable marker, and the cgroup chain (attempted only on the Linux
//! platform family) degrades to an absent field as a unit.

use chrono::Utc;

use crate::cgroup::CgroupProbe;
use crate::loadavg::LoadAverageResolver;
use crate::platform::{self, Platform};
use crate::snapshot::{MemorySample, OsInfo, OsSnapshot, SwapSample};
use crate::source::{MetricReader, MetricSource, SysinfoSource};

/// Host resource probe.
///
/// Construct one per process and share it; capability detection runs once in
/// the constructor and the probe is stateless across samples.
pub struct OsProbe<S = SysinfoSource> {
    platform: Platform,
    reader: MetricReader<S>,
    loadavg: LoadAverageResolver,
    cgroup: CgroupProbe,
}

impl OsProbe<SysinfoSource> {
    /// Probe for the running host with the production metric source.
    pub fn new() -> Self {
        Self::with_source(SysinfoSource::new())
    }
}

impl Default for OsProbe<SysinfoSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MetricSource> OsProbe<S> {
    /// Probe with an injected metric source.
    pub fn with_source(source: S) -> Self {
        let platform = Platform::current();
        Self {
            platform,
            reader: MetricReader::new(source),
            loadavg: LoadAverageResolver::new(platform),
            cgroup: CgroupProbe::new(),
        }
    }

    /// Overrides the platform family; used by tests to pin behavior that
    /// would otherwise depend on the build target.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self.loadavg = self.loadavg.with_platform(platform);
        self
    }

    /// Points the text-file readers at custom roots; used to probe a
    /// fixture tree or an unusually mounted host.
    #[must_use]
    pub fn with_roots(
        mut self,
        proc_root: impl Into<std::path::PathBuf>,
        cpu_root: impl Into<std::path::PathBuf>,
        cpuacct_root: impl Into<std::path::PathBuf>,
    ) -> Self {
        let proc_root = proc_root.into();
        self.loadavg = self.loadavg.with_proc_root(proc_root.clone());
        self.cgroup = CgroupProbe::with_roots(proc_root, cpu_root, cpuacct_root);
        self
    }

    /// One best-effort sample; never fails.
    pub fn sample(&self) -> OsSnapshot {
        let cpu_percent = self.reader.cpu_percent();
        let load_average = self.loadavg.resolve(&self.reader);
        let memory = MemorySample {
            total_bytes: self.reader.total_physical_memory(),
            free_bytes: self.reader.free_physical_memory(),
        };
        let swap = SwapSample {
            total_bytes: self.reader.total_swap(),
            free_bytes: self.reader.free_swap(),
        };

        let cgroup = if self.platform.is_linux() {
            match self.cgroup.cpu_accounting() {
                Ok(accounting) => Some(accounting),
                Err(e) => {
                    tracing::debug!(error = %e, "cgroup CPU accounting unavailable for this sample");
                    None
                }
            }
        } else {
            None
        };

        OsSnapshot {
            timestamp_millis: Utc::now().timestamp_millis(),
            cpu_percent,
            load_average,
            memory,
            swap,
            cgroup,
        }
    }

    /// Static host description; a single direct read with no fallback logic.
    pub fn static_info(&self, refresh_interval_millis: i64, allocated_processors: usize) -> OsInfo {
        OsInfo {
            refresh_interval_millis,
            available_processors: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
            allocated_processors,
            name: platform::OS_NAME.to_string(),
            arch: platform::OS_ARCH.to_string(),
            version: sysinfo::System::os_version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CapabilitySet;

    struct EmptySource;

    impl MetricSource for EmptySource {
        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::empty()
        }

        fn free_physical_memory(&self) -> Option<u64> {
            None
        }

        fn total_physical_memory(&self) -> Option<u64> {
            None
        }

        fn free_swap(&self) -> Option<u64> {
            None
        }

        fn total_swap(&self) -> Option<u64> {
            None
        }

        fn load_average_1m(&self) -> Option<f64> {
            None
        }

        fn cpu_load(&self) -> Option<f64> {
            None
        }
    }

    #[test]
    fn test_sample_with_nothing_available_still_returns() {
        let probe = OsProbe::with_source(EmptySource)
            .with_platform(Platform::Other)
            .with_roots("/nonexistent/proc", "/nonexistent/cpu", "/nonexistent/cpuacct");

        let snapshot = probe.sample();
        assert!(snapshot.timestamp_millis > 0);
        assert_eq!(snapshot.cpu_percent, None);
        assert_eq!(snapshot.load_average, None);
        assert_eq!(snapshot.memory.total_bytes, None);
        assert_eq!(snapshot.swap.free_bytes, None);
        assert_eq!(snapshot.cgroup, None);
    }

    #[test]
    fn test_linux_probe_with_missing_roots_drops_cgroup_field() {
        let probe = OsProbe::with_source(EmptySource)
            .with_platform(Platform::Linux)
            .with_roots("/nonexistent/proc", "/nonexistent/cpu", "/nonexistent/cpuacct");

        assert_eq!(probe.sample().cgroup, None);
    }

    #[test]
    fn test_static_info_echoes_caller_values() {
        let info = OsProbe::with_source(EmptySource).static_info(30_000, 4);
        assert_eq!(info.refresh_interval_millis, 30_000);
        assert_eq!(info.allocated_processors, 4);
        assert!(info.available_processors >= 1);
        assert_eq!(info.name, std::env::consts::OS);
        assert_eq!(info.arch, std::env::consts::ARCH);
    }
}
