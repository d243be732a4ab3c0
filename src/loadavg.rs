// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Load-average resolution with platform-dependent fallback.
//!
//! Linux exposes all three figures through `/proc/loadavg`; that richer
//! source is preferred when it reads and parses cleanly. Everything except
//! Windows can fall back to the portable 1-minute figure from the metric
//! source. Windows has no load-average concept at all.

use std::path::PathBuf;

use crate::platform::Platform;
use crate::snapshot::LoadAverage;
use crate::source::{MetricReader, MetricSource};

/// Default location of the kernel's load-average text file.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Resolves the 1/5/15-minute load-average triple for one sample.
#[derive(Debug, Clone)]
pub struct LoadAverageResolver {
    platform: Platform,
    proc_root: PathBuf,
}

impl LoadAverageResolver {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }

    /// Replaces the platform family; used by embedders and tests.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replaces the `/proc` root; used to point tests at a fixture tree.
    #[must_use]
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    /// Best-effort load-average triple, or `None` where unavailable.
    ///
    /// Read or parse trouble with the raw text source degrades to the
    /// 1-minute fallback rather than failing the sample.
    pub fn resolve<S: MetricSource>(&self, reader: &MetricReader<S>) -> Option<LoadAverage> {
        match self.platform {
            Platform::Windows => None,
            Platform::Linux => match self.read_proc_loadavg() {
                Some(triple) => Some(triple),
                None => Self::fallback(reader),
            },
            Platform::Macos | Platform::Other => Self::fallback(reader),
        }
    }

    /// Parses `<proc_root>/loadavg`, e.g. `0.28 0.41 0.44 1/1393 24977`.
    fn read_proc_loadavg(&self) -> Option<LoadAverage> {
        let path = self.proc_root.join("loadavg");
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(error = %e, path = %path.display(), "error reading loadavg");
                return None;
            }
        };

        let mut lines = content.lines();
        let line = lines.next().unwrap_or_default();
        if lines.next().is_some() {
            tracing::debug!(path = %path.display(), "loadavg is not a single line");
            return None;
        }

        match parse_loadavg_line(line) {
            Some((one, five, fifteen)) => Some(LoadAverage::new(one, five, fifteen)),
            None => {
                tracing::debug!(line, "error parsing loadavg line");
                None
            }
        }
    }

    /// Portable single-figure path: 1-minute average only, positions two and
    /// three unavailable. A negative reading is the source's "no data"
    /// sentinel.
    fn fallback<S: MetricSource>(reader: &MetricReader<S>) -> Option<LoadAverage> {
        let one = reader.load_average_1m()?;
        Some(LoadAverage {
            one: (one >= 0.0).then_some(one),
            five: None,
            fifteen: None,
        })
    }
}

/// Extracts the three leading averages from a loadavg line.
///
/// Only the first three whitespace-separated fields matter; trailing fields
/// (runnable/total entities and the last PID) are ignored whatever their
/// shape.
fn parse_loadavg_line(line: &str) -> Option<(f64, f64, f64)> {
    let mut fields = line.split_whitespace();
    let one = fields.next()?.parse().ok()?;
    let five = fields.next()?.parse().ok()?;
    let fifteen = fields.next()?.parse().ok()?;
    Some((one, five, fifteen))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::source::{Capability, CapabilitySet};

    struct FixedSource {
        load_1m: Option<f64>,
    }

    impl MetricSource for FixedSource {
        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::empty().with(Capability::SystemLoadAverage)
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
            self.load_1m
        }

        fn cpu_load(&self) -> Option<f64> {
            None
        }
    }

    fn reader(load_1m: Option<f64>) -> MetricReader<FixedSource> {
        MetricReader::new(FixedSource { load_1m })
    }

    fn proc_root_with(line: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("loadavg"), line).unwrap();
        dir
    }

    #[test]
    fn test_parse_valid_line() {
        assert_eq!(
            parse_loadavg_line("0.28 0.41 0.44 1/1393 24977"),
            Some((0.28, 0.41, 0.44))
        );
    }

    #[test]
    fn test_parse_ignores_trailing_content() {
        // Anything after the three averages is irrelevant, even garbage.
        assert_eq!(
            parse_loadavg_line("1.00 2.00 3.00 not-a-pair whatever extra"),
            Some((1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_leading_fields() {
        assert_eq!(parse_loadavg_line("one two three 1/2 3"), None);
        assert_eq!(parse_loadavg_line("0.28 x 0.44 1/2 3"), None);
        assert_eq!(parse_loadavg_line(""), None);
        assert_eq!(parse_loadavg_line("0.28 0.41"), None);
    }

    #[test]
    fn test_linux_prefers_proc_file() {
        let proc_root = proc_root_with("1.00 2.00 3.00 5/100 123\n");
        let resolver = LoadAverageResolver::new(Platform::Linux).with_proc_root(proc_root.path());

        let triple = resolver.resolve(&reader(Some(9.0))).unwrap();
        assert_eq!(triple, LoadAverage::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_linux_falls_back_on_unparseable_file() {
        let proc_root = proc_root_with("corrupt loadavg contents\n");
        let resolver = LoadAverageResolver::new(Platform::Linux).with_proc_root(proc_root.path());

        let triple = resolver.resolve(&reader(Some(0.5))).unwrap();
        assert_eq!(triple, LoadAverage::one_minute_only(0.5));
    }

    #[test]
    fn test_linux_falls_back_on_missing_file() {
        let empty_root = TempDir::new().unwrap();
        let resolver = LoadAverageResolver::new(Platform::Linux).with_proc_root(empty_root.path());

        let triple = resolver.resolve(&reader(Some(0.5))).unwrap();
        assert_eq!(triple, LoadAverage::one_minute_only(0.5));
    }

    #[test]
    fn test_multi_line_file_degrades_to_fallback() {
        let proc_root = proc_root_with("1.00 2.00 3.00 5/100 123\n4.00 5.00 6.00 1/2 3\n");
        let resolver = LoadAverageResolver::new(Platform::Linux).with_proc_root(proc_root.path());

        let triple = resolver.resolve(&reader(Some(0.5))).unwrap();
        assert_eq!(triple, LoadAverage::one_minute_only(0.5));
    }

    #[test]
    fn test_windows_has_no_load_average() {
        let proc_root = proc_root_with("1.00 2.00 3.00 5/100 123\n");
        let resolver = LoadAverageResolver::new(Platform::Windows).with_proc_root(proc_root.path());

        assert_eq!(resolver.resolve(&reader(Some(1.0))), None);
    }

    #[test]
    fn test_macos_uses_single_figure_path() {
        let resolver = LoadAverageResolver::new(Platform::Macos);
        let triple = resolver.resolve(&reader(Some(2.5))).unwrap();
        assert_eq!(triple, LoadAverage::one_minute_only(2.5));
    }

    #[test]
    fn test_negative_managed_reading_is_unavailable() {
        let resolver = LoadAverageResolver::new(Platform::Macos);
        let triple = resolver.resolve(&reader(Some(-1.0))).unwrap();
        assert_eq!(triple.one, None);
        assert_eq!(triple.five, None);
        assert_eq!(triple.fifteen, None);
    }

    #[test]
    fn test_absent_managed_reading_means_absent_triple() {
        let resolver = LoadAverageResolver::new(Platform::Macos);
        assert_eq!(resolver.resolve(&reader(None)), None);
    }
}
