// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Immutable sample value objects.
//!
//! Every optional metric is an `Option`: `None` means "unavailable on this
//! platform or for this sample" and is distinct from any legitimate reading,
//! including zero. Snapshots serialize to JSON with `None` as `null`.

use serde::Serialize;

/// System load averages over 1, 5, and 15 minutes.
///
/// Platforms that only expose the 1-minute figure leave the other two
/// positions unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: Option<f64>,
    pub five: Option<f64>,
    pub fifteen: Option<f64>,
}

impl LoadAverage {
    /// Triple carrying all three figures.
    pub fn new(one: f64, five: f64, fifteen: f64) -> Self {
        Self {
            one: Some(one),
            five: Some(five),
            fifteen: Some(fifteen),
        }
    }

    /// Triple carrying only the 1-minute figure.
    pub fn one_minute_only(one: f64) -> Self {
        Self {
            one: Some(one),
            five: None,
            fifteen: None,
        }
    }
}

/// Physical memory totals in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    pub total_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
}

/// Swap totals in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapSample {
    pub total_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
}

/// CFS throttling counters from `cpu.stat`.
///
/// Each counter degrades independently: a key missing from the file leaves
/// only its field unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CpuThrottling {
    /// Elapsed enforcement periods (`nr_periods`).
    pub periods: Option<u64>,
    /// Times the group was throttled (`nr_throttled`).
    pub throttled: Option<u64>,
    /// Total throttled time in nanoseconds (`throttled_time`).
    pub throttled_time_nanos: Option<u64>,
}

/// cgroup v1 CPU accounting for the probed process.
///
/// Either the whole struct is populated or the sample carries no cgroup data
/// at all; a partially read accounting snapshot is never surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CgroupCpu {
    /// Control group path for the `cpuacct` subsystem.
    pub cpuacct_path: String,
    /// Total CPU time consumed by the group, in nanoseconds.
    pub usage_nanos: u64,
    /// Control group path for the `cpu` subsystem.
    pub cpu_path: String,
    /// CFS bandwidth period in microseconds.
    pub cfs_period_micros: u64,
    /// CFS quota in microseconds; `-1` means no quota is applied.
    pub cfs_quota_micros: i64,
    pub throttling: CpuThrottling,
}

/// One point-in-time host resource sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsSnapshot {
    /// Wall-clock capture time, milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// System-wide CPU usage as an integral percentage.
    pub cpu_percent: Option<u16>,
    /// Load averages; absent where the platform has no such concept.
    pub load_average: Option<LoadAverage>,
    pub memory: MemorySample,
    pub swap: SwapSample,
    /// Present only on the Linux platform family, and only when the whole
    /// accounting chain read cleanly.
    pub cgroup: Option<CgroupCpu>,
}

/// Static host description, captured once rather than per sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsInfo {
    /// Caller-configured sampling cadence, echoed for consumers.
    pub refresh_interval_millis: i64,
    /// Processors visible to the process.
    pub available_processors: usize,
    /// Caller-supplied processor allotment.
    pub allocated_processors: usize,
    /// Operating system name.
    pub name: String,
    /// Processor architecture.
    pub arch: String,
    /// OS version string when the host exposes one.
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_average_constructors() {
        let full = LoadAverage::new(0.5, 1.5, 2.5);
        assert_eq!(full.one, Some(0.5));
        assert_eq!(full.five, Some(1.5));
        assert_eq!(full.fifteen, Some(2.5));

        let one_only = LoadAverage::one_minute_only(0.25);
        assert_eq!(one_only.one, Some(0.25));
        assert_eq!(one_only.five, None);
        assert_eq!(one_only.fifteen, None);
    }

    #[test]
    fn test_unavailable_serializes_as_null() {
        let snapshot = OsSnapshot {
            timestamp_millis: 1_700_000_000_000,
            cpu_percent: None,
            load_average: Some(LoadAverage::one_minute_only(1.0)),
            memory: MemorySample {
                total_bytes: Some(0),
                free_bytes: None,
            },
            swap: SwapSample {
                total_bytes: None,
                free_bytes: None,
            },
            cgroup: None,
        };

        let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
        assert!(json["cpu_percent"].is_null());
        assert!(json["cgroup"].is_null());
        // Zero is a legitimate reading, distinct from unavailable.
        assert_eq!(json["memory"]["total_bytes"], 0);
        assert!(json["memory"]["free_bytes"].is_null());
        assert!(json["load_average"]["five"].is_null());
    }

    #[test]
    fn test_quota_sentinel_survives_serialization() {
        let cgroup = CgroupCpu {
            cpuacct_path: "/docker/abc".to_string(),
            usage_nanos: 100,
            cpu_path: "/docker/abc".to_string(),
            cfs_period_micros: 100_000,
            cfs_quota_micros: -1,
            throttling: CpuThrottling::default(),
        };
        let json: serde_json::Value = serde_json::to_value(&cgroup).unwrap();
        assert_eq!(json["cfs_quota_micros"], -1);
    }
}
