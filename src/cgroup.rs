// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! cgroup v1 membership resolution and CPU accounting.
//!
//! `/proc/self/cgroup` maps each subsystem the process belongs to onto a
//! control-group path; the counter files then live beneath per-subsystem
//! roots, conventionally `/sys/fs/cgroup/cpu` and `/sys/fs/cgroup/cpuacct`:
//!
//! ```text
//! <cpuacct-root>/<group>/cpuacct.usage       total CPU time, ns
//! <cpu-root>/<group>/cpu.cfs_period_us       CFS bandwidth period, us
//! <cpu-root>/<group>/cpu.cfs_quota_us        CFS quota, us (-1 = none)
//! <cpu-root>/<group>/cpu.stat                nr_periods / nr_throttled /
//!                                            throttled_time key-value lines
//! ```
//!
//! Failure policy: a half-read accounting snapshot is worse than none, so
//! any I/O or structural failure in this chain surfaces as a [`CgroupError`]
//! and the caller drops the whole cgroup field for that sample. Membership
//! is re-resolved on every call because a live process can be reclassified,
//! so the mapping is never cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::snapshot::{CgroupCpu, CpuThrottling};

/// Default root of the process-membership file.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Default hierarchy root for the `cpu` subsystem.
pub const DEFAULT_CPU_ROOT: &str = "/sys/fs/cgroup/cpu";

/// Default hierarchy root for the `cpuacct` subsystem.
pub const DEFAULT_CPUACCT_ROOT: &str = "/sys/fs/cgroup/cpuacct";

const CPU_SUBSYSTEM: &str = "cpu";
const CPUACCT_SUBSYSTEM: &str = "cpuacct";

/// Failures that abort cgroup accounting for one sample.
#[derive(Debug, Error)]
pub enum CgroupError {
    /// A file in the chain could not be read.
    #[error("failed to read cgroup file '{file}': {source}")]
    ReadFailed {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// A single-purpose file did not hold the expected shape.
    #[error("failed to parse cgroup file '{file}': {reason}")]
    ParseFailed { file: String, reason: String },

    /// The membership file names no hierarchy for a required subsystem.
    #[error("process is not a member of any '{subsystem}' hierarchy")]
    SubsystemMissing { subsystem: &'static str },
}

/// Reader for the probed process's cgroup v1 CPU accounting.
#[derive(Debug, Clone)]
pub struct CgroupProbe {
    proc_root: PathBuf,
    cpu_root: PathBuf,
    cpuacct_root: PathBuf,
}

impl Default for CgroupProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CgroupProbe {
    /// Probe against the conventional kernel mount points.
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            cpu_root: PathBuf::from(DEFAULT_CPU_ROOT),
            cpuacct_root: PathBuf::from(DEFAULT_CPUACCT_ROOT),
        }
    }

    /// Probe against custom roots; used to point tests at a fixture tree.
    pub fn with_roots(
        proc_root: impl Into<PathBuf>,
        cpu_root: impl Into<PathBuf>,
        cpuacct_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            proc_root: proc_root.into(),
            cpu_root: cpu_root.into(),
            cpuacct_root: cpuacct_root.into(),
        }
    }

    /// Subsystem-to-path membership of the probed process.
    ///
    /// Parsed fresh from `<proc_root>/self/cgroup` on every call. Lines that
    /// do not match the `hierarchy:subsys[,subsys]:/path` shape are skipped
    /// with a debug log; only an unreadable file is an error.
    pub fn control_groups(&self) -> Result<HashMap<String, String>, CgroupError> {
        let path = self.proc_root.join("self/cgroup");
        let content = read_file(&path)?;
        Ok(parse_control_groups(&content))
    }

    /// Full CPU accounting snapshot for the `cpu` and `cpuacct` subsystems.
    ///
    /// All four reads must succeed; the first failure aborts the chain.
    pub fn cpu_accounting(&self) -> Result<CgroupCpu, CgroupError> {
        let groups = self.control_groups()?;
        let cpu_path = groups
            .get(CPU_SUBSYSTEM)
            .ok_or(CgroupError::SubsystemMissing {
                subsystem: CPU_SUBSYSTEM,
            })?;
        let cpuacct_path = groups
            .get(CPUACCT_SUBSYSTEM)
            .ok_or(CgroupError::SubsystemMissing {
                subsystem: CPUACCT_SUBSYSTEM,
            })?;

        let usage_nanos = self.read_cpuacct_usage(cpuacct_path)?;
        let cfs_period_micros = self.read_cfs_period(cpu_path)?;
        let cfs_quota_micros = self.read_cfs_quota(cpu_path)?;
        let throttling = self.read_cpu_stat(cpu_path)?;

        Ok(CgroupCpu {
            cpuacct_path: cpuacct_path.clone(),
            usage_nanos,
            cpu_path: cpu_path.clone(),
            cfs_period_micros,
            cfs_quota_micros,
            throttling,
        })
    }

    /// Total CPU time consumed by the group, in nanoseconds.
    fn read_cpuacct_usage(&self, group: &str) -> Result<u64, CgroupError> {
        let path = subsystem_file(&self.cpuacct_root, group, "cpuacct.usage");
        let line = read_single_line(&path)?;
        parse_number(&line, &path)
    }

    /// CFS bandwidth period, in microseconds.
    fn read_cfs_period(&self, group: &str) -> Result<u64, CgroupError> {
        let path = subsystem_file(&self.cpu_root, group, "cpu.cfs_period_us");
        let line = read_single_line(&path)?;
        parse_number(&line, &path)
    }

    /// CFS quota in microseconds; `-1` is a valid "no quota" reading.
    fn read_cfs_quota(&self, group: &str) -> Result<i64, CgroupError> {
        let path = subsystem_file(&self.cpu_root, group, "cpu.cfs_quota_us");
        let line = read_single_line(&path)?;
        parse_number(&line, &path)
    }

    /// Throttling counters from `cpu.stat`.
    ///
    /// An unreadable file is an error; missing or mangled individual
    /// counters only degrade their own field.
    fn read_cpu_stat(&self, group: &str) -> Result<CpuThrottling, CgroupError> {
        let path = subsystem_file(&self.cpu_root, group, "cpu.stat");
        let content = read_file(&path)?;
        Ok(parse_cpu_stat(&content))
    }
}

/// Joins a control-group path beneath a subsystem hierarchy root.
///
/// Membership paths are absolute (`/docker/abc`); they address a location
/// beneath the root, so the leading slash must not be allowed to replace it.
fn subsystem_file(root: &Path, group: &str, file: &str) -> PathBuf {
    root.join(group.trim_start_matches('/')).join(file)
}

/// Parses membership lines of the shape `hierarchyId:subsys[,subsys]:/path`.
///
/// Pure function of its input: identical content yields an identical map.
/// Malformed lines are skipped rather than failing the file; one mangled
/// line should not cost the whole accounting chain. A subsystem listed twice
/// keeps the last path seen. The unified-hierarchy line (`0::/path`) has an
/// empty subsystem list and contributes nothing.
fn parse_control_groups(content: &str) -> HashMap<String, String> {
    let mut groups = HashMap::new();
    for line in content.lines() {
        let mut fields = line.splitn(3, ':');
        let (Some(hierarchy), Some(subsystems), Some(path)) =
            (fields.next(), fields.next(), fields.next())
        else {
            tracing::debug!(line, "skipping malformed cgroup membership line");
            continue;
        };

        let well_formed = !hierarchy.is_empty()
            && hierarchy.bytes().all(|b| b.is_ascii_digit())
            && path.starts_with('/');
        if !well_formed {
            tracing::debug!(line, "skipping malformed cgroup membership line");
            continue;
        }

        for subsystem in subsystems.split(',').filter(|s| !s.is_empty()) {
            groups.insert(subsystem.to_string(), path.to_string());
        }
    }
    groups
}

/// Populates throttling counters from `cpu.stat` key-value lines.
///
/// Keys may appear in any order; unknown keys are ignored; an expected key
/// that is missing or carries a non-numeric value leaves only its field
/// unavailable.
fn parse_cpu_stat(content: &str) -> CpuThrottling {
    let mut stat = CpuThrottling::default();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let slot = match key {
            "nr_periods" => &mut stat.periods,
            "nr_throttled" => &mut stat.throttled,
            "throttled_time" => &mut stat.throttled_time_nanos,
            _ => continue,
        };
        match value.parse::<u64>() {
            Ok(counter) => *slot = Some(counter),
            Err(_) => tracing::debug!(line, "skipping unparseable cpu.stat counter"),
        }
    }
    stat
}

fn read_file(path: &Path) -> Result<String, CgroupError> {
    std::fs::read_to_string(path).map_err(|e| CgroupError::ReadFailed {
        file: path.display().to_string(),
        source: e,
    })
}

/// Reads a file expected to hold exactly one line.
fn read_single_line(path: &Path) -> Result<String, CgroupError> {
    let content = read_file(path)?;
    let mut lines = content.lines();
    let line = lines.next().ok_or_else(|| CgroupError::ParseFailed {
        file: path.display().to_string(),
        reason: "file is empty".to_string(),
    })?;
    if lines.next().is_some() {
        return Err(CgroupError::ParseFailed {
            file: path.display().to_string(),
            reason: "expected a single line".to_string(),
        });
    }
    Ok(line.to_string())
}

fn parse_number<T: std::str::FromStr>(line: &str, path: &Path) -> Result<T, CgroupError> {
    line.trim().parse().map_err(|_| CgroupError::ParseFailed {
        file: path.display().to_string(),
        reason: format!("invalid numeric value: '{line}'"),
    })
}
