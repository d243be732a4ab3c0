// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Host OS and cgroup CPU sampling probe for datadog-agent development.
//!
//! This crate samples host-level resource metrics (CPU usage, load
//! averages, physical memory, swap, and on Linux cgroup v1 CPU accounting)
//! as immutable point-in-time snapshots for a monitoring pipeline.
//!
//! ## Architecture
//!
//! 1. **Metric source** (`source` module) - a capability-gated adapter over
//!    what the platform exposes portably; capabilities are detected once at
//!    startup and any read failure degrades to an unavailable marker.
//!
//! 2. **Load-average resolver** (`loadavg` module) - prefers the raw
//!    `/proc/loadavg` three-figure source on Linux and falls back to the
//!    portable 1-minute figure elsewhere.
//!
//! 3. **cgroup accountant** (`cgroup` module) - resolves the process's
//!    cgroup v1 membership and reads CPU usage, CFS bandwidth, and
//!    throttling counters; the whole field is dropped from a sample on any
//!    failure in the chain.
//!
//! 4. **Assembler** (`probe` module) - composes the above into
//!    [`snapshot::OsSnapshot`]; `sample()` never fails.
//!
//! ## Usage
//!
//! Run the sampler binary, one JSON snapshot per line:
//!
//! ```bash
//! os-probe --interval-ms 1000
//! ```

pub mod cgroup;
pub mod loadavg;
pub mod platform;
pub mod probe;
pub mod snapshot;
pub mod source;
