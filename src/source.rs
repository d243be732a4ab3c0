// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Portable metric source behind a capability registry.
//!
//! Six host metrics are optional across platforms: free/total physical
//! memory, free/total swap, the 1-minute load average, and the system CPU
//! load. A [`MetricSource`] adapter declares which of them it supports;
//! [`MetricReader`] records that declaration once at construction and gates
//! every read on it. A read of an undeclared capability returns `None`
//! without touching the adapter, and any adapter failure is coerced to
//! `None`; no error crosses this module's boundary.

use std::sync::Mutex;

use sysinfo::System;

/// One of the optional host metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    FreePhysicalMemory,
    TotalPhysicalMemory,
    FreeSwap,
    TotalSwap,
    SystemLoadAverage,
    SystemCpuLoad,
}

impl Capability {
    const fn bit(self) -> u8 {
        match self {
            Capability::FreePhysicalMemory => 1 << 0,
            Capability::TotalPhysicalMemory => 1 << 1,
            Capability::FreeSwap => 1 << 2,
            Capability::TotalSwap => 1 << 3,
            Capability::SystemLoadAverage => 1 << 4,
            Capability::SystemCpuLoad => 1 << 5,
        }
    }
}

/// Immutable set of capabilities declared by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    bits: u8,
}

impl CapabilitySet {
    /// Set with no capabilities.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Set with all six capabilities.
    pub const fn all() -> Self {
        Self { bits: 0b0011_1111 }
    }

    /// Copy of this set with one capability added.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self {
            bits: self.bits | capability.bit(),
        }
    }

    /// Copy of this set with one capability removed.
    #[must_use]
    pub const fn without(self, capability: Capability) -> Self {
        Self {
            bits: self.bits & !capability.bit(),
        }
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.bits & capability.bit() != 0
    }
}

/// Adapter over whatever the platform exposes for the six optional metrics.
///
/// Accessors return `None` on any failure; implementations must not panic.
/// Memory and swap figures are bytes; `cpu_load` is a fraction in
/// `0.0..=1.0` of total system capacity.
pub trait MetricSource {
    /// Capabilities this adapter supports on the current platform.
    fn capabilities(&self) -> CapabilitySet;

    fn free_physical_memory(&self) -> Option<u64>;
    fn total_physical_memory(&self) -> Option<u64>;
    fn free_swap(&self) -> Option<u64>;
    fn total_swap(&self) -> Option<u64>;
    fn load_average_1m(&self) -> Option<f64>;
    fn cpu_load(&self) -> Option<f64>;
}

/// Production adapter backed by the `sysinfo` crate.
///
/// `sysinfo` wants `&mut` for refreshes, so the inner state sits behind a
/// mutex and the trait reads stay `&self`. A poisoned lock reads as
/// unavailable, consistent with every other failure here.
pub struct SysinfoSource {
    system: Mutex<System>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        // Prime the CPU counters; usage figures are deltas between refreshes.
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SysinfoSource {
    fn capabilities(&self) -> CapabilitySet {
        // Windows has no load-average concept; sysinfo reports zeros there,
        // which would be indistinguishable from an idle host.
        if cfg!(windows) {
            CapabilitySet::all().without(Capability::SystemLoadAverage)
        } else {
            CapabilitySet::all()
        }
    }

    fn free_physical_memory(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        Some(system.free_memory())
    }

    fn total_physical_memory(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        Some(system.total_memory())
    }

    fn free_swap(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        Some(system.free_swap())
    }

    fn total_swap(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        Some(system.total_swap())
    }

    fn load_average_1m(&self) -> Option<f64> {
        Some(System::load_average().one)
    }

    fn cpu_load(&self) -> Option<f64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_cpu_usage();
        Some(f64::from(system.global_cpu_info().cpu_usage()) / 100.0)
    }
}

/// Capability-gated front end over a [`MetricSource`].
///
/// The capability set is detected exactly once, at construction, and never
/// mutates afterwards, so the reader is safe to share read-only.
pub struct MetricReader<S> {
    source: S,
    capabilities: CapabilitySet,
}

impl<S: MetricSource> MetricReader<S> {
    pub fn new(source: S) -> Self {
        let capabilities = source.capabilities();
        Self {
            source,
            capabilities,
        }
    }

    /// Capabilities detected at construction.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn gated<T>(&self, capability: Capability, read: impl FnOnce(&S) -> Option<T>) -> Option<T> {
        if !self.capabilities.contains(capability) {
            return None;
        }
        read(&self.source)
    }

    pub fn free_physical_memory(&self) -> Option<u64> {
        self.gated(Capability::FreePhysicalMemory, S::free_physical_memory)
    }

    pub fn total_physical_memory(&self) -> Option<u64> {
        self.gated(Capability::TotalPhysicalMemory, S::total_physical_memory)
    }

    pub fn free_swap(&self) -> Option<u64> {
        self.gated(Capability::FreeSwap, S::free_swap)
    }

    pub fn total_swap(&self) -> Option<u64> {
        self.gated(Capability::TotalSwap, S::total_swap)
    }

    pub fn load_average_1m(&self) -> Option<f64> {
        self.gated(Capability::SystemLoadAverage, S::load_average_1m)
    }

    /// System CPU usage scaled to an integral percentage.
    ///
    /// Negative readings are unavailable; readings above full capacity clamp
    /// to 100.
    pub fn cpu_percent(&self) -> Option<u16> {
        let load = self.gated(Capability::SystemCpuLoad, S::cpu_load)?;
        if load < 0.0 || !load.is_finite() {
            return None;
        }
        Some(((load * 100.0).round() as u16).min(100))
    }
}
