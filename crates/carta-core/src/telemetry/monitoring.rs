// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides traits and data structures for active resource monitoring.
//!
//! Monitors poll a system resource (host RAM, device memory) and report a
//! snapshot. The pipeline only uses these snapshots to resize cache ceilings.

use std::borrow::Cow;
use std::fmt::Debug;

/// The core trait for a resource monitor.
///
/// Monitors live in `carta-infra`; the telemetry service holds a collection of
/// them and periodically calls `update` and `get_usage_report`.
pub trait ResourceMonitor: Send + Sync + Debug + 'static {
    /// Returns a unique, human-readable identifier for this monitor instance.
    fn monitor_id(&self) -> Cow<'static, str>;

    /// Returns the general type of resource being monitored.
    fn resource_type(&self) -> MonitoredResourceType;

    /// Returns a snapshot of the current usage data for the monitored resource.
    fn get_usage_report(&self) -> ResourceUsageReport;

    /// Allows downcasting to a concrete monitor type.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Polls the resource. Monitors that update passively keep the default.
    fn update(&self) {}
}

/// The types of resources that can be monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoredResourceType {
    /// Dedicated device memory.
    Vram,
    /// Main system RAM.
    SystemRam,
}

/// A unified report of resource usage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsageReport {
    /// Bytes currently in use.
    pub current_bytes: u64,
    /// Peak bytes in use, if tracked.
    pub peak_bytes: Option<u64>,
    /// Total capacity in bytes, if known.
    pub total_capacity_bytes: Option<u64>,
}

impl ResourceUsageReport {
    /// Share of the capacity still available, if the capacity is known.
    pub fn available_fraction(&self) -> Option<f64> {
        match self.total_capacity_bytes {
            Some(total) if total > 0 => {
                Some(total.saturating_sub(self.current_bytes) as f64 / total as f64)
            }
            _ => None,
        }
    }
}

/// Host memory pressure level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MemoryPressure {
    /// Plenty of memory available.
    #[default]
    Normal,
    /// Less than 20% of system memory available.
    Warning,
    /// Less than 8% of system memory available.
    Critical,
}

impl MemoryPressure {
    /// Available share below which the level becomes `Warning`.
    pub const WARNING_THRESHOLD: f64 = 0.20;
    /// Available share below which the level becomes `Critical`.
    pub const CRITICAL_THRESHOLD: f64 = 0.08;

    /// Classifies an available-memory share.
    pub fn from_available_fraction(available: f64) -> Self {
        if available < Self::CRITICAL_THRESHOLD {
            MemoryPressure::Critical
        } else if available < Self::WARNING_THRESHOLD {
            MemoryPressure::Warning
        } else {
            MemoryPressure::Normal
        }
    }

    /// Share of the configured host cache ceiling allowed at this level.
    pub fn budget_scale(&self) -> f64 {
        match self {
            MemoryPressure::Normal => 1.0,
            MemoryPressure::Warning => 0.5,
            MemoryPressure::Critical => 0.25,
        }
    }
}

/// A source of host memory pressure levels.
pub trait PressureSource: Send + Sync {
    /// Polls and classifies the current pressure.
    fn current_pressure(&self) -> MemoryPressure;
}

/// A type that can report device memory statistics.
pub trait VramProvider: Send + Sync {
    /// Bytes of device memory currently allocated.
    fn vram_usage_bytes(&self) -> u64;
    /// Peak bytes of device memory allocated.
    fn vram_peak_bytes(&self) -> u64;
    /// Total device memory, if the driver reports it.
    fn vram_capacity_bytes(&self) -> Option<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_levels() {
        assert_eq!(MemoryPressure::from_available_fraction(0.5), MemoryPressure::Normal);
        assert_eq!(MemoryPressure::from_available_fraction(0.15), MemoryPressure::Warning);
        assert_eq!(MemoryPressure::from_available_fraction(0.05), MemoryPressure::Critical);
    }

    #[test]
    fn test_budget_scale() {
        assert_eq!(MemoryPressure::Normal.budget_scale(), 1.0);
        assert_eq!(MemoryPressure::Warning.budget_scale(), 0.5);
        assert_eq!(MemoryPressure::Critical.budget_scale(), 0.25);
    }

    #[test]
    fn test_available_fraction() {
        let report = ResourceUsageReport {
            current_bytes: 75,
            peak_bytes: None,
            total_capacity_bytes: Some(100),
        };
        assert_eq!(report.available_fraction(), Some(0.25));
        assert_eq!(ResourceUsageReport::default().available_fraction(), None);
    }
}
