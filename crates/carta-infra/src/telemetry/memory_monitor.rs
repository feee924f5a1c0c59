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

//! Host memory monitor backed by `sysinfo`.
//!
//! Samples the operating system's view of physical memory and classifies it
//! into a [`MemoryPressure`] level used to scale the host cache budget.

use carta_core::telemetry::monitoring::{
    MemoryPressure, MonitoredResourceType, PressureSource, ResourceMonitor, ResourceUsageReport,
};
use std::borrow::Cow;
use std::sync::{Mutex, PoisonError};
use sysinfo::System;

#[derive(Debug, Default)]
struct Sample {
    report: ResourceUsageReport,
    peak_bytes: u64,
    samples: u64,
}

/// Monitors system RAM.
#[derive(Debug)]
pub struct HostMemoryMonitor {
    id: String,
    system: Mutex<System>,
    last: Mutex<Sample>,
}

impl HostMemoryMonitor {
    /// Creates a monitor and takes a first sample.
    pub fn new(id: impl Into<String>) -> Self {
        let monitor = Self {
            id: id.into(),
            system: Mutex::new(System::new()),
            last: Mutex::new(Sample::default()),
        };
        monitor.sample();
        monitor
    }

    /// Number of samples taken so far.
    pub fn sample_count(&self) -> u64 {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).samples
    }

    fn sample(&self) -> ResourceUsageReport {
        let (total, available) = {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            system.refresh_memory();
            (system.total_memory(), system.available_memory())
        };
        let used = total.saturating_sub(available);

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        last.peak_bytes = last.peak_bytes.max(used);
        last.samples += 1;
        last.report = ResourceUsageReport {
            current_bytes: used,
            peak_bytes: Some(last.peak_bytes),
            total_capacity_bytes: (total > 0).then_some(total),
        };
        log::trace!(
            "HostMemoryMonitor: {} of {} bytes in use.",
            used,
            total
        );
        last.report
    }
}

/// Classifies a usage report; an unknown capacity counts as no pressure.
pub fn pressure_of(report: &ResourceUsageReport) -> MemoryPressure {
    report
        .available_fraction()
        .map(MemoryPressure::from_available_fraction)
        .unwrap_or_default()
}

impl ResourceMonitor for HostMemoryMonitor {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Owned(self.id.clone())
    }

    fn resource_type(&self) -> MonitoredResourceType {
        MonitoredResourceType::SystemRam
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).report
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn update(&self) {
        self.sample();
    }
}

impl PressureSource for HostMemoryMonitor {
    fn current_pressure(&self) -> MemoryPressure {
        pressure_of(&self.sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_reports_system_memory() {
        let monitor = HostMemoryMonitor::new("host");
        let report = monitor.get_usage_report();
        assert_eq!(monitor.resource_type(), MonitoredResourceType::SystemRam);
        assert_eq!(monitor.sample_count(), 1);
        if let Some(total) = report.total_capacity_bytes {
            assert!(report.current_bytes <= total);
        }
    }

    #[test]
    fn test_update_tracks_peak() {
        let monitor = HostMemoryMonitor::new("host");
        monitor.update();
        let report = monitor.get_usage_report();
        assert_eq!(monitor.sample_count(), 2);
        assert!(report.peak_bytes.unwrap_or(0) >= report.current_bytes);
    }

    #[test]
    fn test_pressure_of_report() {
        let report = |used| ResourceUsageReport {
            current_bytes: used,
            peak_bytes: None,
            total_capacity_bytes: Some(100),
        };
        assert_eq!(pressure_of(&report(50)), MemoryPressure::Normal);
        assert_eq!(pressure_of(&report(85)), MemoryPressure::Warning);
        assert_eq!(pressure_of(&report(95)), MemoryPressure::Critical);
        assert_eq!(
            pressure_of(&ResourceUsageReport::default()),
            MemoryPressure::Normal
        );
    }
}
