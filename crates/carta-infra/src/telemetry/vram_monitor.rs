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

//! Device memory monitor.
//!
//! Reports the allocations of a graphics device through the [`ResourceMonitor`]
//! interface so the telemetry service never depends on a concrete backend.

use carta_core::telemetry::monitoring::{
    MonitoredResourceType, ResourceMonitor, ResourceUsageReport, VramProvider,
};
use std::borrow::Cow;
use std::sync::Weak;

/// Monitors the device memory of a [`VramProvider`].
#[derive(Debug)]
pub struct VramMonitor {
    /// Weak so the monitor never keeps a lost device alive.
    vram_provider: Weak<dyn VramProvider>,
    monitor_id: String,
}

impl VramMonitor {
    /// Creates a monitor for `vram_provider`.
    pub fn new(vram_provider: Weak<dyn VramProvider>, monitor_id: impl Into<String>) -> Self {
        Self {
            vram_provider,
            monitor_id: monitor_id.into(),
        }
    }
}

impl ResourceMonitor for VramMonitor {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Owned(self.monitor_id.clone())
    }

    fn resource_type(&self) -> MonitoredResourceType {
        MonitoredResourceType::Vram
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        match self.vram_provider.upgrade() {
            Some(provider) => ResourceUsageReport {
                current_bytes: provider.vram_usage_bytes(),
                peak_bytes: Some(provider.vram_peak_bytes()),
                total_capacity_bytes: provider.vram_capacity_bytes(),
            },
            None => ResourceUsageReport::default(),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
