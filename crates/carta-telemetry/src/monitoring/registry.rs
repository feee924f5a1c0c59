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

//! Registry for managing resource monitors.

use carta_core::telemetry::monitoring::{
    MonitoredResourceType, ResourceMonitor, ResourceUsageReport,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A thread-safe registry for resource monitors.
#[derive(Debug, Clone, Default)]
pub struct MonitorRegistry {
    monitors: Arc<Mutex<Vec<Arc<dyn ResourceMonitor>>>>,
}

impl MonitorRegistry {
    /// Creates a new, empty monitor registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Arc<dyn ResourceMonitor>>> {
        self.monitors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new resource monitor.
    pub fn register(&self, monitor: Arc<dyn ResourceMonitor>) {
        let monitor_id = monitor.monitor_id().to_string();
        self.guard().push(monitor);
        log::info!("Registered resource monitor: {monitor_id}");
    }

    /// Removes the monitor with the given id. Returns whether one was found.
    pub fn unregister(&self, monitor_id: &str) -> bool {
        let mut monitors = self.guard();
        let before = monitors.len();
        monitors.retain(|monitor| monitor.monitor_id() != monitor_id);
        before != monitors.len()
    }

    /// Calls `update` on all registered monitors.
    pub fn update_all(&self) {
        for monitor in self.get_all_monitors() {
            monitor.update();
        }
    }

    /// Returns a clone of all registered monitors.
    pub fn get_all_monitors(&self) -> Vec<Arc<dyn ResourceMonitor>> {
        self.guard().clone()
    }

    /// Latest report of the first monitor of the given type.
    pub fn report_for(&self, resource_type: MonitoredResourceType) -> Option<ResourceUsageReport> {
        self.guard()
            .iter()
            .find(|monitor| monitor.resource_type() == resource_type)
            .map(|monitor| monitor.get_usage_report())
    }

    /// Number of registered monitors.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether no monitor is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Default)]
    struct CountingMonitor {
        updates: AtomicU64,
    }

    impl ResourceMonitor for CountingMonitor {
        fn monitor_id(&self) -> Cow<'static, str> {
            Cow::Borrowed("counting")
        }
        fn resource_type(&self) -> MonitoredResourceType {
            MonitoredResourceType::SystemRam
        }
        fn get_usage_report(&self) -> ResourceUsageReport {
            ResourceUsageReport {
                current_bytes: self.updates.load(Ordering::SeqCst),
                ..ResourceUsageReport::default()
            }
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn update(&self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_register_update_and_report() {
        let registry = MonitorRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(CountingMonitor::default()));
        registry.update_all();
        registry.update_all();

        let report = registry
            .report_for(MonitoredResourceType::SystemRam)
            .unwrap();
        assert_eq!(report.current_bytes, 2);
        assert!(registry.report_for(MonitoredResourceType::Vram).is_none());
    }

    #[test]
    fn test_unregister() {
        let registry = MonitorRegistry::new();
        registry.register(Arc::new(CountingMonitor::default()));
        assert!(registry.unregister("counting"));
        assert!(!registry.unregister("counting"));
        assert_eq!(registry.len(), 0);
    }
}
