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

//! Service for periodic resource monitoring.

use crate::monitoring::registry::MonitorRegistry;
use std::time::{Duration, Instant};

/// Polls registered monitors at a fixed interval.
#[derive(Debug)]
pub struct TelemetryService {
    monitors: MonitorRegistry,
    last_update: Option<Instant>,
    update_interval: Duration,
}

impl TelemetryService {
    /// Creates a new telemetry service with the given update interval.
    pub fn new(update_interval: Duration) -> Self {
        Self {
            monitors: MonitorRegistry::new(),
            last_update: None,
            update_interval,
        }
    }

    /// Should be called once per frame. Updates every monitor when the interval
    /// has passed, and always on the first call.
    pub fn tick(&mut self) -> bool {
        let due = self
            .last_update
            .is_none_or(|last| last.elapsed() >= self.update_interval);
        if due {
            log::trace!("TelemetryService: Updating all resource monitors...");
            self.monitors.update_all();
            self.last_update = Some(Instant::now());
        }
        due
    }

    /// Returns a reference to the monitor registry.
    pub fn monitor_registry(&self) -> &MonitorRegistry {
        &self.monitors
    }

    /// The polling interval.
    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

impl Default for TelemetryService {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_due() {
        let mut service = TelemetryService::new(Duration::from_secs(3600));
        assert!(service.tick());
        assert!(!service.tick());
    }

    #[test]
    fn test_zero_interval_always_due() {
        let mut service = TelemetryService::new(Duration::ZERO);
        assert!(service.tick());
        assert!(service.tick());
    }
}
