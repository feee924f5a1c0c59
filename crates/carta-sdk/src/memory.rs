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

use carta_core::telemetry::{MemoryPressure, PressureSource};
use carta_data::RenderDataCache;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Polls a pressure source and scales the host cache ceiling to match.
pub struct MemoryPressureWatcher {
    source: Arc<dyn PressureSource>,
    interval: Duration,
    last_poll: Option<Instant>,
    level: MemoryPressure,
}

impl MemoryPressureWatcher {
    /// Watches `source`, polling at most once per `interval`.
    pub fn new(source: Arc<dyn PressureSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            last_poll: None,
            level: MemoryPressure::Normal,
        }
    }

    /// The last observed level.
    pub fn level(&self) -> MemoryPressure {
        self.level
    }

    /// Polls when due and applies a changed level to `cache`. Returns the new
    /// level when it changed.
    pub fn poll(&mut self, now: Instant, cache: &RenderDataCache) -> Option<MemoryPressure> {
        if self
            .last_poll
            .is_some_and(|last| now.duration_since(last) < self.interval)
        {
            return None;
        }
        self.last_poll = Some(now);
        let level = self.source.current_pressure();
        if level == self.level {
            return None;
        }
        if level > self.level {
            log::warn!("MemoryPressureWatcher: Host memory pressure rose to {level:?}.");
        } else {
            log::info!("MemoryPressureWatcher: Host memory pressure eased to {level:?}.");
        }
        self.level = level;
        cache.apply_memory_pressure(level);
        Some(level)
    }
}

impl std::fmt::Debug for MemoryPressureWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPressureWatcher")
            .field("interval", &self.interval)
            .field("level", &self.level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_data::{BudgetClass, CacheBudgets};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted(Mutex<MemoryPressure>);

    impl PressureSource for Scripted {
        fn current_pressure(&self) -> MemoryPressure {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn test_pressure_scales_host_budget() {
        let source = Arc::new(Scripted::default());
        let cache = RenderDataCache::new(CacheBudgets {
            host_max_bytes: 1000,
            ..CacheBudgets::default()
        });
        let mut watcher = MemoryPressureWatcher::new(source.clone(), Duration::from_millis(100));
        let start = Instant::now();

        assert_eq!(watcher.poll(start, &cache), None);
        *source.0.lock().unwrap() = MemoryPressure::Critical;
        assert_eq!(watcher.poll(start + Duration::from_millis(10), &cache), None);
        assert_eq!(
            watcher.poll(start + Duration::from_millis(100), &cache),
            Some(MemoryPressure::Critical)
        );
        assert_eq!(cache.usage(BudgetClass::Host).max, 250);

        *source.0.lock().unwrap() = MemoryPressure::Normal;
        watcher.poll(start + Duration::from_millis(200), &cache);
        assert_eq!(cache.usage(BudgetClass::Host).max, 1000);
    }
}
