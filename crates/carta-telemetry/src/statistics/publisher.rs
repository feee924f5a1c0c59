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

use super::RendererStatistics;
use carta_core::event::{ListenerId, ListenerList};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Delivers [`RendererStatistics`] to subscribers at most once per interval.
#[derive(Debug)]
pub struct StatisticsPublisher {
    listeners: ListenerList<RendererStatistics>,
    interval: Duration,
    last_published: Mutex<Option<Instant>>,
}

impl StatisticsPublisher {
    /// Creates a publisher with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            listeners: ListenerList::new(),
            interval,
            last_published: Mutex::new(None),
        }
    }

    /// Adds a statistics listener.
    pub fn subscribe(
        &self,
        listener: impl Fn(&RendererStatistics) + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Removes a statistics listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Number of subscribers.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether a snapshot should be published at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        if self.listeners.is_empty() {
            return false;
        }
        self.last_published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none_or(|last| now.duration_since(last) >= self.interval)
    }

    /// Builds and publishes a snapshot when due. Returns the listeners reached.
    pub fn publish_if_due(
        &self,
        now: Instant,
        build: impl FnOnce() -> RendererStatistics,
    ) -> Option<usize> {
        if !self.is_due(now) {
            return None;
        }
        *self
            .last_published
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(now);
        let stats = build();
        log::trace!(
            "StatisticsPublisher: {:.1} fps, {} cached entries.",
            stats.frames_per_second,
            stats.cache.entries
        );
        Some(self.listeners.notify(&stats))
    }
}
