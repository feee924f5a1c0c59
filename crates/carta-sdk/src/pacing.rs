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

//! Frame-rate control: repaint coalescing, frame pacing and the pick throttle.

use carta_core::config::FrameRateMode;
use carta_core::event::{ListenerId, ListenerList};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Collapses repaint requests between two frames into one notification.
#[derive(Debug, Default)]
pub struct RepaintCoalescer {
    pending: AtomicBool,
    listeners: ListenerList<()>,
}

impl RepaintCoalescer {
    /// Creates a coalescer without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener invoked when a repaint is needed.
    pub fn subscribe(&self, listener: impl Fn(&()) + Send + Sync + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Removes a repaint listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Requests a repaint. Only the first request since the last frame began
    /// reaches the listeners; returns whether this one did.
    pub fn request_repaint(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.listeners.notify(&());
        true
    }

    /// Whether a repaint was requested since the last frame began.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Marks the start of a frame, re-arming the notification.
    pub fn frame_started(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

/// Decides when the windowing layer should schedule the next frame.
#[derive(Debug, Clone)]
pub struct FramePacer {
    mode: FrameRateMode,
    last_frame: Option<Instant>,
}

impl FramePacer {
    /// Creates a pacer for `mode`.
    pub fn new(mode: FrameRateMode) -> Self {
        Self {
            mode,
            last_frame: None,
        }
    }

    /// The pacing mode.
    pub fn mode(&self) -> FrameRateMode {
        self.mode
    }

    /// Whether a frame should be rendered at `now`.
    pub fn is_due(&self, now: Instant, repaint_pending: bool) -> bool {
        match self.mode {
            FrameRateMode::Unbounded => true,
            FrameRateMode::OnDemand => repaint_pending || self.last_frame.is_none(),
            FrameRateMode::Fixed(_) => self.time_until_next(now).is_zero(),
        }
    }

    /// Time left before the next fixed-rate frame; zero when due or unpaced.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        match (self.mode.frame_interval(), self.last_frame) {
            (Some(interval), Some(last)) => (last + interval).saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    /// Records that a frame was rendered at `now`.
    pub fn frame_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }
}

/// Limits how often PICK passes run.
#[derive(Debug, Clone)]
pub struct PickThrottle {
    interval: Duration,
    every_frame: bool,
    last_pick: Option<Instant>,
}

impl PickThrottle {
    /// Creates a throttle; in on-demand mode every frame may pick.
    pub fn new(interval: Duration, mode: FrameRateMode) -> Self {
        Self {
            interval,
            every_frame: mode == FrameRateMode::OnDemand,
            last_pick: None,
        }
    }

    /// Returns `true` and records the pass if a PICK pass may run at `now`.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let allowed = self.every_frame
            || self
                .last_pick
                .is_none_or(|last| now.duration_since(last) >= self.interval);
        if allowed {
            self.last_pick = Some(now);
        }
        allowed
    }
}
