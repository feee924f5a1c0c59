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

//! Frame-buffer capture requests.
//!
//! The framebuffer is read back once per frame, and only when at least one
//! listener is due.

use carta_core::renderer::{GraphicsDevice, RenderError};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Receives `(width, height, rgba_pixels)` of a captured frame.
pub type CaptureListener = Box<dyn FnMut(u32, u32, &[u8]) + Send>;

/// Handle of a capture request, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureId(u64);

#[derive(Debug, Clone, Copy)]
enum Schedule {
    Once,
    EveryFrame,
    Every {
        interval: Duration,
        last: Option<Instant>,
    },
}

impl Schedule {
    fn is_due(&self, now: Instant) -> bool {
        match self {
            Schedule::Once | Schedule::EveryFrame => true,
            Schedule::Every { interval, last } => {
                last.is_none_or(|last| now.duration_since(last) >= *interval)
            }
        }
    }

    /// Wait before this schedule needs a frame of its own. Streams follow
    /// whatever frames are rendered and never ask for one.
    fn time_until_due(&self, now: Instant) -> Option<Duration> {
        match self {
            Schedule::Once => Some(Duration::ZERO),
            Schedule::EveryFrame => None,
            Schedule::Every { interval, last } => Some(last.map_or(Duration::ZERO, |last| {
                interval.saturating_sub(now.saturating_duration_since(last))
            })),
        }
    }
}

struct Request {
    id: CaptureId,
    schedule: Schedule,
    listener: CaptureListener,
}

#[derive(Default)]
struct CaptureState {
    next_id: u64,
    requests: Vec<Request>,
    delivering: HashSet<CaptureId>,
    cancelled: HashSet<CaptureId>,
}

/// Pending capture requests.
#[derive(Default)]
pub struct CaptureRequests {
    state: Mutex<CaptureState>,
}

impl CaptureRequests {
    /// Creates an empty request list.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, schedule: Schedule, listener: CaptureListener) -> CaptureId {
        let mut state = self.state();
        state.next_id += 1;
        let id = CaptureId(state.next_id);
        state.requests.push(Request {
            id,
            schedule,
            listener,
        });
        id
    }

    /// Captures the next rendered frame once.
    pub fn single(&self, listener: CaptureListener) -> CaptureId {
        self.add(Schedule::Once, listener)
    }

    /// Captures every rendered frame until cancelled.
    pub fn stream(&self, listener: CaptureListener) -> CaptureId {
        self.add(Schedule::EveryFrame, listener)
    }

    /// Captures a rendered frame at most once per `interval` until cancelled.
    pub fn scheduled(&self, listener: CaptureListener, interval: Duration) -> CaptureId {
        self.add(
            Schedule::Every {
                interval,
                last: None,
            },
            listener,
        )
    }

    /// Cancels a request. Returns `false` if it is unknown or already finished.
    pub fn cancel(&self, id: CaptureId) -> bool {
        let mut state = self.state();
        let before = state.requests.len();
        state.requests.retain(|request| request.id != id);
        if state.requests.len() != before {
            return true;
        }
        // Requests being delivered are outside the list until restored.
        if state.delivering.remove(&id) {
            state.cancelled.insert(id);
            return true;
        }
        false
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.state().requests.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shortest wait before a pending single or scheduled capture falls due.
    ///
    /// `None` when only streams (or nothing) are pending.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.state()
            .requests
            .iter()
            .filter_map(|request| request.schedule.time_until_due(now))
            .min()
    }

    /// Reads the framebuffer back and feeds every due listener.
    ///
    /// Returns the number of listeners invoked. No readback happens when
    /// nobody is due.
    pub fn deliver(&self, device: &dyn GraphicsDevice, now: Instant) -> Result<usize, RenderError> {
        let mut requests = {
            let mut state = self.state();
            if !state.requests.iter().any(|r| r.schedule.is_due(now)) {
                return Ok(0);
            }
            let requests = std::mem::take(&mut state.requests);
            state.delivering = requests.iter().map(|request| request.id).collect();
            requests
        };

        let (width, height) = device.framebuffer_size();
        let pixels = match device.read_pixels(0, 0, width, height) {
            Ok(pixels) => pixels,
            Err(e) => {
                self.restore(requests);
                return Err(e);
            }
        };

        let mut delivered = 0;
        requests.retain_mut(|request| {
            if !request.schedule.is_due(now) {
                return true;
            }
            (request.listener)(width, height, &pixels);
            delivered += 1;
            match &mut request.schedule {
                Schedule::Once => false,
                Schedule::EveryFrame => true,
                Schedule::Every { last, .. } => {
                    *last = Some(now);
                    true
                }
            }
        });
        log::trace!("CaptureRequests: Delivered {width}x{height} frame to {delivered} listeners.");
        self.restore(requests);
        Ok(delivered)
    }

    fn restore(&self, mut requests: Vec<Request>) {
        let mut state = self.state();
        let cancelled = std::mem::take(&mut state.cancelled);
        state.delivering.clear();
        requests.retain(|request| !cancelled.contains(&request.id));
        // Requests added while delivering go after the existing ones.
        requests.append(&mut state.requests);
        state.requests = requests;
    }
}

impl fmt::Debug for CaptureRequests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRequests")
            .field("pending", &self.len())
            .finish()
    }
}
