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

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Measures the frame rate over a sliding window and keeps a short history.
#[derive(Debug, Clone)]
pub struct FrameRateSampler {
    window: Duration,
    frames: VecDeque<Instant>,
    history: VecDeque<f64>,
    history_len: usize,
    total_frames: u64,
}

impl FrameRateSampler {
    /// Creates a sampler averaging over `window` and remembering `history_len` samples.
    pub fn new(window: Duration, history_len: usize) -> Self {
        Self {
            window,
            frames: VecDeque::new(),
            history: VecDeque::with_capacity(history_len),
            history_len: history_len.max(1),
            total_frames: 0,
        }
    }

    /// Records a presented frame.
    pub fn record_frame(&mut self, now: Instant) {
        self.frames.push_back(now);
        self.total_frames += 1;
        while let Some(&oldest) = self.frames.front() {
            if now.duration_since(oldest) > self.window {
                self.frames.pop_front();
            } else {
                break;
            }
        }
    }

    /// Frames per second across the frames still inside the window.
    pub fn frames_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.frames.front(), self.frames.back()) else {
            return 0.0;
        };
        let span = last.duration_since(*first).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        (self.frames.len() - 1) as f64 / span
    }

    /// Appends the current rate to the history and returns it.
    pub fn sample(&mut self) -> f64 {
        let fps = self.frames_per_second();
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(fps);
        fps
    }

    /// Sampled rates, oldest first.
    pub fn samples(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }

    /// Frames recorded since creation.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Default for FrameRateSampler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 60)
    }
}
