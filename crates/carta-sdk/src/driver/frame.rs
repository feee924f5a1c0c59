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

use carta_core::geometry::GeometryKind;
use std::time::Duration;

/// What one call to [`FrameDriver::display`](super::FrameDriver::display) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was drawn.
    Rendered(FrameStats),
    /// Another frame or the initialisation was still running; nothing was drawn.
    Skipped,
    /// A fatal fault stopped the pipeline; frames are refused.
    Faulted,
    /// The driver was shut down.
    Closed,
}

impl FrameOutcome {
    /// The statistics of a rendered frame.
    pub fn stats(&self) -> Option<&FrameStats> {
        match self {
            FrameOutcome::Rendered(stats) => Some(stats),
            _ => None,
        }
    }
}

/// Per-frame counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Render-thread tasks run before drawing.
    pub tasks_run: usize,
    /// Whether a PICK pass ran.
    pub picked: bool,
    /// Geometries drawn in the DRAW pass.
    pub rendered: usize,
    /// Geometries without model data this frame, retried later.
    pub rejected: usize,
    /// Device submissions of the DRAW pass.
    pub draw_calls: usize,
    /// Kinds with geometries but no usable renderer.
    pub unsupported: Vec<GeometryKind>,
    /// Cache associations purged for removed geometries.
    pub purged: usize,
    /// Device resources freed after drawing.
    pub freed: usize,
    /// Wall time spent in the frame, initialisation excluded.
    pub frame_time: Duration,
}

/// The cursor position probed by PICK passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickPoint {
    /// Framebuffer column.
    pub x: u32,
    /// Framebuffer row, top first.
    pub y: u32,
    /// Half-size of the square window decoded around the point.
    pub radius: u32,
}

impl PickPoint {
    /// A pick point with the default three-pixel tolerance.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y, radius: 3 }
    }

    /// Sets the tolerance.
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }
}
