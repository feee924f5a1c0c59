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

//! Per-frame rendering value types.
//!
//! This module holds the small, immutable values that flow through every render
//! pass: the [`RenderMode`], the [`ProjectionSnapshot`] a frame is computed
//! under, the [`TimeBudget`] bounding its work and the [`RenderContext`] that
//! bundles them together with the device.

mod budget;
mod color;
mod context;
mod projection;

pub use budget::TimeBudget;
pub use color::Rgba8;
pub use context::{PickColorProvider, RenderContext};
pub use projection::{ProjectionId, ProjectionSnapshot, ScreenPoint, EARTH_RADIUS_M, MAX_MERCATOR_LAT};

use std::fmt;

/// The purpose of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderMode {
    /// Visible output.
    Draw,
    /// Off-screen identity pass, each geometry in its unique pick color.
    Pick,
}

impl RenderMode {
    /// Both modes, in dry-run order.
    pub const ALL: [RenderMode; 2] = [RenderMode::Pick, RenderMode::Draw];
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Draw => f.write_str("DRAW"),
            RenderMode::Pick => f.write_str("PICK"),
        }
    }
}

/// A pair of values, one per [`RenderMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerMode<T> {
    /// Value used by DRAW passes.
    pub draw: T,
    /// Value used by PICK passes.
    pub pick: T,
}

impl<T> PerMode<T> {
    /// Creates a pair from explicit values.
    pub fn new(draw: T, pick: T) -> Self {
        Self { draw, pick }
    }

    /// Returns the value for `mode`.
    pub fn get(&self, mode: RenderMode) -> &T {
        match mode {
            RenderMode::Draw => &self.draw,
            RenderMode::Pick => &self.pick,
        }
    }

    /// Returns the value for `mode` mutably.
    pub fn get_mut(&mut self, mode: RenderMode) -> &mut T {
        match mode {
            RenderMode::Draw => &mut self.draw,
            RenderMode::Pick => &mut self.pick,
        }
    }
}
