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

//! The bundle of per-pass state handed to every renderer.

use super::{ProjectionSnapshot, RenderMode, Rgba8, TimeBudget};
use crate::geometry::{Geometry, GeometryId};
use crate::renderer::GraphicsDevice;
use std::collections::HashSet;
use std::fmt;

/// Supplies the unique identity color of a geometry for PICK passes.
pub trait PickColorProvider: Send + Sync {
    /// Returns the pick color of `geometry`, allocating one if needed.
    fn pick_color(&self, geometry: &Geometry) -> Rgba8;
}

/// Everything a renderer needs for one pass.
///
/// Contexts are cheap to copy; derived contexts share the device and projection
/// of their parent.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// The device to draw with. Only valid on the render thread.
    pub device: &'a dyn GraphicsDevice,
    /// The purpose of the pass.
    pub mode: RenderMode,
    /// The projection the frame is computed under.
    pub projection: &'a ProjectionSnapshot,
    /// The deadline for the pass.
    pub budget: TimeBudget,
    /// Source of pick colors; required for PICK passes.
    pub pick_colors: Option<&'a dyn PickColorProvider>,
    /// Geometries currently picked, highlighted in DRAW passes.
    pub highlighted: Option<&'a HashSet<GeometryId>>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context with an unlimited budget and no pick state.
    pub fn new(
        device: &'a dyn GraphicsDevice,
        mode: RenderMode,
        projection: &'a ProjectionSnapshot,
    ) -> Self {
        Self {
            device,
            mode,
            projection,
            budget: TimeBudget::unlimited(),
            pick_colors: None,
            highlighted: None,
        }
    }

    /// Derives a context with another budget.
    pub fn with_budget(&self, budget: TimeBudget) -> Self {
        Self { budget, ..*self }
    }

    /// Derives a context for another mode.
    pub fn with_mode(&self, mode: RenderMode) -> Self {
        Self { mode, ..*self }
    }

    /// Derives a context with a pick color provider.
    pub fn with_pick_colors(&self, provider: &'a dyn PickColorProvider) -> Self {
        Self {
            pick_colors: Some(provider),
            ..*self
        }
    }

    /// Derives a context with a highlight set.
    pub fn with_highlighted(&self, highlighted: &'a HashSet<GeometryId>) -> Self {
        Self {
            highlighted: Some(highlighted),
            ..*self
        }
    }

    /// Returns the color `geometry` is drawn with in this pass.
    ///
    /// PICK passes use the geometry's identity color, or the background when no
    /// provider is set or the geometry is not pickable.
    pub fn color_for(&self, geometry: &Geometry) -> Rgba8 {
        let properties = geometry.properties();
        match self.mode {
            RenderMode::Pick => match self.pick_colors {
                Some(provider) if properties.pickable => provider.pick_color(geometry),
                _ => Rgba8::BLACK,
            },
            RenderMode::Draw => {
                let picked = self
                    .highlighted
                    .is_some_and(|set| set.contains(&geometry.id()));
                if picked {
                    properties.highlight_color
                } else {
                    properties.color
                }
            }
        }
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("mode", &self.mode)
            .field("projection", &self.projection.id())
            .field("budget", &self.budget)
            .finish()
    }
}
