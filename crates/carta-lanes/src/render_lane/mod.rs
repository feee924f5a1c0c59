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

//! Renderer contracts.

mod compiled;
mod immediate;

pub use compiled::{CompiledDrawListFactory, CompiledRenderer};
pub use immediate::{ImmediateFactory, ImmediateRenderer};

use carta_core::geometry::{Geometry, GeometryId, GeometryKind};
use carta_core::render::RenderContext;
use carta_core::renderer::{DrawCommand, GraphicsDevice, RenderError};
use carta_data::{GeometryKey, RenderDataCache};
use std::sync::Arc;

/// A geometry retained by a processor, with its cache key.
#[derive(Debug, Clone)]
pub struct RenderItem {
    /// Generation-checked key used for every cache association of the geometry.
    pub key: GeometryKey,
    /// The geometry itself.
    pub geometry: Arc<Geometry>,
}

/// The result of rendering a batch of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Items drawn this pass.
    pub rendered: usize,
    /// Items without render data this pass; retried on a later frame.
    pub rejected: Vec<GeometryId>,
    /// Device submissions issued.
    pub draw_calls: usize,
}

impl RenderOutcome {
    /// Folds another outcome into this one.
    pub fn merge(&mut self, other: RenderOutcome) {
        self.rendered += other.rendered;
        self.rejected.extend(other.rejected);
        self.draw_calls += other.draw_calls;
    }
}

/// A renderer instance for one geometry kind.
///
/// Renderers are created by a [`RendererFactory`] once the renderer set is
/// committed and are only used on the render thread.
pub trait GeometryRenderer: Send {
    /// Human-readable name of the strategy.
    fn name(&self) -> &str;

    /// The kind this renderer draws.
    fn kind(&self) -> GeometryKind;

    /// Renders `items` in `ctx.mode` within `ctx.budget`.
    ///
    /// Items whose model data cannot be produced this pass are reported as
    /// rejected. An `Err` is a renderer fault, not a per-geometry failure.
    fn render(
        &mut self,
        items: &[RenderItem],
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<RenderOutcome, RenderError>;

    /// Releases anything the renderer holds outside the cache.
    fn close(&mut self) {}
}

/// Produces renderers of one strategy for one geometry kind.
pub trait RendererFactory: Send + Sync {
    /// Human-readable name of the strategy, used in viability reports.
    fn name(&self) -> &str;

    /// The kind the produced renderers draw.
    fn kind(&self) -> GeometryKind;

    /// Checks whether the strategy can work on `device`, recording reasons in `warnings`.
    fn is_viable(&self, device: &dyn GraphicsDevice, warnings: &mut Vec<String>) -> bool;

    /// Whether this is the most conservative strategy for its kind.
    fn is_conservative(&self) -> bool {
        false
    }

    /// The per-geometry command builder, when the strategy has an immediate-mode
    /// variant that a compiling decorator can wrap.
    fn command_builder(&self) -> Option<Arc<dyn CommandBuilder>> {
        None
    }

    /// Creates a renderer instance.
    fn create(&self) -> Box<dyn GeometryRenderer>;
}

/// What a [`CommandBuilder`] produced for one geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    /// Draw commands ready for submission.
    Commands(Vec<DrawCommand>),
    /// Data is not available yet; the geometry is rejected for this pass.
    NotReady,
    /// Nothing to draw for this geometry in this mode.
    Skip,
}

/// Turns one geometry into screen-space draw commands.
pub trait CommandBuilder: Send + Sync {
    /// The kind handled by this builder.
    fn kind(&self) -> GeometryKind;

    /// Device requirements of the builder.
    fn is_viable(&self, _device: &dyn GraphicsDevice, _warnings: &mut Vec<String>) -> bool {
        true
    }

    /// Builds the commands of `item` for `ctx`, caching model data in `cache`.
    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError>;
}
