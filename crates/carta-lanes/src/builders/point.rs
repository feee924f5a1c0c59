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

use super::{painted, screen_model};
use crate::render_lane::{Built, CommandBuilder, RenderItem};
use carta_core::geometry::{GeometryKind, GeometryShape};
use carta_core::render::{RenderContext, Rgba8};
use carta_core::renderer::{DrawCommand, RenderError, Topology};
use carta_data::RenderDataCache;

/// Draws points as square markers of `point_size` pixels.
#[derive(Debug, Default)]
pub struct PointBuilder;

impl CommandBuilder for PointBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Point
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::Point { position } = item.geometry.shape() else {
            return Ok(Built::Skip);
        };
        let model = screen_model(item, ctx, cache, |projection| {
            vec![DrawCommand::new(
                Topology::Points,
                vec![projection.project(position)],
                Rgba8::WHITE,
            )]
        });
        Ok(painted(&model, item, ctx, None))
    }
}
