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

/// Draws polylines as line strips.
#[derive(Debug, Default)]
pub struct PolylineBuilder;

impl CommandBuilder for PolylineBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Polyline
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::Polyline { vertices, closed } = item.geometry.shape() else {
            return Ok(Built::Skip);
        };
        if vertices.len() < 2 {
            return Ok(Built::Skip);
        }
        let model = screen_model(item, ctx, cache, |projection| {
            let mut points: Vec<_> = vertices.iter().map(|v| projection.project(v)).collect();
            if *closed {
                points.push(points[0]);
            }
            vec![DrawCommand::new(Topology::LineStrip, points, Rgba8::WHITE)]
        });
        Ok(painted(&model, item, ctx, None))
    }
}
