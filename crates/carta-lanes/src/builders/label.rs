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
use carta_core::render::{RenderContext, Rgba8, ScreenPoint};
use carta_core::renderer::{DrawCommand, RenderError, Topology};
use carta_data::RenderDataCache;

const ADVANCE: f32 = 0.6;
const GLYPH_WIDTH: f32 = 0.5;
const CAP_HEIGHT: f32 = 0.7;

/// Draws labels "greeked": one filled box per visible glyph.
///
/// Needs no font rasterisation, so it works on every device and its pick
/// footprint matches the text extent.
#[derive(Debug, Default)]
pub struct GreekedLabelBuilder;

impl CommandBuilder for GreekedLabelBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Label
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::Label {
            position,
            text,
            font_size,
        } = item.geometry.shape()
        else {
            return Ok(Built::Skip);
        };
        if text.trim().is_empty() || *font_size <= 0.0 {
            return Ok(Built::Skip);
        }
        let model = screen_model(item, ctx, cache, |projection| {
            let anchor = projection.project(position);
            let mut vertices = Vec::new();
            let mut indices = Vec::new();
            for (i, ch) in text.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x0 = anchor.x + i as f32 * ADVANCE * font_size;
                let x1 = x0 + GLYPH_WIDTH * font_size;
                let y0 = anchor.y - CAP_HEIGHT * font_size;
                let base = vertices.len() as u32;
                vertices.extend([
                    ScreenPoint::new(x0, anchor.y),
                    ScreenPoint::new(x1, anchor.y),
                    ScreenPoint::new(x1, y0),
                    ScreenPoint::new(x0, y0),
                ]);
                indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
            }
            vec![DrawCommand::new(Topology::TriangleList, vertices, Rgba8::WHITE).with_indices(indices)]
        });
        Ok(painted(&model, item, ctx, None))
    }
}
