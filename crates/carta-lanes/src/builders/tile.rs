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

use super::{painted, screen_model, texture, textured_quad, TextureLookup};
use crate::render_lane::{Built, CommandBuilder, RenderItem};
use carta_core::geometry::{GeometryKind, GeometryShape, ImageSource};
use carta_core::render::{RenderContext, RenderMode, Rgba8};
use carta_core::renderer::{DrawCommand, GraphicsDevice, RenderError, Topology};
use carta_data::RenderDataCache;
use std::sync::Arc;

/// Drapes tile imagery over its bounding box.
///
/// PICK passes fill the box with the pick color and never touch the texture.
pub struct TileBuilder {
    images: Option<Arc<dyn ImageSource>>,
}

impl TileBuilder {
    /// Creates a builder resolving keyed imagery through `images`.
    pub fn new(images: Option<Arc<dyn ImageSource>>) -> Self {
        Self { images }
    }
}

impl CommandBuilder for TileBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Tile
    }

    fn is_viable(&self, device: &dyn GraphicsDevice, warnings: &mut Vec<String>) -> bool {
        let max = device.capabilities().max_texture_size;
        if max == 0 {
            warnings.push("TileBuilder: the device cannot create textures".to_string());
        }
        max > 0
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::Tile { bounds, image } = item.geometry.shape() else {
            return Ok(Built::Skip);
        };
        let model = screen_model(item, ctx, cache, |projection| {
            vec![textured_quad(bounds.corners().map(|c| projection.project(&c)))]
        });
        if ctx.mode == RenderMode::Pick {
            return Ok(painted(&model, item, ctx, None));
        }
        match texture(item, image, ctx, cache, self.images.as_deref())? {
            TextureLookup::Ready(handle) => Ok(painted(&model, item, ctx, Some(handle))),
            TextureLookup::NotReady => Ok(Built::NotReady),
            TextureLookup::Unusable => Ok(Built::Skip),
        }
    }
}

/// Outlines tile bounds without sampling imagery.
#[derive(Debug, Default)]
pub struct TileOutlineBuilder;

impl CommandBuilder for TileOutlineBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Tile
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::Tile { bounds, .. } = item.geometry.shape() else {
            return Ok(Built::Skip);
        };
        let model = screen_model(item, ctx, cache, |projection| {
            let mut points: Vec<_> = bounds.corners().iter().map(|c| projection.project(c)).collect();
            points.push(points[0]);
            vec![DrawCommand::new(Topology::LineStrip, points, Rgba8::WHITE)]
        });
        Ok(painted(&model, item, ctx, None))
    }
}
