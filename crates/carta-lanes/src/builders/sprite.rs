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
use carta_core::render::{RenderContext, RenderMode, Rgba8, ScreenPoint};
use carta_core::renderer::{DrawCommand, GraphicsDevice, RenderError, Topology};
use carta_data::RenderDataCache;
use std::sync::Arc;

/// Draws point sprites as screen-aligned textured squares.
pub struct SpriteBuilder {
    images: Option<Arc<dyn ImageSource>>,
}

impl SpriteBuilder {
    /// Creates a builder resolving keyed imagery through `images`.
    pub fn new(images: Option<Arc<dyn ImageSource>>) -> Self {
        Self { images }
    }
}

impl CommandBuilder for SpriteBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::PointSprite
    }

    fn is_viable(&self, device: &dyn GraphicsDevice, warnings: &mut Vec<String>) -> bool {
        let max = device.capabilities().max_texture_size;
        if max == 0 {
            warnings.push("SpriteBuilder: the device cannot create textures".to_string());
        }
        max > 0
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::PointSprite {
            position,
            image,
            size_px,
        } = item.geometry.shape()
        else {
            return Ok(Built::Skip);
        };
        let half = size_px / 2.0;
        let model = screen_model(item, ctx, cache, |projection| {
            let c = projection.project(position);
            vec![textured_quad([
                ScreenPoint::new(c.x - half, c.y + half),
                ScreenPoint::new(c.x + half, c.y + half),
                ScreenPoint::new(c.x + half, c.y - half),
                ScreenPoint::new(c.x - half, c.y - half),
            ])]
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

/// Draws sprites as plain markers of `point_size` pixels.
#[derive(Debug, Default)]
pub struct SpriteMarkerBuilder;

impl CommandBuilder for SpriteMarkerBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::PointSprite
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::PointSprite { position, .. } = item.geometry.shape() else {
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
