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

//! Per-kind command builders.
//!
//! Builders cache their projection-bound screen model under the geometry's key
//! and color it per pass, so changing a geometry's color or switching between
//! DRAW and PICK never recomputes projected vertices.

mod label;
mod mesh;
mod point;
mod polygon;
mod polyline;
mod sprite;
mod tile;

pub use label::GreekedLabelBuilder;
pub use mesh::{MeshBufferBuilder, MeshBuilder};
pub use point::PointBuilder;
pub use polygon::{triangulate, PolygonBuilder};
pub use polyline::PolylineBuilder;
pub use sprite::{SpriteBuilder, SpriteMarkerBuilder};
pub use tile::{TileBuilder, TileOutlineBuilder};

use crate::model::{ScreenModel, TextureModel};
use crate::render_lane::{Built, RenderItem};
use carta_core::geometry::{ImageFetch, ImageSource, TileImage};
use carta_core::render::{ProjectionSnapshot, RenderContext, Rgba8, ScreenPoint};
use carta_core::renderer::{DrawCommand, RenderError, ResourceHandle, TextureDescriptor, Topology};
use carta_data::{Footprint, RenderDataCache};
use std::sync::Arc;

/// Returns the cached screen model of `item` under the current projection,
/// computing and caching it on a miss.
///
/// A model too large for the host budget is still returned, uncached.
pub(crate) fn screen_model(
    item: &RenderItem,
    ctx: &RenderContext<'_>,
    cache: &RenderDataCache,
    compute: impl Fn(&ProjectionSnapshot) -> Vec<DrawCommand>,
) -> Arc<ScreenModel> {
    let projection = ctx.projection.id();
    if let Some(model) = cache.get_cache_association::<ScreenModel>(item.key, Some(projection)) {
        return model;
    }
    let model = ScreenModel {
        commands: compute(ctx.projection),
    };
    let footprint = Footprint::host(model.host_bytes()).bound_to(projection);
    match cache.insert(item.key, model, footprint) {
        Ok(model) => model,
        Err(e) => {
            log::debug!("Builders: screen model of {} left uncached: {e}", item.key);
            Arc::new(ScreenModel {
                commands: compute(ctx.projection),
            })
        }
    }
}

/// Paints a screen model for the current pass.
pub(crate) fn painted(
    model: &ScreenModel,
    item: &RenderItem,
    ctx: &RenderContext<'_>,
    texture: Option<ResourceHandle>,
) -> Built {
    let properties = item.geometry.properties();
    let color = ctx.color_for(&item.geometry);
    Built::Commands(model.paint(ctx.mode, color, &properties, texture))
}

/// Result of a texture lookup.
pub(crate) enum TextureLookup {
    Ready(ResourceHandle),
    NotReady,
    Unusable,
}

/// Returns the device texture of `image`, uploading it on a miss.
///
/// Textures do not depend on the projection and are cached once per geometry.
pub(crate) fn texture(
    item: &RenderItem,
    image: &TileImage,
    ctx: &RenderContext<'_>,
    cache: &RenderDataCache,
    images: Option<&dyn ImageSource>,
) -> Result<TextureLookup, RenderError> {
    if let Some(model) = cache.get_cache_association::<TextureModel>(item.key, None) {
        return Ok(TextureLookup::Ready(model.handle));
    }
    let data = match image.resolve(images) {
        ImageFetch::Ready(data) => data,
        ImageFetch::Pending => return Ok(TextureLookup::NotReady),
        ImageFetch::Failed(reason) => {
            log::debug!("Builders: image of {} unavailable: {reason}", item.geometry.id());
            return Ok(TextureLookup::Unusable);
        }
    };
    let max = ctx.device.capabilities().max_texture_size;
    if !data.is_well_formed() || data.width == 0 || data.width > max || data.height > max {
        log::warn!(
            "Builders: image of {} ({}x{}) cannot be uploaded, device limit is {max}.",
            item.geometry.id(),
            data.width,
            data.height
        );
        return Ok(TextureLookup::Unusable);
    }
    let descriptor =
        TextureDescriptor::rgba8(format!("texture {}", item.key), data.width, data.height);
    let handle = ctx.device.create_texture(&descriptor, &data.pixels)?;
    let footprint = Footprint::host(std::mem::size_of::<TextureModel>() as u64).with_handle(handle);
    if let Err(e) = cache.insert(item.key, TextureModel { handle }, footprint) {
        log::debug!("Builders: texture of {} used once, not cached: {e}", item.key);
    }
    Ok(TextureLookup::Ready(handle))
}

/// A textured quad from four corners ordered bottom-left, bottom-right,
/// top-right, top-left. The image's top row maps to the top edge.
pub(crate) fn textured_quad(corners: [ScreenPoint; 4]) -> DrawCommand {
    let mut command = DrawCommand::new(Topology::TriangleList, corners.to_vec(), Rgba8::WHITE)
        .with_indices(vec![0, 1, 2, 0, 2, 3]);
    command.tex_coords = vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    command
}
