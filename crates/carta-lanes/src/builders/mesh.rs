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

//! Polygon meshes, either submitted from host memory or from a device vertex buffer.

use super::{painted, screen_model};
use crate::model::MeshBufferModel;
use crate::render_lane::{Built, CommandBuilder, RenderItem};
use carta_core::geometry::{GeoPosition, GeometryKind, GeometryShape};
use carta_core::render::{RenderContext, Rgba8, ScreenPoint};
use carta_core::renderer::{DrawCommand, GraphicsDevice, RenderError, Topology};
use carta_data::{Footprint, RenderDataCache};

fn valid_mesh(item: &RenderItem) -> Option<(&[GeoPosition], &[u32])> {
    let GeometryShape::PolygonMesh { vertices, indices } = item.geometry.shape() else {
        return None;
    };
    if indices.is_empty() || indices.len() % 3 != 0 {
        return None;
    }
    if indices.iter().any(|&i| i as usize >= vertices.len()) {
        log::warn!("MeshBuilder: {} has out-of-range indices.", item.geometry.id());
        return None;
    }
    Some((vertices, indices))
}

/// Submits mesh triangles from host memory.
#[derive(Debug, Default)]
pub struct MeshBuilder;

impl CommandBuilder for MeshBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::PolygonMesh
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let Some((vertices, indices)) = valid_mesh(item) else {
            return Ok(Built::Skip);
        };
        let model = screen_model(item, ctx, cache, |projection| {
            let points = vertices.iter().map(|v| projection.project(v)).collect();
            vec![DrawCommand::new(Topology::TriangleList, points, Rgba8::WHITE)
                .with_indices(indices.to_vec())]
        });
        Ok(painted(&model, item, ctx, None))
    }
}

/// Uploads projected mesh vertices into a device buffer once per projection.
#[derive(Debug, Default)]
pub struct MeshBufferBuilder;

impl CommandBuilder for MeshBufferBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::PolygonMesh
    }

    fn is_viable(&self, device: &dyn GraphicsDevice, warnings: &mut Vec<String>) -> bool {
        let supported = device.capabilities().vertex_buffers;
        if !supported {
            warnings.push("MeshBufferBuilder: the device has no vertex buffers".to_string());
        }
        supported
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let Some((vertices, indices)) = valid_mesh(item) else {
            return Ok(Built::Skip);
        };
        let projection = ctx.projection.id();
        let model = match cache.get_cache_association::<MeshBufferModel>(item.key, Some(projection))
        {
            Some(model) => model,
            None => {
                let points: Vec<ScreenPoint> =
                    vertices.iter().map(|v| ctx.projection.project(v)).collect();
                let buffer = ctx
                    .device
                    .create_buffer(&format!("mesh {}", item.key), bytemuck::cast_slice(&points))?;
                let model = MeshBufferModel {
                    buffer,
                    indices: indices.to_vec(),
                };
                let footprint = Footprint::host((indices.len() * 4) as u64)
                    .with_handle(buffer)
                    .bound_to(projection);
                match cache.insert(item.key, model.clone(), footprint) {
                    Ok(model) => model,
                    Err(_) => std::sync::Arc::new(model),
                }
            }
        };
        let properties = item.geometry.properties();
        let mut command = DrawCommand::new(
            Topology::TriangleList,
            Vec::new(),
            ctx.color_for(&item.geometry),
        )
        .with_indices(model.indices.clone())
        .with_buffer(model.buffer);
        command.line_width = properties.line_width;
        command.point_size = properties.point_size;
        Ok(Built::Commands(vec![command]))
    }
}
