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

//! Immediate-mode draw commands.

use super::ResourceHandle;
use crate::render::{Rgba8, ScreenPoint};

/// How the vertices of a [`DrawCommand`] are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Each vertex is a square point of `point_size` pixels.
    Points,
    /// Each index pair is a segment.
    LineList,
    /// Consecutive vertices are connected.
    LineStrip,
    /// Each index triple is a triangle.
    TriangleList,
}

/// A single draw call in screen space.
///
/// When `texture` is set the triangles are textured using `tex_coords` and
/// `color` is ignored. When `buffer` is set the vertices are read from that
/// device buffer instead of `vertices`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Primitive assembly.
    pub topology: Topology,
    /// Screen-space vertices.
    pub vertices: Vec<ScreenPoint>,
    /// Per-vertex texture coordinates, empty when untextured.
    pub tex_coords: Vec<[f32; 2]>,
    /// Optional index list; when empty vertices are used in order.
    pub indices: Vec<u32>,
    /// Solid color of the primitives.
    pub color: Rgba8,
    /// Texture sampled by textured triangles.
    pub texture: Option<ResourceHandle>,
    /// Device buffer holding the vertices.
    pub buffer: Option<ResourceHandle>,
    /// Point diameter in pixels.
    pub point_size: f32,
    /// Line width in pixels.
    pub line_width: f32,
}

impl DrawCommand {
    /// Creates an untextured command.
    pub fn new(topology: Topology, vertices: Vec<ScreenPoint>, color: Rgba8) -> Self {
        Self {
            topology,
            vertices,
            tex_coords: Vec::new(),
            indices: Vec::new(),
            color,
            texture: None,
            buffer: None,
            point_size: 1.0,
            line_width: 1.0,
        }
    }

    /// Sets the index list.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Samples `texture` with the given coordinates.
    pub fn with_texture(mut self, texture: ResourceHandle, tex_coords: Vec<[f32; 2]>) -> Self {
        self.texture = Some(texture);
        self.tex_coords = tex_coords;
        self
    }

    /// Reads vertices from a device buffer.
    pub fn with_buffer(mut self, buffer: ResourceHandle) -> Self {
        self.buffer = Some(buffer);
        self
    }

    /// Sets the point diameter.
    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }

    /// Sets the line width.
    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    /// Approximate host memory held by this command.
    pub fn host_bytes(&self) -> u64 {
        (self.vertices.len() * std::mem::size_of::<ScreenPoint>()
            + self.tex_coords.len() * std::mem::size_of::<[f32; 2]>()
            + self.indices.len() * std::mem::size_of::<u32>()
            + std::mem::size_of::<Self>()) as u64
    }
}
