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

//! The immutable shape carried by every geometry.

use super::{GeoBounds, GeoPosition, GeometryKind, TileImage};

/// The tagged shape variant of a geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryShape {
    /// A single marker.
    Point {
        /// Location of the marker.
        position: GeoPosition,
    },
    /// A sequence of connected segments.
    Polyline {
        /// The vertices in drawing order.
        vertices: Vec<GeoPosition>,
        /// Whether the last vertex connects back to the first.
        closed: bool,
    },
    /// A filled simple polygon.
    Polygon {
        /// The outer ring, without a repeated closing vertex.
        ring: Vec<GeoPosition>,
    },
    /// An indexed triangle mesh.
    PolygonMesh {
        /// Mesh vertices.
        vertices: Vec<GeoPosition>,
        /// Triangle list indices into `vertices`.
        indices: Vec<u32>,
    },
    /// An image draped over a bounding box.
    Tile {
        /// Geographic extent of the image.
        bounds: GeoBounds,
        /// The imagery.
        image: TileImage,
    },
    /// Text anchored at a position.
    Label {
        /// Anchor of the text baseline.
        position: GeoPosition,
        /// The text to display.
        text: String,
        /// Nominal glyph height in pixels.
        font_size: f32,
    },
    /// A screen-aligned image of fixed pixel size.
    PointSprite {
        /// Centre of the sprite.
        position: GeoPosition,
        /// The sprite imagery.
        image: TileImage,
        /// Edge length in pixels.
        size_px: f32,
    },
}

impl GeometryShape {
    /// Returns the dispatch tag of this shape.
    pub fn kind(&self) -> GeometryKind {
        match self {
            GeometryShape::Point { .. } => GeometryKind::Point,
            GeometryShape::Polyline { .. } => GeometryKind::Polyline,
            GeometryShape::Polygon { .. } => GeometryKind::Polygon,
            GeometryShape::PolygonMesh { .. } => GeometryKind::PolygonMesh,
            GeometryShape::Tile { .. } => GeometryKind::Tile,
            GeometryShape::Label { .. } => GeometryKind::Label,
            GeometryShape::PointSprite { .. } => GeometryKind::PointSprite,
        }
    }

    /// Number of geographic positions carried by the shape.
    pub fn position_count(&self) -> usize {
        match self {
            GeometryShape::Point { .. }
            | GeometryShape::Label { .. }
            | GeometryShape::PointSprite { .. } => 1,
            GeometryShape::Polyline { vertices, .. } => vertices.len(),
            GeometryShape::Polygon { ring } => ring.len(),
            GeometryShape::PolygonMesh { vertices, .. } => vertices.len(),
            GeometryShape::Tile { .. } => 4,
        }
    }
}
