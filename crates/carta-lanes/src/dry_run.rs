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

//! Synthetic content used to exercise renderers before they are trusted.

use carta_core::geometry::{
    GeoBounds, GeoPosition, Geometry, GeometryKind, GeometryShape, ImageData, RenderProperties,
    TileImage,
};
use carta_core::render::{ProjectionSnapshot, Rgba8};
use std::sync::Arc;

/// Viewport edge of the synthetic projection, in pixels.
pub const SYNTHETIC_VIEWPORT: u32 = 64;

/// A small projection centred on the origin, about 100 km across.
pub fn synthetic_projection() -> ProjectionSnapshot {
    ProjectionSnapshot::new(
        SYNTHETIC_VIEWPORT,
        SYNTHETIC_VIEWPORT,
        GeoPosition::new(0.0, 0.0),
        SYNTHETIC_VIEWPORT as f64 / 100_000.0,
    )
}

fn image() -> TileImage {
    TileImage::Inline(Arc::new(ImageData::solid(4, 4, [200, 120, 40, 255])))
}

fn shape(kind: GeometryKind, offset: f64) -> GeometryShape {
    let p = |lat: f64, lon: f64| GeoPosition::new(lat + offset, lon + offset);
    match kind {
        GeometryKind::Point => GeometryShape::Point {
            position: p(0.0, 0.0),
        },
        GeometryKind::Polyline => GeometryShape::Polyline {
            vertices: vec![p(-0.1, -0.1), p(0.0, 0.1), p(0.1, -0.1)],
            closed: false,
        },
        GeometryKind::Polygon => GeometryShape::Polygon {
            ring: vec![p(-0.1, -0.1), p(-0.1, 0.1), p(0.1, 0.1), p(0.0, 0.0), p(0.1, -0.1)],
        },
        GeometryKind::PolygonMesh => GeometryShape::PolygonMesh {
            vertices: vec![p(-0.1, -0.1), p(-0.1, 0.1), p(0.1, 0.1), p(0.1, -0.1)],
            indices: vec![0, 1, 2, 0, 2, 3],
        },
        GeometryKind::Tile => GeometryShape::Tile {
            bounds: GeoBounds::new(p(-0.1, -0.1), p(0.1, 0.1)),
            image: image(),
        },
        GeometryKind::Label => GeometryShape::Label {
            position: p(0.0, -0.1),
            text: "Dry run".to_string(),
            font_size: 8.0,
        },
        GeometryKind::PointSprite => GeometryShape::PointSprite {
            position: p(0.0, 0.0),
            image: image(),
            size_px: 6.0,
        },
    }
}

/// A few visible, pickable geometries of `kind`.
pub fn synthetic_geometries(kind: GeometryKind) -> Vec<Arc<Geometry>> {
    [-0.15, 0.0, 0.15]
        .into_iter()
        .enumerate()
        .map(|(i, offset)| {
            let properties = RenderProperties {
                color: Rgba8::new(40 * i as u8 + 80, 160, 220, 255),
                z_order: i as i32,
                ..RenderProperties::default()
            };
            Arc::new(Geometry::with_properties(shape(kind, offset), properties))
        })
        .collect()
}
