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

//! The geometry model consumed by the rendering pipeline.
//!
//! A [`Geometry`] is an immutable, typed unit of renderable content. Its identity
//! and shape never change during its lifetime; only its [`RenderProperties`] may
//! be mutated by the owning application layer.

mod image;
mod position;
mod shape;

pub use image::{ImageData, ImageFetch, ImageKey, ImageSource, TileImage};
pub use position::{GeoBounds, GeoPosition};
pub use shape::GeometryShape;

use crate::render::Rgba8;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, process-unique identity of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

impl GeometryId {
    /// Allocates a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry#{}", self.0)
    }
}

/// The type tag used to dispatch a geometry to its processor and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryKind {
    /// A single geographic position.
    Point,
    /// An open or closed line through geographic positions.
    Polyline,
    /// A filled ring.
    Polygon,
    /// An indexed triangle mesh.
    PolygonMesh,
    /// An image draped over a geographic bounding box.
    Tile,
    /// A text label anchored at a position.
    Label,
    /// An image drawn at a fixed pixel size around a position.
    PointSprite,
}

impl GeometryKind {
    /// Every kind, in dispatch order.
    pub const ALL: [GeometryKind; 7] = [
        GeometryKind::Tile,
        GeometryKind::PolygonMesh,
        GeometryKind::Polygon,
        GeometryKind::Polyline,
        GeometryKind::Point,
        GeometryKind::PointSprite,
        GeometryKind::Label,
    ];
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "Point",
            GeometryKind::Polyline => "Polyline",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::PolygonMesh => "PolygonMesh",
            GeometryKind::Tile => "Tile",
            GeometryKind::Label => "Label",
            GeometryKind::PointSprite => "PointSprite",
        };
        write!(f, "{name}")
    }
}

/// Mutable presentation attributes of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProperties {
    /// Fill or stroke color in DRAW mode.
    pub color: Rgba8,
    /// Color used in DRAW mode while the geometry is picked.
    pub highlight_color: Rgba8,
    /// Stroke width in pixels for lines and outlines.
    pub line_width: f32,
    /// Point diameter in pixels.
    pub point_size: f32,
    /// Hidden geometries are retained but never drawn or picked.
    pub visible: bool,
    /// Non-pickable geometries are skipped by PICK passes.
    pub pickable: bool,
    /// Drawing order within a kind; lower values are drawn first.
    pub z_order: i32,
}

impl Default for RenderProperties {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            highlight_color: Rgba8::new(255, 255, 0, 255),
            line_width: 1.0,
            point_size: 4.0,
            visible: true,
            pickable: true,
            z_order: 0,
        }
    }
}

/// An immutable, typed unit of renderable content.
///
/// Equality and hashing only consider the [`GeometryId`].
pub struct Geometry {
    id: GeometryId,
    shape: GeometryShape,
    properties: RwLock<RenderProperties>,
}

impl Geometry {
    /// Creates a geometry with default render properties.
    pub fn new(shape: GeometryShape) -> Self {
        Self::with_properties(shape, RenderProperties::default())
    }

    /// Creates a geometry with explicit render properties.
    pub fn with_properties(shape: GeometryShape, properties: RenderProperties) -> Self {
        Self {
            id: GeometryId::next(),
            shape,
            properties: RwLock::new(properties),
        }
    }

    /// Returns the stable identity of this geometry.
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Returns the dispatch tag of this geometry.
    pub fn kind(&self) -> GeometryKind {
        self.shape.kind()
    }

    /// Returns the immutable shape.
    pub fn shape(&self) -> &GeometryShape {
        &self.shape
    }

    /// Returns a snapshot of the current render properties.
    pub fn properties(&self) -> RenderProperties {
        *self.properties.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutates the render properties in place.
    pub fn update_properties(&self, update: impl FnOnce(&mut RenderProperties)) {
        let mut guard = self.properties.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut guard);
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Geometry {}

impl Hash for Geometry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Geometry {
        Geometry::new(GeometryShape::Point {
            position: GeoPosition::new(48.85, 2.35),
        })
    }

    #[test]
    fn test_ids_are_unique() {
        let a = point();
        let b = point();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_property_mutation_keeps_identity() {
        let g = point();
        let id = g.id();
        g.update_properties(|p| {
            p.visible = false;
            p.z_order = 3;
        });
        assert_eq!(g.id(), id);
        assert!(!g.properties().visible);
        assert_eq!(g.properties().z_order, 3);
    }

    #[test]
    fn test_kind_follows_shape() {
        assert_eq!(point().kind(), GeometryKind::Point);
    }
}
