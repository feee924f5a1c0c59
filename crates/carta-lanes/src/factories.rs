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

//! The stock renderer factories, in preference order per kind.

use crate::builders::{
    GreekedLabelBuilder, MeshBufferBuilder, MeshBuilder, PointBuilder, PolygonBuilder,
    PolylineBuilder, SpriteBuilder, SpriteMarkerBuilder, TileBuilder, TileOutlineBuilder,
};
use crate::render_lane::{ImmediateFactory, RendererFactory};
use carta_core::geometry::ImageSource;
use std::sync::Arc;

/// Returns one or more factories per geometry kind, most preferred first.
///
/// The last factory of every kind is the conservative one kept in safe mode.
pub fn default_factories(images: Option<Arc<dyn ImageSource>>) -> Vec<Arc<dyn RendererFactory>> {
    vec![
        Arc::new(ImmediateFactory::new("TexturedTiles", Arc::new(TileBuilder::new(images.clone())))),
        Arc::new(ImmediateFactory::new("TileOutlines", Arc::new(TileOutlineBuilder)).conservative()),
        Arc::new(ImmediateFactory::new("BufferedMeshes", Arc::new(MeshBufferBuilder))),
        Arc::new(ImmediateFactory::new("Meshes", Arc::new(MeshBuilder)).conservative()),
        Arc::new(ImmediateFactory::new("Polygons", Arc::new(PolygonBuilder)).conservative()),
        Arc::new(ImmediateFactory::new("Polylines", Arc::new(PolylineBuilder)).conservative()),
        Arc::new(ImmediateFactory::new("Points", Arc::new(PointBuilder)).conservative()),
        Arc::new(ImmediateFactory::new("TexturedSprites", Arc::new(SpriteBuilder::new(images)))),
        Arc::new(ImmediateFactory::new("SpriteMarkers", Arc::new(SpriteMarkerBuilder)).conservative()),
        Arc::new(ImmediateFactory::new("GreekedLabels", Arc::new(GreekedLabelBuilder)).conservative()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_core::geometry::GeometryKind;

    #[test]
    fn test_every_kind_has_a_conservative_factory() {
        let factories = default_factories(None);
        for kind in GeometryKind::ALL {
            let conservative = factories
                .iter()
                .filter(|f| f.kind() == kind && f.is_conservative())
                .count();
            assert_eq!(conservative, 1, "{kind}");
        }
    }

    #[test]
    fn test_every_factory_can_be_compiled() {
        assert!(default_factories(None)
            .iter()
            .all(|f| f.command_builder().is_some()));
    }
}
