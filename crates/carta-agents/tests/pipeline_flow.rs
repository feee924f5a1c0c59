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

use carta_agents::{DisposalHelpers, GeometryDistributor, PickManager, RendererSetFactory};
use carta_core::geometry::{GeoPosition, Geometry, GeometryKind, GeometryShape, RenderProperties};
use carta_core::render::{ProjectionSnapshot, RenderContext, RenderMode, Rgba8};
use carta_core::renderer::GraphicsDevice;
use carta_data::RenderDataCache;
use carta_infra::HeadlessDevice;
use carta_lanes::{default_factories, RendererFactory};
use std::collections::HashSet;
use std::sync::Arc;

const SIZE: u32 = 64;
const TEAL: Rgba8 = Rgba8::new(20, 160, 160, 255);

fn projection() -> ProjectionSnapshot {
    ProjectionSnapshot::new(SIZE, SIZE, GeoPosition::new(0.0, 0.0), SIZE as f64 / 100_000.0)
}

fn polygon() -> Arc<Geometry> {
    let p = GeoPosition::new;
    Arc::new(Geometry::with_properties(
        GeometryShape::Polygon {
            ring: vec![p(-0.2, -0.2), p(-0.2, 0.2), p(0.2, 0.2), p(0.2, -0.2)],
        },
        RenderProperties {
            color: TEAL,
            ..RenderProperties::default()
        },
    ))
}

fn marker() -> Arc<Geometry> {
    Arc::new(Geometry::with_properties(
        GeometryShape::Point {
            position: GeoPosition::new(0.35, 0.35),
        },
        RenderProperties {
            point_size: 4.0,
            ..RenderProperties::default()
        },
    ))
}

struct Pipeline {
    device: HeadlessDevice,
    cache: RenderDataCache,
    helpers: DisposalHelpers,
    distributor: GeometryDistributor,
    picks: PickManager,
}

impl Pipeline {
    fn new() -> Self {
        let cache = RenderDataCache::default();
        let mut helpers = DisposalHelpers::new();
        helpers.open(&cache).unwrap();
        Self {
            device: HeadlessDevice::new(SIZE, SIZE),
            cache,
            helpers,
            distributor: GeometryDistributor::default(),
            picks: PickManager::new(),
        }
    }

    fn pick_at(&self, set: &mut carta_agents::RendererSet, x: u32, y: u32) -> HashSet<carta_core::GeometryId> {
        let projection = projection();
        self.device.clear(Rgba8::BLACK);
        let ctx = RenderContext::new(&self.device, RenderMode::Pick, &projection)
            .with_pick_colors(&self.picks);
        self.distributor
            .render_geometries(&ctx, &self.cache, set)
            .unwrap();
        let buffer = self.device.read_pixels(0, 0, SIZE, SIZE).unwrap();
        self.picks.determine_picks(&buffer, SIZE, SIZE, x, y, 1)
    }
}

#[test]
fn test_pick_then_highlight_then_remove() {
    let mut pipeline = Pipeline::new();
    let (mut set, _) = RendererSetFactory::new(default_factories(None)).build(&pipeline.device);
    let polygon = polygon();
    let marker = marker();
    pipeline
        .distributor
        .update(&[Arc::clone(&polygon), Arc::clone(&marker)], &[]);

    let picked = pipeline.pick_at(&mut set, SIZE / 2, SIZE / 2);
    assert_eq!(picked, HashSet::from([polygon.id()]));

    let spot = projection().project(&GeoPosition::new(0.35, 0.35));
    let picked = pipeline.pick_at(&mut set, spot.x.round() as u32, spot.y.round() as u32);
    assert_eq!(picked, HashSet::from([marker.id()]));

    // Highlight the polygon in the next DRAW pass.
    let picked = pipeline.pick_at(&mut set, SIZE / 2, SIZE / 2);
    let projection = projection();
    pipeline.device.clear(Rgba8::BLACK);
    let ctx = RenderContext::new(&pipeline.device, RenderMode::Draw, &projection)
        .with_highlighted(&picked);
    let outcome = pipeline
        .distributor
        .render_geometries(&ctx, &pipeline.cache, &mut set)
        .unwrap();
    assert_eq!(outcome.totals.rendered, 2);
    assert_eq!(
        pipeline.device.pixel(SIZE / 2, SIZE / 2),
        Some(polygon.properties().highlight_color)
    );
    pipeline.helpers.clean_oncard_memory(&pipeline.device).unwrap();

    pipeline.distributor.update(&[], &[polygon.id()]);
    assert!(pipeline.picks.release(polygon.id()));
    assert_eq!(pipeline.distributor.pending_removals(), 1);

    pipeline.device.clear(Rgba8::BLACK);
    let ctx = RenderContext::new(&pipeline.device, RenderMode::Draw, &projection);
    let outcome = pipeline
        .distributor
        .render_geometries(&ctx, &pipeline.cache, &mut set)
        .unwrap();
    assert!(outcome.purged > 0);
    assert_eq!(outcome.totals.rendered, 1);
    assert_eq!(pipeline.device.pixel(SIZE / 2, SIZE / 2), Some(Rgba8::BLACK));
    assert!(pipeline.helpers.clean_oncard_memory(&pipeline.device).unwrap() > 0);
    assert_eq!(pipeline.distributor.pending_removals(), 0);
}

#[test]
fn test_close_releases_every_device_resource() {
    let mut pipeline = Pipeline::new();
    let (mut set, _) = RendererSetFactory::new(default_factories(None)).build(&pipeline.device);
    pipeline.distributor.update(&[polygon(), marker()], &[]);

    let projection = projection();
    for mode in RenderMode::ALL {
        let ctx = RenderContext::new(&pipeline.device, mode, &projection)
            .with_pick_colors(&pipeline.picks);
        pipeline
            .distributor
            .render_geometries(&ctx, &pipeline.cache, &mut set)
            .unwrap();
    }
    assert!(pipeline.device.live_resources() > 0);

    pipeline.distributor.close(&pipeline.cache, Some(&mut set));
    pipeline.helpers.clean_oncard_memory(&pipeline.device).unwrap();
    pipeline.helpers.close().unwrap();

    assert_eq!(pipeline.device.live_resources(), 0);
    assert!(pipeline.cache.is_empty());
    assert_eq!(pipeline.distributor.geometry_count(), 0);
}

#[test]
fn test_kind_without_renderer_is_reported() {
    let pipeline = Pipeline::new();
    let points: Vec<Arc<dyn RendererFactory>> = default_factories(None)
        .into_iter()
        .filter(|factory| factory.kind() == GeometryKind::Point)
        .collect();
    let (mut set, _) = RendererSetFactory::new(points).build(&pipeline.device);
    pipeline.distributor.update(&[polygon(), marker()], &[]);

    let projection = projection();
    let ctx = RenderContext::new(&pipeline.device, RenderMode::Draw, &projection);
    let outcome = pipeline
        .distributor
        .render_geometries(&ctx, &pipeline.cache, &mut set)
        .unwrap();

    assert_eq!(outcome.unsupported, vec![GeometryKind::Polygon]);
    assert_eq!(outcome.totals.rendered, 1);
    assert_eq!(pipeline.distributor.geometry_count(), 2);
}
