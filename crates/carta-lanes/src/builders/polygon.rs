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

//! Filled polygons, triangulated in screen space by ear clipping.

use super::{painted, screen_model};
use crate::render_lane::{Built, CommandBuilder, RenderItem};
use carta_core::geometry::{GeometryKind, GeometryShape};
use carta_core::render::{RenderContext, Rgba8, ScreenPoint};
use carta_core::renderer::{DrawCommand, RenderError, Topology};
use carta_data::RenderDataCache;

/// Fills simple polygons.
#[derive(Debug, Default)]
pub struct PolygonBuilder;

impl CommandBuilder for PolygonBuilder {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn build(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<Built, RenderError> {
        let GeometryShape::Polygon { ring } = item.geometry.shape() else {
            return Ok(Built::Skip);
        };
        if ring.len() < 3 {
            return Ok(Built::Skip);
        }
        let model = screen_model(item, ctx, cache, |projection| {
            let points: Vec<_> = ring.iter().map(|v| projection.project(v)).collect();
            let indices = triangulate(&points);
            vec![DrawCommand::new(Topology::TriangleList, points, Rgba8::WHITE).with_indices(indices)]
        });
        Ok(painted(&model, item, ctx, None))
    }
}

fn cross(o: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn signed_area(points: &[ScreenPoint]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        / 2.0
}

fn inside_triangle(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint, c: ScreenPoint) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Triangulates a simple polygon into a triangle list.
///
/// Degenerate leftovers (collinear runs, self-intersections) are closed with a
/// fan so every input yields `3 * (n - 2)` indices.
pub fn triangulate(points: &[ScreenPoint]) -> Vec<u32> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let mut remaining: Vec<usize> = if signed_area(points) >= 0.0 {
        (0..n).collect()
    } else {
        (0..n).rev().collect()
    };
    let mut indices = Vec::with_capacity((n - 2) * 3);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (a, b, c) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            if cross(points[a], points[b], points[c]) <= 0.0 {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&j| j != a && j != b && j != c)
                .any(|&j| inside_triangle(points[j], points[a], points[b], points[c]))
        });
        match ear {
            Some(i) => {
                let (a, b, c) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
                indices.extend([a as u32, b as u32, c as u32]);
                remaining.remove(i);
            }
            None => break,
        }
    }

    for i in 1..remaining.len() - 1 {
        indices.extend([
            remaining[0] as u32,
            remaining[i] as u32,
            remaining[i + 1] as u32,
        ]);
    }
    indices
}
