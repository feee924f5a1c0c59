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

//! Scanline-free software rasterisation into an RGBA8 framebuffer.

use carta_core::render::{Rgba8, ScreenPoint};

const DEGENERATE_AREA: f32 = 1e-6;

/// Texels of a live texture.
#[derive(Debug)]
pub(super) struct Texels {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<Rgba8>,
}

impl Texels {
    /// Nearest-neighbour sample with clamped coordinates.
    fn sample(&self, uv: [f32; 2]) -> Rgba8 {
        let u = uv[0].clamp(0.0, 1.0);
        let v = uv[1].clamp(0.0, 1.0);
        let x = ((u * self.width as f32) as u32).min(self.width.saturating_sub(1));
        let y = ((v * self.height as f32) as u32).min(self.height.saturating_sub(1));
        self.texels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(Rgba8::TRANSPARENT)
    }
}

/// A mutable view over the framebuffer.
pub(super) struct Surface<'a> {
    pub pixels: &'a mut [Rgba8],
    pub width: u32,
    pub height: u32,
}

impl Surface<'_> {
    fn blend(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let index = (y * self.width as i64 + x) as usize;
        self.pixels[index] = color.blend_over(self.pixels[index]);
    }

    /// Blends each covered pixel exactly once.
    pub fn fill(&mut self, mut coverage: Vec<(i64, i64)>, color: Rgba8) {
        coverage.sort_unstable();
        coverage.dedup();
        for (x, y) in coverage {
            self.blend(x, y, color);
        }
    }

    pub fn triangle(
        &mut self,
        v: [ScreenPoint; 3],
        color: Rgba8,
        textured: Option<(&Texels, [[f32; 2]; 3])>,
    ) {
        let area = edge(v[0], v[1], v[2]);
        if area.abs() < DEGENERATE_AREA {
            return;
        }
        let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as i64;
        let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as i64;
        let max_x = (v.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil() as i64)
            .min(self.width as i64 - 1);
        let max_y = (v.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil() as i64)
            .min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = ScreenPoint::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(v[1], v[2], p) / area;
                let w1 = edge(v[2], v[0], p) / area;
                let w2 = edge(v[0], v[1], p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let shade = match textured {
                    Some((texels, uv)) => texels.sample([
                        w0 * uv[0][0] + w1 * uv[1][0] + w2 * uv[2][0],
                        w0 * uv[0][1] + w1 * uv[1][1] + w2 * uv[2][1],
                    ]),
                    None => color,
                };
                self.blend(x, y, shade);
            }
        }
    }
}

fn edge(a: ScreenPoint, b: ScreenPoint, p: ScreenPoint) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Pixels of a square of `size` pixels centred on `center`.
pub(super) fn square(center: ScreenPoint, size: f32, coverage: &mut Vec<(i64, i64)>) {
    let half = size.max(1.0) / 2.0;
    let x0 = (center.x - half).round() as i64;
    let y0 = (center.y - half).round() as i64;
    let x1 = ((center.x + half).round() as i64).max(x0 + 1);
    let y1 = ((center.y + half).round() as i64).max(y0 + 1);
    for y in y0..y1 {
        for x in x0..x1 {
            coverage.push((x, y));
        }
    }
}

/// Pixels of a segment stamped with a square brush of `width` pixels.
pub(super) fn segment(a: ScreenPoint, b: ScreenPoint, width: f32, coverage: &mut Vec<(i64, i64)>) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        square(ScreenPoint::new(a.x + dx * t, a.y + dy * t), width, coverage);
    }
}
