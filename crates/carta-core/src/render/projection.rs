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

//! Immutable per-frame projection snapshots.

use crate::geometry::GeoPosition;
use std::f64::consts::PI;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mean Earth radius used by the spherical Mercator projection, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which spherical Mercator diverges.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

static NEXT_PROJECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonically increasing identity of a projection snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectionId(pub u64);

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projection#{}", self.0)
    }
}

/// A position in framebuffer pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ScreenPoint {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate, growing downwards.
    pub y: f32,
}

impl ScreenPoint {
    /// Creates a screen point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The viewport and map transform a frame is rendered under.
///
/// Every snapshot gets a fresh [`ProjectionId`], even when its parameters equal a
/// previous one. Model data computed under one snapshot is never valid under another.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSnapshot {
    id: ProjectionId,
    width: u32,
    height: u32,
    center: GeoPosition,
    pixels_per_meter: f64,
}

impl ProjectionSnapshot {
    /// Captures a new snapshot.
    ///
    /// ## Arguments
    /// * `width`, `height` - The viewport size in pixels.
    /// * `center` - The geographic position shown at the viewport centre.
    /// * `pixels_per_meter` - The map scale in Mercator metres.
    pub fn new(width: u32, height: u32, center: GeoPosition, pixels_per_meter: f64) -> Self {
        Self {
            id: ProjectionId(NEXT_PROJECTION_ID.fetch_add(1, Ordering::Relaxed)),
            width,
            height,
            center,
            pixels_per_meter,
        }
    }

    /// Returns a new snapshot panned to `center`.
    pub fn recentered(&self, center: GeoPosition) -> Self {
        Self::new(self.width, self.height, center, self.pixels_per_meter)
    }

    /// Returns a new snapshot with the scale multiplied by `factor`.
    pub fn zoomed(&self, factor: f64) -> Self {
        Self::new(self.width, self.height, self.center, self.pixels_per_meter * factor)
    }

    /// The identity of this snapshot.
    pub fn id(&self) -> ProjectionId {
        self.id
    }

    /// Viewport width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Viewport height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Geographic centre of the viewport.
    pub fn center(&self) -> GeoPosition {
        self.center
    }

    /// Map scale.
    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    /// Projects a geographic position to framebuffer pixels.
    pub fn project(&self, position: &GeoPosition) -> ScreenPoint {
        let (mx, my) = mercator(position);
        let (cx, cy) = mercator(&self.center);
        let x = self.width as f64 / 2.0 + (mx - cx) * self.pixels_per_meter;
        let y = self.height as f64 / 2.0 - (my - cy) * self.pixels_per_meter;
        ScreenPoint::new(x as f32, y as f32)
    }

    /// Returns `true` if the point lies inside the viewport.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }
}

fn mercator(position: &GeoPosition) -> (f64, f64) {
    let lat = position.lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let lon = position.lon_deg.to_radians();
    let x = EARTH_RADIUS_M * lon;
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_viewport_center() {
        let center = GeoPosition::new(45.0, 7.0);
        let p = ProjectionSnapshot::new(800, 600, center, 0.01);
        let s = p.project(&center);
        assert!((s.x - 400.0).abs() < 1e-3);
        assert!((s.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_north_is_up_and_east_is_right() {
        let p = ProjectionSnapshot::new(100, 100, GeoPosition::new(0.0, 0.0), 1e-4);
        let north = p.project(&GeoPosition::new(0.1, 0.0));
        let east = p.project(&GeoPosition::new(0.0, 0.1));
        assert!(north.y < 50.0);
        assert!(east.x > 50.0);
    }

    #[test]
    fn test_every_snapshot_has_a_fresh_id() {
        let a = ProjectionSnapshot::new(10, 10, GeoPosition::default(), 1.0);
        let b = a.recentered(a.center());
        assert!(b.id() > a.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_poles_are_clamped() {
        let p = ProjectionSnapshot::new(10, 10, GeoPosition::default(), 1e-6);
        let s = p.project(&GeoPosition::new(90.0, 0.0));
        assert!(s.y.is_finite());
    }
}
