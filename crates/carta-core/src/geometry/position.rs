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

//! Geographic coordinates.

/// A WGS84 position in degrees, with an optional altitude in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPosition {
    /// Latitude in degrees, positive north.
    pub lat_deg: f64,
    /// Longitude in degrees, positive east.
    pub lon_deg: f64,
    /// Altitude above the ellipsoid in metres.
    pub alt_m: f64,
}

impl GeoPosition {
    /// Creates a position at ground level.
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m: 0.0,
        }
    }

    /// Creates a position with an explicit altitude.
    pub const fn with_altitude(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }
}

/// An axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    /// South-west corner.
    pub min: GeoPosition,
    /// North-east corner.
    pub max: GeoPosition,
}

impl GeoBounds {
    /// Creates a bounding box from its south-west and north-east corners.
    pub const fn new(min: GeoPosition, max: GeoPosition) -> Self {
        Self { min, max }
    }

    /// Returns the four corners, counter-clockwise from south-west.
    pub fn corners(&self) -> [GeoPosition; 4] {
        [
            self.min,
            GeoPosition::new(self.min.lat_deg, self.max.lon_deg),
            self.max,
            GeoPosition::new(self.max.lat_deg, self.min.lon_deg),
        ]
    }

    /// Returns `true` if the position lies inside or on the boundary.
    pub fn contains(&self, p: &GeoPosition) -> bool {
        p.lat_deg >= self.min.lat_deg
            && p.lat_deg <= self.max.lat_deg
            && p.lon_deg >= self.min.lon_deg
            && p.lon_deg <= self.max.lon_deg
    }
}
