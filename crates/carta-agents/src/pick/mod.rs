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

//! Identity colors for PICK passes and decoding of the resulting buffer.
//!
//! Every pickable geometry gets a 24-bit color while it is registered. Black is
//! the background and never assigned. Released colors are reused smallest first,
//! so a long session does not exhaust the color space.

use carta_core::geometry::{Geometry, GeometryId};
use carta_core::render::{PickColorProvider, Rgba8};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Largest assignable color value.
pub const MAX_PICK_COLOR: u32 = 0xFF_FFFF;

#[derive(Debug)]
struct PickState {
    colors: HashMap<GeometryId, u32>,
    owners: HashMap<u32, GeometryId>,
    free: BinaryHeap<Reverse<u32>>,
    next: u32,
    picked: HashSet<GeometryId>,
}

impl Default for PickState {
    fn default() -> Self {
        Self {
            colors: HashMap::new(),
            owners: HashMap::new(),
            free: BinaryHeap::new(),
            next: 1,
            picked: HashSet::new(),
        }
    }
}

/// Assigns pick colors and tracks the geometries under the cursor.
#[derive(Debug, Default)]
pub struct PickManager {
    state: Mutex<PickState>,
}

impl PickManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PickState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The color value of `id`, assigning one if needed. `None` once every
    /// color is in use.
    pub fn color_value(&self, id: GeometryId) -> Option<u32> {
        let mut state = self.state();
        if let Some(value) = state.colors.get(&id) {
            return Some(*value);
        }
        let value = match state.free.pop() {
            Some(Reverse(value)) => value,
            None if state.next <= MAX_PICK_COLOR => {
                state.next += 1;
                state.next - 1
            }
            None => {
                log::warn!("PickManager: Pick colors exhausted, {id} is not pickable.");
                return None;
            }
        };
        state.colors.insert(id, value);
        state.owners.insert(value, id);
        Some(value)
    }

    /// Releases the color of `id`. Returns whether it had one.
    pub fn release(&self, id: GeometryId) -> bool {
        let mut state = self.state();
        state.picked.remove(&id);
        match state.colors.remove(&id) {
            Some(value) => {
                state.owners.remove(&value);
                state.free.push(Reverse(value));
                true
            }
            None => false,
        }
    }

    /// The geometry owning `color`, if any.
    pub fn owner_of(&self, color: Rgba8) -> Option<GeometryId> {
        self.state().owners.get(&color.to_rgb_u24()).copied()
    }

    /// Decodes a PICK buffer around `(x, y)`.
    ///
    /// `buffer` holds `width` x `height` RGBA8 pixels, top row first. Every
    /// pixel within `radius` (a square window) is decoded; unknown colors and the
    /// background are ignored. The result replaces the picked set.
    pub fn determine_picks(
        &self,
        buffer: &[u8],
        width: u32,
        height: u32,
        x: u32,
        y: u32,
        radius: u32,
    ) -> HashSet<GeometryId> {
        let mut state = self.state();
        let mut picked = HashSet::new();
        if width > 0 && height > 0 {
            let x0 = x.saturating_sub(radius);
            let y0 = y.saturating_sub(radius);
            let x1 = x.saturating_add(radius).min(width - 1);
            let y1 = y.saturating_add(radius).min(height - 1);
            for row in y0..=y1 {
                for col in x0..=x1 {
                    let offset = (row as usize * width as usize + col as usize) * 4;
                    let Some(px) = buffer.get(offset..offset + 4) else {
                        continue;
                    };
                    let value = Rgba8::new(px[0], px[1], px[2], px[3]).to_rgb_u24();
                    if value == 0 {
                        continue;
                    }
                    if let Some(id) = state.owners.get(&value) {
                        picked.insert(*id);
                    }
                }
            }
        }
        log::debug!("PickManager: {} geometries under ({x}, {y}).", picked.len());
        state.picked = picked.clone();
        picked
    }

    /// Whether `id` was under the cursor at the last pick pass.
    pub fn is_picked(&self, id: GeometryId) -> bool {
        self.state().picked.contains(&id)
    }

    /// The geometries found by the last pick pass.
    pub fn picked(&self) -> HashSet<GeometryId> {
        self.state().picked.clone()
    }

    /// Forgets the last pick result.
    pub fn clear_picks(&self) {
        self.state().picked.clear();
    }

    /// Number of colors in use.
    pub fn assigned(&self) -> usize {
        self.state().colors.len()
    }
}

impl PickColorProvider for PickManager {
    fn pick_color(&self, geometry: &Geometry) -> Rgba8 {
        self.color_value(geometry.id())
            .map(Rgba8::from_rgb_u24)
            .unwrap_or(Rgba8::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_are_unique_and_stable() {
        let manager = PickManager::new();
        let a = manager.color_value(GeometryId(10)).unwrap();
        let b = manager.color_value(GeometryId(11)).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, 0);
        assert_eq!(manager.color_value(GeometryId(10)), Some(a));
        assert_eq!(manager.assigned(), 2);
    }

    #[test]
    fn test_released_colors_are_reused_smallest_first() {
        let manager = PickManager::new();
        for id in 0..5 {
            manager.color_value(GeometryId(id));
        }
        assert!(manager.release(GeometryId(3)));
        assert!(manager.release(GeometryId(1)));
        assert!(!manager.release(GeometryId(1)));

        assert_eq!(manager.color_value(GeometryId(100)), Some(2));
        assert_eq!(manager.color_value(GeometryId(101)), Some(4));
        assert_eq!(manager.color_value(GeometryId(102)), Some(6));
    }

    #[test]
    fn test_determine_picks_decodes_window() {
        let manager = PickManager::new();
        let value = manager.color_value(GeometryId(7)).unwrap();
        let color = Rgba8::from_rgb_u24(value).to_array();

        let (width, height) = (4u32, 4u32);
        let mut buffer = vec![0u8; (width * height * 4) as usize];
        let offset = ((width + 2) * 4) as usize;
        buffer[offset..offset + 4].copy_from_slice(&color);

        assert!(manager.determine_picks(&buffer, width, height, 0, 0, 0).is_empty());
        let picked = manager.determine_picks(&buffer, width, height, 3, 0, 1);
        assert_eq!(picked, HashSet::from([GeometryId(7)]));
        assert!(manager.is_picked(GeometryId(7)));

        manager.release(GeometryId(7));
        assert!(!manager.is_picked(GeometryId(7)));
    }

    #[test]
    fn test_unknown_colors_are_ignored() {
        let manager = PickManager::new();
        let buffer = [9u8, 9, 9, 255];
        assert!(manager.determine_picks(&buffer, 1, 1, 0, 0, 0).is_empty());
        assert!(manager.picked().is_empty());
    }
}
