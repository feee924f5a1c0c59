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

//! Generation-checked keys for geometries retained by the pipeline.
//!
//! Render data must be dropped independently of the geometry it was computed for.
//! Instead of weak references, every retained geometry gets a [`GeometryKey`]
//! made of an arena index and the generation of that slot. Releasing a geometry
//! bumps the generation, so stale keys are detectable and can never alias the
//! geometry that reuses the slot.

use carta_core::geometry::GeometryId;
use std::collections::HashMap;
use std::fmt;

/// Arena index plus slot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryKey {
    index: u32,
    generation: u32,
}

impl GeometryKey {
    /// Builds a key from raw parts. Only meaningful for the arena that issued it.
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The arena slot.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of the slot when this key was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for GeometryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    occupant: Option<GeometryId>,
}

/// Allocates and invalidates [`GeometryKey`]s.
#[derive(Debug, Default)]
pub struct GeometrySlots {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_id: HashMap<GeometryId, GeometryKey>,
}

impl GeometrySlots {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live key of `id`, allocating a slot if needed.
    pub fn register(&mut self, id: GeometryId) -> GeometryKey {
        if let Some(key) = self.by_id.get(&id) {
            return *key;
        }
        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.occupant = Some(id);
                GeometryKey::from_raw_parts(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    occupant: Some(id),
                });
                GeometryKey::from_raw_parts(index, 0)
            }
        };
        self.by_id.insert(id, key);
        key
    }

    /// Releases the slot of `id` and returns the key that just became stale.
    pub fn release(&mut self, id: GeometryId) -> Option<GeometryKey> {
        let key = self.by_id.remove(&id)?;
        let slot = &mut self.slots[key.index as usize];
        slot.occupant = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        Some(key)
    }

    /// Returns the live key of `id`, if registered.
    pub fn resolve(&self, id: GeometryId) -> Option<GeometryKey> {
        self.by_id.get(&id).copied()
    }

    /// Returns `true` if `key` still designates a registered geometry.
    pub fn is_live(&self, key: GeometryKey) -> bool {
        self.slots
            .get(key.index as usize)
            .is_some_and(|slot| slot.generation == key.generation && slot.occupant.is_some())
    }

    /// Number of registered geometries.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no geometry is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
