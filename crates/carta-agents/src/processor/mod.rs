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

//! Per-kind geometry processors and the registry that creates them.

use carta_core::geometry::{GeometryId, GeometryKind};
use carta_core::render::RenderMode;
use carta_lanes::RenderItem;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Retains the geometries of one kind and batches them for that kind's renderer.
pub trait GeometryProcessor: Send {
    /// The kind this processor retains.
    fn kind(&self) -> GeometryKind;

    /// Adds items; returns how many were new.
    fn add(&mut self, items: Vec<RenderItem>) -> usize;

    /// Removes the given geometries; unknown ids are ignored. Returns how many were removed.
    fn remove(&mut self, ids: &HashSet<GeometryId>) -> usize;

    /// Number of retained geometries.
    fn len(&self) -> usize;

    /// Whether nothing is retained.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The geometries to draw in `mode`, in draw order.
    ///
    /// The batch is a snapshot; the renderer runs on it after the
    /// distributor has released its lock.
    fn batch(&self, mode: RenderMode) -> Vec<RenderItem>;

    /// Drops every retained geometry, returning them.
    fn clear(&mut self) -> Vec<RenderItem>;
}

/// Batches visible geometries in ascending z-order.
///
/// PICK passes skip geometries that are not pickable.
pub struct DefaultProcessor {
    kind: GeometryKind,
    items: HashMap<GeometryId, RenderItem>,
}

impl DefaultProcessor {
    /// Creates an empty processor for `kind`.
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }
}

impl GeometryProcessor for DefaultProcessor {
    fn kind(&self) -> GeometryKind {
        self.kind
    }

    fn add(&mut self, items: Vec<RenderItem>) -> usize {
        let mut added = 0;
        for item in items {
            if self.items.insert(item.geometry.id(), item).is_none() {
                added += 1;
            }
        }
        added
    }

    fn remove(&mut self, ids: &HashSet<GeometryId>) -> usize {
        ids.iter()
            .filter(|id| self.items.remove(id).is_some())
            .count()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn batch(&self, mode: RenderMode) -> Vec<RenderItem> {
        let mut batch: Vec<(i32, GeometryId, RenderItem)> = self
            .items
            .values()
            .filter_map(|item| {
                let properties = item.geometry.properties();
                let wanted =
                    properties.visible && (mode == RenderMode::Draw || properties.pickable);
                wanted.then(|| (properties.z_order, item.geometry.id(), item.clone()))
            })
            .collect();
        batch.sort_unstable_by_key(|(z, id, _)| (*z, *id));
        batch.into_iter().map(|(_, _, item)| item).collect()
    }

    fn clear(&mut self) -> Vec<RenderItem> {
        self.items.drain().map(|(_, item)| item).collect()
    }
}

impl fmt::Debug for DefaultProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultProcessor")
            .field("kind", &self.kind)
            .field("items", &self.items.len())
            .finish()
    }
}

type ProcessorConstructor = Box<dyn Fn(GeometryKind) -> Box<dyn GeometryProcessor> + Send + Sync>;

/// Maps geometry kinds to processor constructors.
pub struct ProcessorRegistry {
    constructors: HashMap<GeometryKind, ProcessorConstructor>,
}

impl ProcessorRegistry {
    /// A registry with no constructors.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry creating a [`DefaultProcessor`] for every kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in GeometryKind::ALL {
            registry.register(kind, |kind| Box::new(DefaultProcessor::new(kind)));
        }
        registry
    }

    /// Registers (or replaces) the constructor for `kind`.
    pub fn register(
        &mut self,
        kind: GeometryKind,
        constructor: impl Fn(GeometryKind) -> Box<dyn GeometryProcessor> + Send + Sync + 'static,
    ) {
        self.constructors.insert(kind, Box::new(constructor));
    }

    /// Creates a processor for `kind`, if one is registered.
    pub fn create(&self, kind: GeometryKind) -> Option<Box<dyn GeometryProcessor>> {
        self.constructors.get(&kind).map(|constructor| constructor(kind))
    }

    /// Whether `kind` has a constructor.
    pub fn supports(&self, kind: GeometryKind) -> bool {
        self.constructors.contains_key(&kind)
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.constructors.keys().collect();
        kinds.sort();
        f.debug_struct("ProcessorRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_core::geometry::{GeoPosition, Geometry, GeometryShape, RenderProperties};
    use carta_data::GeometryKey;
    use std::sync::Arc;

    fn item(index: u32) -> RenderItem {
        RenderItem {
            key: GeometryKey::from_raw_parts(index, 0),
            geometry: Arc::new(Geometry::new(GeometryShape::Point {
                position: GeoPosition::new(0.0, 0.0),
            })),
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut processor = DefaultProcessor::new(GeometryKind::Point);
        let a = item(0);
        assert_eq!(processor.add(vec![a.clone(), item(1)]), 2);
        assert_eq!(processor.add(vec![a]), 0);
        assert_eq!(processor.len(), 2);
    }

    #[test]
    fn test_remove_ignores_unknown_ids() {
        let mut processor = DefaultProcessor::new(GeometryKind::Point);
        let a = item(0);
        processor.add(vec![a.clone()]);
        let ids: HashSet<_> = [a.geometry.id(), GeometryId(u64::MAX)].into();
        assert_eq!(processor.remove(&ids), 1);
        assert_eq!(processor.remove(&ids), 0);
        assert!(processor.is_empty());
    }

    #[test]
    fn test_batch_orders_by_z_and_skips_unpickable_in_pick_mode() {
        let shape = || GeometryShape::Point {
            position: GeoPosition::new(0.0, 0.0),
        };
        let styled = |index: u32, properties: RenderProperties| RenderItem {
            key: GeometryKey::from_raw_parts(index, 0),
            geometry: Arc::new(Geometry::with_properties(shape(), properties)),
        };
        let top = styled(0, RenderProperties {
            z_order: 5,
            ..RenderProperties::default()
        });
        let bottom = styled(1, RenderProperties {
            z_order: -1,
            pickable: false,
            ..RenderProperties::default()
        });
        let hidden = styled(2, RenderProperties {
            visible: false,
            ..RenderProperties::default()
        });
        let mut processor = DefaultProcessor::new(GeometryKind::Point);
        processor.add(vec![top.clone(), bottom.clone(), hidden]);

        let keys = |items: Vec<RenderItem>| items.into_iter().map(|i| i.key).collect::<Vec<_>>();
        assert_eq!(keys(processor.batch(RenderMode::Draw)), vec![bottom.key, top.key]);
        assert_eq!(keys(processor.batch(RenderMode::Pick)), vec![top.key]);
    }

    #[test]
    fn test_registry_creates_registered_kinds_only() {
        let mut registry = ProcessorRegistry::empty();
        assert!(registry.create(GeometryKind::Label).is_none());
        registry.register(GeometryKind::Label, |kind| Box::new(DefaultProcessor::new(kind)));
        let processor = registry.create(GeometryKind::Label).unwrap();
        assert_eq!(processor.kind(), GeometryKind::Label);
        assert!(ProcessorRegistry::with_defaults().supports(GeometryKind::Tile));
    }
}
