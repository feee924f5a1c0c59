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

//! Fans geometry batches out to per-kind processors and renders them.

use crate::processor::{GeometryProcessor, ProcessorRegistry};
use crate::renderer_set::RendererSet;
use carta_core::geometry::{Geometry, GeometryId, GeometryKind};
use carta_core::render::RenderContext;
use carta_core::renderer::RenderError;
use carta_data::{GeometryKey, GeometrySlots, RenderDataCache};
use carta_lanes::{RenderItem, RenderOutcome};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of rendering every processor for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributorOutcome {
    /// Totals across kinds; rejected geometries are retried next frame.
    pub totals: RenderOutcome,
    /// Kinds with retained geometries but no renderer.
    pub unsupported: Vec<GeometryKind>,
    /// Cache associations purged for removed geometries before rendering.
    pub purged: usize,
}

#[derive(Default)]
struct DistributorState {
    processors: HashMap<GeometryKind, Box<dyn GeometryProcessor>>,
    slots: GeometrySlots,
    kinds_by_id: HashMap<GeometryId, GeometryKind>,
    // Keys of removed geometries whose cache entries are purged on the render thread.
    pending_removals: Vec<GeometryKey>,
}

/// Maps geometry kinds to processors.
///
/// `update` may be called from any thread; rendering and cache purges happen
/// on the render thread only. The lock is held while batches are collected,
/// never while a renderer runs.
pub struct GeometryDistributor {
    registry: ProcessorRegistry,
    state: Mutex<DistributorState>,
}

impl GeometryDistributor {
    /// Creates a distributor using `registry` to build processors.
    pub fn new(registry: ProcessorRegistry) -> Self {
        Self {
            registry,
            state: Mutex::new(DistributorState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, DistributorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a batch: removals first, then additions.
    ///
    /// Removing an unknown geometry and adding a known one are no-ops.
    pub fn update(&self, adds: &[Arc<Geometry>], removes: &[GeometryId]) {
        let mut state = self.state();
        let state = &mut *state;

        let mut removals: HashMap<GeometryKind, HashSet<GeometryId>> = HashMap::new();
        for id in removes {
            let Some(kind) = state.kinds_by_id.remove(id) else {
                continue;
            };
            if let Some(key) = state.slots.release(*id) {
                state.pending_removals.push(key);
            }
            removals.entry(kind).or_default().insert(*id);
        }
        for (kind, ids) in removals {
            if let Some(processor) = state.processors.get_mut(&kind) {
                processor.remove(&ids);
            }
        }

        let mut additions: HashMap<GeometryKind, Vec<RenderItem>> = HashMap::new();
        for geometry in adds {
            let kind = geometry.kind();
            if state.kinds_by_id.contains_key(&geometry.id()) {
                continue;
            }
            if !state.processors.contains_key(&kind) {
                match self.registry.create(kind) {
                    Some(processor) => {
                        log::debug!("GeometryDistributor: Created processor for {kind}.");
                        state.processors.insert(kind, processor);
                    }
                    None => {
                        log::warn!("GeometryDistributor: No processor registered for {kind}.");
                        continue;
                    }
                }
            }
            let key = state.slots.register(geometry.id());
            state.kinds_by_id.insert(geometry.id(), kind);
            additions.entry(kind).or_default().push(RenderItem {
                key,
                geometry: Arc::clone(geometry),
            });
        }
        for (kind, items) in additions {
            if let Some(processor) = state.processors.get_mut(&kind) {
                processor.add(items);
            }
        }
    }

    /// Renders every processor in dispatch order for `ctx.mode`.
    ///
    /// An `Err` is a renderer fault and must be treated as context-level.
    pub fn render_geometries(
        &self,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
        renderers: &mut RendererSet,
    ) -> Result<DistributorOutcome, RenderError> {
        let mut outcome = DistributorOutcome::default();
        let batches: Vec<(GeometryKind, Vec<RenderItem>)> = {
            let mut state = self.state();
            for key in state.pending_removals.drain(..) {
                outcome.purged += cache.remove_geometry(key);
            }
            GeometryKind::ALL
                .into_iter()
                .filter_map(|kind| {
                    let processor = state.processors.get(&kind)?;
                    (!processor.is_empty()).then(|| (kind, processor.batch(ctx.mode)))
                })
                .collect()
        };

        for (kind, items) in batches {
            let Some(renderer) = renderers.renderer(kind, ctx.mode) else {
                outcome.unsupported.push(kind);
                continue;
            };
            if items.is_empty() {
                continue;
            }
            let rendered = renderer.render(&items, ctx, cache)?;
            if !rendered.rejected.is_empty() {
                log::trace!(
                    "GeometryDistributor: {} {kind} geometries rejected in {} pass.",
                    rendered.rejected.len(),
                    ctx.mode
                );
            }
            outcome.totals.merge(rendered);
        }
        Ok(outcome)
    }

    /// Drops every geometry and purges their cache entries.
    ///
    /// Safe to call whether or not rendering ever started.
    pub fn close(&self, cache: &RenderDataCache, renderers: Option<&mut RendererSet>) {
        let mut state = self.state();
        let mut purged = 0;
        for key in state.pending_removals.drain(..) {
            purged += cache.remove_geometry(key);
        }
        let mut processors: Vec<_> = state.processors.drain().map(|(_, p)| p).collect();
        for processor in &mut processors {
            for item in processor.clear() {
                purged += cache.remove_geometry(item.key);
            }
        }
        let state = &mut *state;
        for (id, _) in state.kinds_by_id.drain() {
            state.slots.release(id);
        }
        if let Some(renderers) = renderers {
            renderers.close();
        }
        log::info!(
            "GeometryDistributor: Closed {} processors, purged {purged} cache entries.",
            processors.len()
        );
    }

    /// Number of retained geometries.
    pub fn geometry_count(&self) -> usize {
        self.state().kinds_by_id.len()
    }

    /// Kinds that currently have a processor.
    pub fn kinds(&self) -> Vec<GeometryKind> {
        let state = self.state();
        GeometryKind::ALL
            .into_iter()
            .filter(|kind| state.processors.contains_key(kind))
            .collect()
    }

    /// Removed geometries whose cache entries are not purged yet.
    pub fn pending_removals(&self) -> usize {
        self.state().pending_removals.len()
    }

    /// The cache key of a retained geometry.
    pub fn key_of(&self, id: GeometryId) -> Option<GeometryKey> {
        self.state().slots.resolve(id)
    }
}

impl Default for GeometryDistributor {
    fn default() -> Self {
        Self::new(ProcessorRegistry::with_defaults())
    }
}

impl std::fmt::Debug for GeometryDistributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("GeometryDistributor")
            .field("geometries", &state.kinds_by_id.len())
            .field("processors", &state.processors.len())
            .field("pending_removals", &state.pending_removals.len())
            .finish()
    }
}
