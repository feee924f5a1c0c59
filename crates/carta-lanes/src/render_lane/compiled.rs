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

//! Compiled draw-list submission.
//!
//! The decorator still builds every item's commands each pass (builders serve
//! them from the cache), but submits them through a per-geometry draw list that
//! is compiled once and replayed while its signature is unchanged. The list is
//! bound to the projection it was compiled under, and DRAW and PICK passes keep
//! separate lists.

use super::{Built, CommandBuilder, GeometryRenderer, RenderItem, RenderOutcome, RendererFactory};
use carta_core::geometry::GeometryKind;
use carta_core::render::{RenderContext, RenderMode};
use carta_core::renderer::{DrawCommand, GraphicsDevice, RenderError, ResourceHandle};
use carta_data::{CacheError, Footprint, RenderDataCache};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct CompiledList {
    handle: ResourceHandle,
    signature: u64,
}

#[derive(Debug)]
struct DrawModeList(CompiledList);

#[derive(Debug)]
struct PickModeList(CompiledList);

fn signature(commands: &[DrawCommand]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for command in commands {
        command.color.hash(&mut hasher);
        command.texture.map(|h| h.id).hash(&mut hasher);
        command.buffer.map(|h| h.id).hash(&mut hasher);
        command.point_size.to_bits().hash(&mut hasher);
        command.line_width.to_bits().hash(&mut hasher);
        command.vertices.len().hash(&mut hasher);
    }
    hasher.finish()
}

/// Replays compiled draw lists built from an inner command builder.
pub struct CompiledRenderer {
    name: String,
    builder: Arc<dyn CommandBuilder>,
}

impl CompiledRenderer {
    fn cached_list(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Option<CompiledList> {
        let projection = Some(ctx.projection.id());
        match ctx.mode {
            RenderMode::Draw => cache
                .get_cache_association::<DrawModeList>(item.key, projection)
                .map(|l| l.0),
            RenderMode::Pick => cache
                .get_cache_association::<PickModeList>(item.key, projection)
                .map(|l| l.0),
        }
    }

    fn store_list(
        &self,
        item: &RenderItem,
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
        list: CompiledList,
        host_bytes: u64,
    ) {
        let footprint = Footprint::host(host_bytes)
            .with_handle(list.handle)
            .bound_to(ctx.projection.id());
        let stored: Result<(), CacheError> = match ctx.mode {
            RenderMode::Draw => cache
                .insert(item.key, DrawModeList(list), footprint)
                .map(|_| ()),
            RenderMode::Pick => cache
                .insert(item.key, PickModeList(list), footprint)
                .map(|_| ()),
        };
        if let Err(e) = stored {
            log::debug!("{}: draw list not cached: {e}", self.name);
        }
    }
}

impl GeometryRenderer for CompiledRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> GeometryKind {
        self.builder.kind()
    }

    fn render(
        &mut self,
        items: &[RenderItem],
        ctx: &RenderContext<'_>,
        cache: &RenderDataCache,
    ) -> Result<RenderOutcome, RenderError> {
        let mut outcome = RenderOutcome::default();
        for (i, item) in items.iter().enumerate() {
            if ctx.budget.is_expired() {
                outcome
                    .rejected
                    .extend(items[i..].iter().map(|it| it.geometry.id()));
                break;
            }
            let commands = match self.builder.build(item, ctx, cache)? {
                Built::Commands(commands) => commands,
                Built::NotReady => {
                    outcome.rejected.push(item.geometry.id());
                    continue;
                }
                Built::Skip => continue,
            };
            let sig = signature(&commands);
            let list = match self.cached_list(item, ctx, cache) {
                Some(list) if list.signature == sig => list,
                _ => {
                    let handle = ctx.device.compile_draw_list(&commands)?;
                    let list = CompiledList {
                        handle,
                        signature: sig,
                    };
                    let host_bytes = commands.iter().map(DrawCommand::host_bytes).sum();
                    self.store_list(item, ctx, cache, list, host_bytes);
                    list
                }
            };
            ctx.device.execute_draw_list(&list.handle)?;
            outcome.draw_calls += 1;
            outcome.rendered += 1;
        }
        Ok(outcome)
    }
}

/// Wraps a factory that has an immediate-mode variant with draw-list compilation.
pub struct CompiledDrawListFactory {
    name: String,
    inner: Arc<dyn RendererFactory>,
    builder: Arc<dyn CommandBuilder>,
}

impl CompiledDrawListFactory {
    /// Wraps `inner`, or returns `None` when it has no immediate-mode variant.
    pub fn wrap(inner: Arc<dyn RendererFactory>) -> Option<Self> {
        let builder = inner.command_builder()?;
        Some(Self {
            name: format!("Compiled({})", inner.name()),
            inner,
            builder,
        })
    }
}

impl RendererFactory for CompiledDrawListFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> GeometryKind {
        self.inner.kind()
    }

    fn is_viable(&self, device: &dyn GraphicsDevice, warnings: &mut Vec<String>) -> bool {
        if !device.capabilities().draw_lists {
            warnings.push(format!(
                "{}: the device cannot compile draw lists",
                self.name
            ));
            return false;
        }
        self.inner.is_viable(device, warnings)
    }

    fn create(&self) -> Box<dyn GeometryRenderer> {
        Box::new(CompiledRenderer {
            name: self.name.clone(),
            builder: Arc::clone(&self.builder),
        })
    }
}
