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

//! The viability and dry-run harness.
//!
//! Candidates of each kind are tried in preference order. A candidate must pass
//! its own viability check and then render synthetic geometries in PICK and DRAW
//! mode without an error or a panic. The first survivor becomes active; failing
//! candidates are disabled for the lifetime of the set. The harness itself never
//! fails: the worst outcome is a kind marked unsupported.

use super::{DisabledFactory, RendererSet, SkippedFactory, ViabilityReport};
use carta_core::config::PipelineConfig;
use carta_core::geometry::{Geometry, GeometryKind};
use carta_core::render::{PickColorProvider, RenderContext, RenderMode, Rgba8};
use carta_core::renderer::{GraphicsDevice, ResourceId};
use carta_data::{CacheBudgets, CacheEvent, GeometrySlots, RenderDataCache};
use carta_lanes::dry_run::{synthetic_geometries, synthetic_projection};
use carta_lanes::{CompiledDrawListFactory, RenderItem, RendererFactory};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Hands out distinct colors for dry-run PICK passes.
#[derive(Debug, Default)]
struct ScratchPickColors {
    next: AtomicU32,
}

impl PickColorProvider for ScratchPickColors {
    fn pick_color(&self, _geometry: &Geometry) -> Rgba8 {
        Rgba8::from_rgb_u24(self.next.fetch_add(1, Ordering::Relaxed) % 0xFF_FFFF + 1)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Builds a [`RendererSet`] from registered factories.
pub struct RendererSetFactory {
    factories: Vec<Arc<dyn RendererFactory>>,
    use_compiled_draw_lists: bool,
    safe_mode: bool,
    dry_run_passes: u32,
}

impl RendererSetFactory {
    /// Creates a harness over `factories`, listed most preferred first per kind.
    pub fn new(factories: Vec<Arc<dyn RendererFactory>>) -> Self {
        Self {
            factories,
            use_compiled_draw_lists: true,
            safe_mode: false,
            dry_run_passes: 2,
        }
    }

    /// Creates a harness configured from `config`.
    pub fn from_config(factories: Vec<Arc<dyn RendererFactory>>, config: &PipelineConfig) -> Self {
        Self::new(factories)
            .with_compiled_draw_lists(config.use_compiled_draw_lists)
            .with_safe_mode(config.safe_mode)
            .with_dry_run_passes(config.dry_run_passes)
    }

    /// Enables the compiled draw-list decorators.
    pub fn with_compiled_draw_lists(mut self, enabled: bool) -> Self {
        self.use_compiled_draw_lists = enabled;
        self
    }

    /// Keeps only the most conservative factory per kind.
    pub fn with_safe_mode(mut self, enabled: bool) -> Self {
        self.safe_mode = enabled;
        self
    }

    /// Render passes per mode during a dry run (at least one).
    pub fn with_dry_run_passes(mut self, passes: u32) -> Self {
        self.dry_run_passes = passes.max(1);
        self
    }

    /// Candidates of `kind` in the order they are tried.
    pub fn candidates(&self, kind: GeometryKind) -> Vec<Arc<dyn RendererFactory>> {
        let registered: Vec<_> = self
            .factories
            .iter()
            .filter(|factory| factory.kind() == kind)
            .cloned()
            .collect();

        if self.safe_mode {
            let conservative = registered
                .iter()
                .find(|factory| factory.is_conservative())
                .or_else(|| registered.last())
                .cloned();
            return conservative.into_iter().collect();
        }

        let mut candidates = Vec::with_capacity(registered.len() * 2);
        for factory in registered {
            if self.use_compiled_draw_lists {
                if let Some(compiled) = CompiledDrawListFactory::wrap(Arc::clone(&factory)) {
                    candidates.push(Arc::new(compiled) as Arc<dyn RendererFactory>);
                }
            }
            candidates.push(factory);
        }
        candidates
    }

    /// Runs the harness on `device`.
    ///
    /// Everything the dry runs allocate is destroyed before returning, and the
    /// framebuffer is cleared.
    pub fn build(&self, device: &dyn GraphicsDevice) -> (RendererSet, ViabilityReport) {
        let mut set = RendererSet::default();
        let mut report = ViabilityReport::default();
        self.probe_capabilities(device, &mut report);

        for kind in GeometryKind::ALL {
            let candidates = self.candidates(kind);
            if candidates.is_empty() {
                continue;
            }

            let mut surviving = Vec::new();
            let mut active_found = false;
            for candidate in candidates {
                let name = candidate.name().to_string();
                let mut reasons = Vec::new();
                let viable = panic::catch_unwind(AssertUnwindSafe(|| {
                    candidate.is_viable(device, &mut reasons)
                }))
                .unwrap_or_else(|payload| {
                    reasons.push(format!("viability check {}", panic_message(payload)));
                    false
                });
                if !viable {
                    log::info!("RendererSetFactory: '{name}' is not viable for {kind}: {reasons:?}");
                    report.skipped.push(SkippedFactory {
                        name,
                        kind,
                        reasons,
                    });
                    continue;
                }

                if active_found {
                    surviving.push(candidate);
                    continue;
                }

                match self.dry_run(candidate.as_ref(), device) {
                    Ok(()) => {
                        log::info!("RendererSetFactory: '{name}' is active for {kind}.");
                        report.active.push((kind, name));
                        surviving.push(candidate);
                        active_found = true;
                    }
                    Err(reason) => {
                        log::warn!(
                            "RendererSetFactory: '{name}' failed its dry run for {kind}: {reason}"
                        );
                        report.warnings.push(format!(
                            "Renderer '{name}' for {kind} failed its dry run and was disabled: {reason}"
                        ));
                        report.disabled.push(DisabledFactory {
                            name: name.clone(),
                            kind,
                            reason,
                        });
                        set.record_disabled(name);
                    }
                }
            }

            if !active_found {
                log::warn!("RendererSetFactory: No usable renderer for {kind}.");
                report.warnings.push(format!(
                    "No usable renderer for {kind}; {kind} geometries will not be drawn."
                ));
                report.unsupported.push(kind);
            }
            set.insert(kind, surviving);
        }

        device.clear(Rgba8::BLACK);
        (set, report)
    }

    fn probe_capabilities(&self, device: &dyn GraphicsDevice, report: &mut ViabilityReport) {
        let capabilities = device.capabilities();
        if !capabilities.compressed_textures {
            report.warnings.push(
                "The graphics driver does not support compressed textures; imagery uses more memory."
                    .to_string(),
            );
        }
        if self.use_compiled_draw_lists && !self.safe_mode && !capabilities.draw_lists {
            report.warnings.push(
                "The graphics driver cannot compile draw lists; geometries are drawn immediately."
                    .to_string(),
            );
        }
        if !capabilities.vertex_buffers {
            report.warnings.push(
                "The graphics driver has no vertex buffers; meshes are submitted from host memory."
                    .to_string(),
            );
        }
        if self.safe_mode {
            log::warn!("RendererSetFactory: Safe mode, only conservative renderers are used.");
        }
    }

    /// Exercises `factory` with synthetic geometries in PICK then DRAW mode.
    fn dry_run(&self, factory: &dyn RendererFactory, device: &dyn GraphicsDevice) -> Result<(), String> {
        let scratch = RenderDataCache::new(CacheBudgets::default());
        let removals = scratch.subscribe();
        let projection = synthetic_projection();
        let picks = ScratchPickColors::default();

        let mut slots = GeometrySlots::new();
        let items: Vec<RenderItem> = synthetic_geometries(factory.kind())
            .into_iter()
            .map(|geometry| RenderItem {
                key: slots.register(geometry.id()),
                geometry,
            })
            .collect();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), String> {
            let mut renderer = factory.create();
            let result = RenderMode::ALL.into_iter().try_for_each(|mode| {
                let ctx = RenderContext::new(device, mode, &projection).with_pick_colors(&picks);
                (0..self.dry_run_passes).try_for_each(|pass| {
                    renderer
                        .render(&items, &ctx, &scratch)
                        .map(|_| ())
                        .map_err(|e| format!("{mode} pass {} failed: {e}", pass + 1))
                })
            });
            renderer.close();
            result
        }))
        .unwrap_or_else(|payload| Err(panic_message(payload)));

        scratch.clear();
        let mut disposed: HashSet<ResourceId> = HashSet::new();
        for CacheEvent::ContentRemoved { handles, .. } in removals.try_iter() {
            for handle in handles {
                if !disposed.insert(handle.id) {
                    continue;
                }
                if let Err(e) = device.destroy(&handle) {
                    log::warn!(
                        "RendererSetFactory: Could not free dry-run {} of '{}': {e}",
                        handle.kind,
                        factory.name()
                    );
                }
            }
        }
        outcome
    }
}

impl std::fmt::Debug for RendererSetFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.factories.iter().map(|factory| factory.name()).collect();
        f.debug_struct("RendererSetFactory")
            .field("factories", &names)
            .field("use_compiled_draw_lists", &self.use_compiled_draw_lists)
            .field("safe_mode", &self.safe_mode)
            .field("dry_run_passes", &self.dry_run_passes)
            .finish()
    }
}
