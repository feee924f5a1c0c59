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

//! Immediate-mode submission: every command is drawn as soon as it is built.

use super::{Built, CommandBuilder, GeometryRenderer, RenderItem, RenderOutcome, RendererFactory};
use carta_core::geometry::GeometryKind;
use carta_core::render::RenderContext;
use carta_core::renderer::{GraphicsDevice, RenderError};
use carta_data::RenderDataCache;
use std::sync::Arc;

/// Draws each item's commands directly on the device.
pub struct ImmediateRenderer {
    name: String,
    builder: Arc<dyn CommandBuilder>,
}

impl ImmediateRenderer {
    /// Creates a renderer around `builder`.
    pub fn new(name: impl Into<String>, builder: Arc<dyn CommandBuilder>) -> Self {
        Self {
            name: name.into(),
            builder,
        }
    }
}

impl GeometryRenderer for ImmediateRenderer {
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
                log::trace!(
                    "{}: budget expired, {} items deferred.",
                    self.name,
                    items.len() - i
                );
                break;
            }
            match self.builder.build(item, ctx, cache)? {
                Built::Commands(commands) => {
                    for command in &commands {
                        ctx.device.draw(command)?;
                    }
                    outcome.draw_calls += commands.len();
                    outcome.rendered += 1;
                }
                Built::NotReady => outcome.rejected.push(item.geometry.id()),
                Built::Skip => {}
            }
        }
        Ok(outcome)
    }
}

/// A factory producing [`ImmediateRenderer`]s around a shared builder.
pub struct ImmediateFactory {
    name: String,
    builder: Arc<dyn CommandBuilder>,
    conservative: bool,
}

impl ImmediateFactory {
    /// Creates a factory.
    pub fn new(name: impl Into<String>, builder: Arc<dyn CommandBuilder>) -> Self {
        Self {
            name: name.into(),
            builder,
            conservative: false,
        }
    }

    /// Marks the factory as the most conservative strategy for its kind.
    pub fn conservative(mut self) -> Self {
        self.conservative = true;
        self
    }
}

impl RendererFactory for ImmediateFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> GeometryKind {
        self.builder.kind()
    }

    fn is_viable(&self, device: &dyn GraphicsDevice, warnings: &mut Vec<String>) -> bool {
        self.builder.is_viable(device, warnings)
    }

    fn is_conservative(&self) -> bool {
        self.conservative
    }

    fn command_builder(&self) -> Option<Arc<dyn CommandBuilder>> {
        Some(Arc::clone(&self.builder))
    }

    fn create(&self) -> Box<dyn GeometryRenderer> {
        Box::new(ImmediateRenderer::new(self.name.clone(), Arc::clone(&self.builder)))
    }
}
