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

//! The committed renderer set and the harness that builds it.

mod factory;
mod report;

pub use factory::RendererSetFactory;
pub use report::{DisabledFactory, SkippedFactory, ViabilityReport, VIABILITY_NOTIFICATION_KEY};

use carta_core::geometry::GeometryKind;
use carta_core::render::{PerMode, RenderMode};
use carta_lanes::{GeometryRenderer, RendererFactory};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Whether a kind can be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindSupport {
    /// Rendered by the named factory.
    Active(String),
    /// No factory survived viability and dry runs.
    Unsupported,
}

struct KindEntry {
    /// Surviving factories, most preferred first; the first one is active.
    factories: Vec<Arc<dyn RendererFactory>>,
    /// One lazily created renderer per mode.
    renderers: PerMode<Option<Box<dyn GeometryRenderer>>>,
}

/// The renderers chosen for one graphics-context lifetime.
///
/// Each kind has at most one active factory, and at most one renderer instance
/// per mode is ever created from it.
#[derive(Default)]
pub struct RendererSet {
    kinds: HashMap<GeometryKind, KindEntry>,
    disabled: Vec<String>,
}

impl RendererSet {
    pub(crate) fn insert(&mut self, kind: GeometryKind, factories: Vec<Arc<dyn RendererFactory>>) {
        if factories.is_empty() {
            self.kinds.remove(&kind);
            return;
        }
        self.kinds.insert(
            kind,
            KindEntry {
                factories,
                renderers: PerMode::default(),
            },
        );
    }

    pub(crate) fn record_disabled(&mut self, name: impl Into<String>) {
        self.disabled.push(name.into());
    }

    /// Support state of `kind`.
    pub fn support(&self, kind: GeometryKind) -> KindSupport {
        match self.active_factory(kind) {
            Some(name) => KindSupport::Active(name.to_string()),
            None => KindSupport::Unsupported,
        }
    }

    /// Whether `kind` has an active factory.
    pub fn is_supported(&self, kind: GeometryKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    /// Name of the active factory of `kind`.
    pub fn active_factory(&self, kind: GeometryKind) -> Option<&str> {
        self.kinds
            .get(&kind)
            .and_then(|entry| entry.factories.first())
            .map(|factory| factory.name())
    }

    /// Names of the remaining factories of `kind`, in preference order.
    pub fn factories(&self, kind: GeometryKind) -> Vec<&str> {
        self.kinds
            .get(&kind)
            .map(|entry| entry.factories.iter().map(|f| f.name()).collect())
            .unwrap_or_default()
    }

    /// Factories disabled for the lifetime of this set.
    pub fn disabled_factories(&self) -> &[String] {
        &self.disabled
    }

    /// The renderer of `kind` for `mode`, created on first use.
    pub fn renderer(
        &mut self,
        kind: GeometryKind,
        mode: RenderMode,
    ) -> Option<&mut (dyn GeometryRenderer + 'static)> {
        let entry = self.kinds.get_mut(&kind)?;
        let factory = entry.factories.first()?;
        let slot = entry.renderers.get_mut(mode);
        if slot.is_none() {
            log::debug!(
                "RendererSet: Creating {mode} renderer '{}' for {kind}.",
                factory.name()
            );
            *slot = Some(factory.create());
        }
        slot.as_deref_mut()
    }

    /// Closes every created renderer. Renderers are recreated on next use.
    pub fn close(&mut self) {
        for entry in self.kinds.values_mut() {
            for mode in RenderMode::ALL {
                if let Some(mut renderer) = entry.renderers.get_mut(mode).take() {
                    renderer.close();
                }
            }
        }
    }
}

impl fmt::Debug for RendererSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut active: Vec<_> = self
            .kinds
            .keys()
            .map(|kind| (*kind, self.active_factory(*kind).unwrap_or_default()))
            .collect();
        active.sort();
        f.debug_struct("RendererSet")
            .field("active", &active)
            .field("disabled", &self.disabled)
            .finish()
    }
}
