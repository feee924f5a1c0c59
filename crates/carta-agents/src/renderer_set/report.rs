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

use carta_core::event::UserNotification;
use carta_core::geometry::GeometryKind;

/// Suppression key of the viability notification.
pub const VIABILITY_NOTIFICATION_KEY: &str = "carta.renderer-viability";

/// A factory that declared itself unusable on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFactory {
    /// Factory name.
    pub name: String,
    /// Kind it renders.
    pub kind: GeometryKind,
    /// Reasons reported by the viability check.
    pub reasons: Vec<String>,
}

/// A factory permanently disabled by its dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledFactory {
    /// Factory name.
    pub name: String,
    /// Kind it renders.
    pub kind: GeometryKind,
    /// The error or panic message.
    pub reason: String,
}

/// Everything the harness learned while building a renderer set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViabilityReport {
    /// Operator-facing warnings, in the order they were raised.
    pub warnings: Vec<String>,
    /// Factories skipped as not viable.
    pub skipped: Vec<SkippedFactory>,
    /// Factories disabled by a dry-run fault.
    pub disabled: Vec<DisabledFactory>,
    /// The committed factory per kind.
    pub active: Vec<(GeometryKind, String)>,
    /// Kinds without any usable factory.
    pub unsupported: Vec<GeometryKind>,
}

impl ViabilityReport {
    /// Whether anything short of the preferred configuration was selected.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any warning mentions `text`.
    pub fn mentions(&self, text: &str) -> bool {
        self.warnings.iter().any(|warning| warning.contains(text))
    }

    /// The active factory of `kind`.
    pub fn active_for(&self, kind: GeometryKind) -> Option<&str> {
        self.active
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }

    /// The single notification summarising the warnings, if there are any.
    pub fn to_notification(&self) -> Option<UserNotification> {
        if self.warnings.is_empty() {
            return None;
        }
        let title = if self.unsupported.is_empty() {
            "Rendering runs with reduced capabilities"
        } else {
            "Some geometry types cannot be rendered on this graphics driver"
        };
        Some(UserNotification::warning(
            title,
            self.warnings.clone(),
            VIABILITY_NOTIFICATION_KEY,
        ))
    }
}
