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

/// How prominently a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationSeverity {
    /// Informational.
    Info,
    /// A degraded but working configuration.
    Warning,
    /// The pipeline cannot continue.
    Fatal,
}

/// A single operator-facing report of non-fatal pipeline conditions.
///
/// Frontends may offer a "don't show again" choice keyed by `suppression_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotification {
    /// Presentation level.
    pub severity: NotificationSeverity,
    /// One-line summary.
    pub title: String,
    /// One entry per condition.
    pub details: Vec<String>,
    /// Stable key identifying this kind of report.
    pub suppression_key: String,
}

impl UserNotification {
    /// Creates a warning notification.
    pub fn warning(
        title: impl Into<String>,
        details: Vec<String>,
        suppression_key: impl Into<String>,
    ) -> Self {
        Self {
            severity: NotificationSeverity::Warning,
            title: title.into(),
            details,
            suppression_key: suppression_key.into(),
        }
    }
}
