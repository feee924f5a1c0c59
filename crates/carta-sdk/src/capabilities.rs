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

use carta_core::renderer::{DeviceCapabilities, DeviceInfo};
use serde::{Deserialize, Serialize};

/// What the committed pipeline can do, published once initialisation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderCapabilities {
    /// "vendor / renderer / version" of the driver.
    pub renderer_identifier: String,
    /// Optional device features and advertised extensions.
    pub supported_capabilities: Vec<String>,
}

impl RenderCapabilities {
    /// Collects the capabilities of a probed device.
    pub fn from_device(info: &DeviceInfo, capabilities: &DeviceCapabilities) -> Self {
        let mut supported: Vec<String> = capabilities
            .supported_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        supported.extend(info.extensions.iter().cloned());
        supported.sort();
        supported.dedup();
        Self {
            renderer_identifier: info.identifier(),
            supported_capabilities: supported,
        }
    }

    /// Whether `name` is supported. Names are compared case-insensitively.
    pub fn is_capability_supported(&self, name: &str) -> bool {
        self.supported_capabilities
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(name))
    }

    /// Serializes the capabilities for diagnostics.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
