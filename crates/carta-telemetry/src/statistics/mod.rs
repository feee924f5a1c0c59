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

//! Renderer statistics: the snapshot type, frame-rate sampling and publication.

mod publisher;
mod sampler;

pub use publisher::StatisticsPublisher;
pub use sampler::FrameRateSampler;

use carta_core::renderer::DeviceInfo;
use carta_data::CacheStats;
use serde::{Deserialize, Serialize};

/// Flattened render-data cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheUsage {
    /// GPU bytes charged.
    pub gpu_used: u64,
    /// Effective GPU ceiling.
    pub gpu_max: u64,
    /// Host bytes charged.
    pub host_used: u64,
    /// Effective host ceiling.
    pub host_max: u64,
    /// Cached entries.
    pub entries: usize,
    /// Lookup hits.
    pub hits: u64,
    /// Lookup misses.
    pub misses: u64,
    /// Budget evictions.
    pub evictions: u64,
}

impl From<&CacheStats> for CacheUsage {
    fn from(stats: &CacheStats) -> Self {
        Self {
            gpu_used: stats.gpu.used,
            gpu_max: stats.gpu.max,
            host_used: stats.host.used,
            host_max: stats.host.max,
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
        }
    }
}

/// A statistics snapshot handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RendererStatistics {
    /// Driver vendor.
    pub vendor: String,
    /// Renderer name.
    pub renderer: String,
    /// Driver version string.
    pub version: String,
    /// Advertised extensions.
    pub extensions: Vec<String>,
    /// Frame rate over the sampling window.
    pub frames_per_second: f64,
    /// Recent frame-rate samples, oldest first.
    pub frame_rate_samples: Vec<f64>,
    /// Frames drawn since initialisation.
    pub frames_rendered: u64,
    /// Frames skipped while initialising.
    pub frames_skipped: u64,
    /// Geometries rejected by the last frame.
    pub rejected_geometries: usize,
    /// Draw calls issued by the last frame.
    pub draw_calls: usize,
    /// Render-data cache usage.
    pub cache: CacheUsage,
}

impl RendererStatistics {
    /// Starts a snapshot from the driver identity.
    pub fn for_device(info: &DeviceInfo) -> Self {
        Self {
            vendor: info.vendor.clone(),
            renderer: info.renderer.clone(),
            version: info.version.clone(),
            extensions: info.extensions.clone(),
            ..Self::default()
        }
    }

    /// "vendor / renderer / version".
    pub fn renderer_identifier(&self) -> String {
        format!("{} / {} / {}", self.vendor, self.renderer, self.version)
    }

    /// Serializes the snapshot as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
