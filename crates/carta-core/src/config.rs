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

//! Process-scoped pipeline configuration.
//!
//! The configuration is set once at startup, validated, and then passed by value
//! to the constructors that need it. Nothing reads it through global state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How frames are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRateMode {
    /// Render continuously, as fast as possible.
    Unbounded,
    /// Render only when a repaint is requested.
    OnDemand,
    /// Render at a fixed target rate.
    Fixed(u32),
}

impl FrameRateMode {
    /// Decodes the `target_frame_rate` setting (-1, 0 or N).
    pub fn from_target(target: i32) -> Self {
        match target {
            t if t < 0 => FrameRateMode::Unbounded,
            0 => FrameRateMode::OnDemand,
            t => FrameRateMode::Fixed(t as u32),
        }
    }

    /// Interval between frames for a fixed rate.
    pub fn frame_interval(&self) -> Option<Duration> {
        match self {
            FrameRateMode::Fixed(fps) if *fps > 0 => {
                Some(Duration::from_secs_f64(1.0 / *fps as f64))
            }
            _ => None,
        }
    }
}

/// Tunables of the rendering pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Prefer compiled draw lists over immediate-mode renderers when available.
    pub use_compiled_draw_lists: bool,
    /// Keep only the most conservative renderer per geometry kind.
    pub safe_mode: bool,
    /// -1 unbounded, 0 on demand, N frames per second.
    pub target_frame_rate: i32,
    /// Share of probed device memory used as the GPU cache ceiling.
    pub gpu_budget_fraction: f64,
    /// GPU low-water mark as a share of the GPU ceiling.
    pub gpu_low_water_fraction: f64,
    /// Share of host memory used as the host cache ceiling.
    pub host_budget_fraction: f64,
    /// Host low-water mark as a share of the host ceiling.
    pub host_low_water_fraction: f64,
    /// Overall budget of one frame.
    pub frame_budget_ms: u64,
    /// Share of the frame budget given to the render task queue.
    pub task_queue_budget_ms: u64,
    /// Minimum interval between two PICK passes outside on-demand mode.
    pub pick_throttle_ms: u64,
    /// Dry-run passes per render mode when probing renderers.
    pub dry_run_passes: u32,
    /// Queue depth above which device-free tasks move to the background executor.
    pub load_sensitive_threshold: usize,
    /// Delay between a fatal fault and process termination.
    pub fatal_exit_delay_ms: u64,
    /// Interval between two statistics publications.
    pub statistics_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_compiled_draw_lists: true,
            safe_mode: false,
            target_frame_rate: 0,
            gpu_budget_fraction: 0.5,
            gpu_low_water_fraction: 0.9,
            host_budget_fraction: 0.25,
            host_low_water_fraction: 0.75,
            frame_budget_ms: 1000,
            task_queue_budget_ms: 100,
            pick_throttle_ms: 100,
            dry_run_passes: 2,
            load_sensitive_threshold: 10,
            fatal_exit_delay_ms: 2000,
            statistics_interval_ms: 1000,
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is within its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions = [
            ("gpu_budget_fraction", self.gpu_budget_fraction),
            ("gpu_low_water_fraction", self.gpu_low_water_fraction),
            ("host_budget_fraction", self.host_budget_fraction),
            ("host_low_water_fraction", self.host_low_water_fraction),
        ];
        for (field, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: format!("{value} is not in (0, 1]"),
                });
            }
        }
        if self.frame_budget_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "frame_budget_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.task_queue_budget_ms == 0 || self.task_queue_budget_ms > self.frame_budget_ms {
            return Err(ConfigError::OutOfRange {
                field: "task_queue_budget_ms",
                reason: format!("must be in [1, {}]", self.frame_budget_ms),
            });
        }
        if self.dry_run_passes == 0 {
            return Err(ConfigError::OutOfRange {
                field: "dry_run_passes",
                reason: "at least one pass is required".to_string(),
            });
        }
        if self.statistics_interval_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "statistics_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// The decoded frame-rate mode.
    pub fn frame_rate_mode(&self) -> FrameRateMode {
        FrameRateMode::from_target(self.target_frame_rate)
    }

    /// The overall frame budget.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// The task queue share of the frame budget.
    pub fn task_queue_budget(&self) -> Duration {
        Duration::from_millis(self.task_queue_budget_ms)
    }

    /// The minimum interval between PICK passes.
    pub fn pick_throttle(&self) -> Duration {
        Duration::from_millis(self.pick_throttle_ms)
    }

    /// The delay before a fatal fault terminates the process.
    pub fn fatal_exit_delay(&self) -> Duration {
        Duration::from_millis(self.fatal_exit_delay_ms)
    }

    /// The statistics publication interval.
    pub fn statistics_interval(&self) -> Duration {
        Duration::from_millis(self.statistics_interval_ms)
    }
}

/// An invalid configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The document could not be parsed.
    Parse(String),
    /// A field holds a value outside its domain.
    OutOfRange {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Failed to parse pipeline configuration: {msg}"),
            ConfigError::OutOfRange { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
