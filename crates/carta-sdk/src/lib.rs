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

//! The public-facing API of the Carta rendering pipeline.
//!
//! A windowing layer creates one [`FrameDriver`] per graphics context, feeds it
//! geometries from any thread and calls [`FrameDriver::display`] on the render
//! thread whenever a frame is due.

#![warn(missing_docs)]

pub mod barrier;
pub mod capabilities;
pub mod capture;
pub mod driver;
pub mod fault;
pub mod memory;
pub mod pacing;
pub mod task_queue;

pub use barrier::{InitBarrier, InitState};
pub use capabilities::RenderCapabilities;
pub use capture::{CaptureId, CaptureListener};
pub use driver::{
    FrameDriver, FrameDriverBuilder, FrameOutcome, FrameStats, PickPoint, FAULT_NOTIFICATION_KEY,
};
pub use fault::{FaultPolicy, FaultReport};
pub use task_queue::{RenderTaskQueue, TaskRoute};

/// Everything a windowing layer needs to drive the pipeline.
pub mod prelude {
    pub use crate::{
        CaptureId, FaultPolicy, FaultReport, FrameDriver, FrameOutcome, InitState, PickPoint,
        RenderCapabilities, TaskRoute,
    };
    pub use carta_core::config::{FrameRateMode, PipelineConfig};
    pub use carta_core::event::{NotificationSeverity, UserNotification};
    pub use carta_core::geometry::{Geometry, GeometryId, GeometryKind, GeometryShape, RenderProperties};
    pub use carta_core::render::{ProjectionSnapshot, Rgba8};
    pub use carta_core::renderer::GraphicsDevice;
    pub use carta_telemetry::RendererStatistics;
}
