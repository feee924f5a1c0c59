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

//! # Carta Core
//!
//! Foundational crate containing the geometry model, the projection and
//! time-budget value types, the graphics-device contract and the pipeline
//! configuration shared by every other crate of the workspace.

#![warn(missing_docs)]

pub mod config;
pub mod event;
pub mod geometry;
pub mod render;
pub mod renderer;
pub mod telemetry;
pub mod utils;

pub use config::{ConfigError, FrameRateMode, PipelineConfig};
pub use geometry::{Geometry, GeometryId, GeometryKind, GeometryShape, RenderProperties};
pub use render::{ProjectionId, ProjectionSnapshot, RenderContext, RenderMode, Rgba8, TimeBudget};
pub use utils::timer::Stopwatch;
