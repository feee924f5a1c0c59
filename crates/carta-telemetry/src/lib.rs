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

//! # Carta Telemetry
//!
//! Periodic resource monitoring and the renderer statistics egress: frame-rate
//! sampling, statistics snapshots and their publication to subscribers.

#![warn(missing_docs)]

pub mod monitoring;
pub mod service;
pub mod statistics;

pub use monitoring::registry::MonitorRegistry;
pub use service::TelemetryService;
pub use statistics::{
    CacheUsage, FrameRateSampler, RendererStatistics, StatisticsPublisher,
};
