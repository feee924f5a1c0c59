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

//! # Carta Infra
//!
//! Concrete implementations of the contracts defined in `carta-core`: a headless
//! software graphics device, host and device memory monitors, and logger setup.

#![warn(missing_docs)]

#[cfg(feature = "graphics")]
pub mod graphics;
pub mod logging;
pub mod telemetry;

#[cfg(feature = "graphics")]
pub use graphics::headless::{DeviceCounters, HeadlessDevice};
pub use logging::{init_logging, LoggingConfig};
#[cfg(feature = "platform")]
pub use telemetry::memory_monitor::HostMemoryMonitor;
pub use telemetry::vram_monitor::VramMonitor;
