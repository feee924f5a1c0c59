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

//! # Carta Agents
//!
//! The orchestrators of the rendering pipeline. They own no drawing logic of
//! their own; they decide which renderer lane runs, feed it geometries, and
//! reclaim what it leaves behind:
//!
//! - [`GeometryDistributor`] groups geometries by kind into processors.
//! - [`RendererSetFactory`] selects one viable renderer per kind, proving each
//!   candidate with a dry run first.
//! - [`PickManager`] assigns identity colors and decodes pick passes.
//! - [`DisposalHelpers`] free device resources once the cache lets go of them.

#![warn(missing_docs)]

pub mod disposal;
pub mod distributor;
pub mod pick;
pub mod processor;
pub mod renderer_set;

pub use disposal::{DisposalError, DisposalHelper, DisposalHelpers};
pub use distributor::{DistributorOutcome, GeometryDistributor};
pub use pick::PickManager;
pub use processor::{DefaultProcessor, GeometryProcessor, ProcessorRegistry};
pub use renderer_set::{
    DisabledFactory, KindSupport, RendererSet, RendererSetFactory, SkippedFactory,
    ViabilityReport,
};
