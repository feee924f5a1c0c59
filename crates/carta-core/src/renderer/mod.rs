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

//! The graphics device contract and its value types.
//!
//! Everything in this module is backend-agnostic: concrete devices live in
//! `carta-infra` and are injected into the pipeline as `Arc<dyn GraphicsDevice>`.

mod command;
mod device;
mod error;
mod resource;

pub use command::{DrawCommand, Topology};
pub use device::{DeviceCapabilities, DeviceInfo, GraphicsDevice};
pub use error::{RenderError, ResourceError};
pub use resource::{ResourceHandle, ResourceId, ResourceKind, TextureDescriptor, TextureFormat};
