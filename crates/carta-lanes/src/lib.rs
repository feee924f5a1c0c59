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

//! # Carta Lanes
//!
//! Renderers are swappable strategies: for every geometry kind a list of
//! [`RendererFactory`] implementations is registered in preference order and the
//! renderer-set harness in `carta-agents` decides which one is used on the
//! current device.
//!
//! Most renderers are thin: a [`CommandBuilder`] turns one geometry into screen
//! space draw commands (caching its model data in the render-data cache) and a
//! generic renderer submits them, either immediately ([`ImmediateRenderer`]) or
//! through compiled draw lists ([`CompiledRenderer`]).

#![warn(missing_docs)]

pub mod builders;
pub mod dry_run;
pub mod factories;
pub mod image_source;
pub mod model;
pub mod render_lane;

pub use factories::default_factories;
pub use image_source::MemoryImageSource;
pub use render_lane::*;
