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

//! # Carta Data
//!
//! Data structures owned by the render thread: the generation-checked geometry
//! slot arena and the dual-budget render-data cache.

#![warn(missing_docs)]

pub mod cache;
pub mod keys;

pub use cache::{
    BudgetClass, BudgetUsage, CacheBudgets, CacheError, CacheEvent, CacheKey, CacheStats,
    Footprint, RemovalReason, RenderDataCache,
};
pub use keys::{GeometryKey, GeometrySlots};
