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

//! Keys, footprints and notifications of the render-data cache.

use super::BudgetClass;
use crate::keys::GeometryKey;
use carta_core::render::ProjectionId;
use carta_core::renderer::ResourceHandle;
use std::any::TypeId;
use std::fmt;

/// Identifies one association of a geometry: its key plus the type of the cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The owning geometry.
    pub geometry: GeometryKey,
    association: TypeId,
    association_name: &'static str,
}

impl CacheKey {
    /// The key of the `T` association of `geometry`.
    pub fn of<T: 'static>(geometry: GeometryKey) -> Self {
        Self {
            geometry,
            association: TypeId::of::<T>(),
            association_name: std::any::type_name::<T>(),
        }
    }

    /// The type name of the association, for diagnostics.
    pub fn association_name(&self) -> &'static str {
        self.association_name
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self
            .association_name
            .rsplit("::")
            .next()
            .unwrap_or(self.association_name);
        write!(f, "{}/{}", self.geometry, short)
    }
}

/// What an entry costs and what it references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Footprint {
    /// Host bytes of the cached value.
    pub host_bytes: u64,
    /// Device bytes referenced by `handles`.
    pub gpu_bytes: u64,
    /// Device allocations released when the entry leaves the cache.
    pub handles: Vec<ResourceHandle>,
    /// The projection the value was computed under, `None` if it does not depend on one.
    pub projection: Option<ProjectionId>,
}

impl Footprint {
    /// A host-only footprint.
    pub fn host(bytes: u64) -> Self {
        Self {
            host_bytes: bytes,
            ..Default::default()
        }
    }

    /// Adds a device allocation, charging its size to the GPU budget.
    pub fn with_handle(mut self, handle: ResourceHandle) -> Self {
        self.gpu_bytes += handle.size_bytes;
        self.handles.push(handle);
        self
    }

    /// Adds several device allocations.
    pub fn with_handles(self, handles: impl IntoIterator<Item = ResourceHandle>) -> Self {
        handles.into_iter().fold(self, Footprint::with_handle)
    }

    /// Binds the entry to a projection snapshot.
    pub fn bound_to(mut self, projection: ProjectionId) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Bytes charged to `class`.
    pub fn bytes(&self, class: BudgetClass) -> u64 {
        match class {
            BudgetClass::Gpu => self.gpu_bytes,
            BudgetClass::Host => self.host_bytes,
        }
    }
}

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Evicted to satisfy a budget.
    Evicted,
    /// Overwritten by a newer value for the same key.
    Replaced,
    /// Removed explicitly, usually because its geometry was removed.
    Removed,
    /// Dropped by `clear`.
    Cleared,
    /// Never admitted because it exceeds an empty budget.
    Rejected,
}

/// Notifications published by the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// An entry left the cache; its handles must be disposed on the render thread.
    ContentRemoved {
        /// The key of the removed entry.
        key: CacheKey,
        /// The device allocations the entry referenced.
        handles: Vec<ResourceHandle>,
        /// Why the entry was removed.
        reason: RemovalReason,
    },
}
