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

//! Device resource reclamation.
//!
//! The render-data cache never frees device memory. Each helper subscribes to
//! the cache's removal events for one resource class, queues the handles they
//! carry, and destroys them on the render thread once the frame is drawn. A
//! handle is destroyed at most once, however often it is reported.
//!
//! Destroyed ids are remembered only while a live cache entry still references
//! them; [`DisposalHelper::prune`] forgets the rest.

mod error;

pub use error::DisposalError;

use carta_core::renderer::{GraphicsDevice, ResourceHandle, ResourceId, ResourceKind};
use carta_data::{CacheEvent, RenderDataCache};
use std::collections::HashSet;

#[derive(Debug)]
enum HelperState {
    Created,
    Open(flume::Receiver<CacheEvent>),
    Closed,
}

/// Reclaims the device resources of one class.
#[derive(Debug)]
pub struct DisposalHelper {
    kind: ResourceKind,
    state: HelperState,
    queued: Vec<ResourceHandle>,
    queued_ids: HashSet<ResourceId>,
    disposed: HashSet<ResourceId>,
    disposed_total: usize,
}

impl DisposalHelper {
    /// Creates an unopened helper for `kind`.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            state: HelperState::Created,
            queued: Vec::new(),
            queued_ids: HashSet::new(),
            disposed: HashSet::new(),
            disposed_total: 0,
        }
    }

    /// The resource class handled.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Whether the helper is open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, HelperState::Open(_))
    }

    /// Handles destroyed so far.
    pub fn disposed_count(&self) -> usize {
        self.disposed_total
    }

    /// Destroyed ids still remembered to reject repeated reports.
    pub fn tracked(&self) -> usize {
        self.disposed.len()
    }

    /// Handles waiting for the next cleanup, after collecting pending events.
    pub fn queued(&mut self) -> Result<usize, DisposalError> {
        self.collect()?;
        Ok(self.queued.len())
    }

    /// Subscribes to `cache` removal events.
    pub fn open(&mut self, cache: &RenderDataCache) -> Result<(), DisposalError> {
        match self.state {
            HelperState::Created => {
                self.state = HelperState::Open(cache.subscribe());
                log::debug!("DisposalHelper: Opened {} helper.", self.kind);
                Ok(())
            }
            HelperState::Open(_) => Err(self.defect(DisposalError::AlreadyOpen { kind: self.kind })),
            HelperState::Closed => Err(self.defect(DisposalError::Closed { kind: self.kind })),
        }
    }

    fn defect(&self, error: DisposalError) -> DisposalError {
        log::error!("DisposalHelper: {error}");
        error
    }

    fn collect(&mut self) -> Result<(), DisposalError> {
        let events = match &self.state {
            HelperState::Open(events) => events,
            HelperState::Created => {
                return Err(self.defect(DisposalError::NotOpened { kind: self.kind }))
            }
            HelperState::Closed => return Err(self.defect(DisposalError::Closed { kind: self.kind })),
        };
        for CacheEvent::ContentRemoved { handles, .. } in events.try_iter() {
            for handle in handles {
                if handle.kind != self.kind || self.disposed.contains(&handle.id) {
                    continue;
                }
                if self.queued_ids.insert(handle.id) {
                    self.queued.push(handle);
                }
            }
        }
        Ok(())
    }

    /// Destroys every queued handle. Returns how many were freed.
    ///
    /// Must be called on the render thread after the frame is drawn.
    pub fn clean_oncard_memory(&mut self, device: &dyn GraphicsDevice) -> Result<usize, DisposalError> {
        self.collect()?;
        let mut freed = 0;
        self.queued_ids.clear();
        for handle in std::mem::take(&mut self.queued) {
            if !self.disposed.insert(handle.id) {
                continue;
            }
            self.disposed_total += 1;
            match device.destroy(&handle) {
                Ok(()) => freed += 1,
                Err(e) => log::error!(
                    "DisposalHelper: Failed to destroy {} {:?}: {e}",
                    self.kind,
                    handle.id
                ),
            }
        }
        if freed > 0 {
            log::trace!("DisposalHelper: Freed {freed} {} resources.", self.kind);
        }
        Ok(freed)
    }

    /// Forgets destroyed ids that no live entry of `cache` references.
    ///
    /// Pending removal events are collected first, so a reference dropped
    /// after the last cleanup is never lost. Returns how many ids were
    /// forgotten.
    pub fn prune(&mut self, cache: &RenderDataCache) -> Result<usize, DisposalError> {
        self.collect()?;
        if self.disposed.is_empty() {
            return Ok(0);
        }
        let referenced = cache.referenced_handles(self.kind);
        let before = self.disposed.len();
        self.disposed.retain(|id| referenced.contains(id));
        Ok(before - self.disposed.len())
    }

    /// Closes the helper. Closing twice is a defect.
    pub fn close(&mut self) -> Result<(), DisposalError> {
        match self.state {
            HelperState::Closed => Err(self.defect(DisposalError::Closed { kind: self.kind })),
            _ => {
                if !self.queued.is_empty() {
                    log::warn!(
                        "DisposalHelper: Closing {} helper with {} undisposed resources.",
                        self.kind,
                        self.queued.len()
                    );
                }
                self.state = HelperState::Closed;
                Ok(())
            }
        }
    }
}

/// One [`DisposalHelper`] per resource class.
#[derive(Debug)]
pub struct DisposalHelpers {
    helpers: Vec<DisposalHelper>,
}

impl DisposalHelpers {
    /// Creates unopened helpers for every resource class.
    pub fn new() -> Self {
        Self {
            helpers: ResourceKind::ALL.into_iter().map(DisposalHelper::new).collect(),
        }
    }

    /// The helper of `kind`.
    pub fn helper(&self, kind: ResourceKind) -> Option<&DisposalHelper> {
        self.helpers.iter().find(|helper| helper.kind == kind)
    }

    /// Whether every helper is open.
    pub fn is_open(&self) -> bool {
        self.helpers.iter().all(DisposalHelper::is_open)
    }

    /// Opens every helper on `cache`.
    pub fn open(&mut self, cache: &RenderDataCache) -> Result<(), DisposalError> {
        self.helpers.iter_mut().try_for_each(|helper| helper.open(cache))
    }

    /// Frees every queued resource. Returns the total freed.
    pub fn clean_oncard_memory(&mut self, device: &dyn GraphicsDevice) -> Result<usize, DisposalError> {
        let mut freed = 0;
        for helper in &mut self.helpers {
            freed += helper.clean_oncard_memory(device)?;
        }
        Ok(freed)
    }

    /// Forgets destroyed ids no longer referenced by `cache`.
    pub fn prune(&mut self, cache: &RenderDataCache) -> Result<usize, DisposalError> {
        let mut forgotten = 0;
        for helper in &mut self.helpers {
            forgotten += helper.prune(cache)?;
        }
        Ok(forgotten)
    }

    /// Clears `cache` and frees everything it referenced.
    ///
    /// Used at teardown and after context loss.
    pub fn force_dispose(
        &mut self,
        device: &dyn GraphicsDevice,
        cache: &RenderDataCache,
    ) -> Result<usize, DisposalError> {
        let removed = cache.clear();
        let freed = self.clean_oncard_memory(device)?;
        self.prune(cache)?;
        log::info!("DisposalHelpers: Force-disposed {freed} resources from {removed} cache entries.");
        Ok(freed)
    }

    /// Closes every helper, reporting the first violation.
    pub fn close(&mut self) -> Result<(), DisposalError> {
        let mut first_error = None;
        for helper in &mut self.helpers {
            if let Err(e) = helper.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Handles destroyed across all classes.
    pub fn disposed_count(&self) -> usize {
        self.helpers.iter().map(DisposalHelper::disposed_count).sum()
    }

    /// Destroyed ids remembered across all classes.
    pub fn tracked(&self) -> usize {
        self.helpers.iter().map(DisposalHelper::tracked).sum()
    }
}

impl Default for DisposalHelpers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_core::renderer::TextureDescriptor;
    use carta_data::{Footprint, GeometryKey};
    use carta_infra::HeadlessDevice;

    fn texture(device: &HeadlessDevice) -> ResourceHandle {
        device
            .create_texture(&TextureDescriptor::rgba8("test", 2, 2), &[255; 16])
            .unwrap()
    }

    #[test]
    fn test_use_before_open_is_rejected() {
        let device = HeadlessDevice::new(8, 8);
        let mut helper = DisposalHelper::new(ResourceKind::Texture);
        assert_eq!(
            helper.clean_oncard_memory(&device),
            Err(DisposalError::NotOpened {
                kind: ResourceKind::Texture
            })
        );
    }

    #[test]
    fn test_removed_handles_are_freed_after_cleanup() {
        let device = HeadlessDevice::new(8, 8);
        let cache = RenderDataCache::default();
        let mut helpers = DisposalHelpers::new();
        helpers.open(&cache).unwrap();

        let handle = texture(&device);
        let key = GeometryKey::from_raw_parts(0, 0);
        cache
            .insert(key, 1u32, Footprint::host(4).with_handle(handle))
            .unwrap();
        assert!(cache.remove::<u32>(key));
        assert!(!device.is_destroyed(handle.id));

        assert_eq!(helpers.clean_oncard_memory(&device).unwrap(), 1);
        assert!(device.is_destroyed(handle.id));
        assert_eq!(helpers.clean_oncard_memory(&device).unwrap(), 0);
    }

    #[test]
    fn test_handle_reported_twice_is_destroyed_once() {
        let device = HeadlessDevice::new(8, 8);
        let cache = RenderDataCache::default();
        let mut helpers = DisposalHelpers::new();
        helpers.open(&cache).unwrap();

        let shared = texture(&device);
        let first = GeometryKey::from_raw_parts(0, 0);
        let second = GeometryKey::from_raw_parts(1, 0);
        cache
            .insert(first, 1u32, Footprint::host(4).with_handle(shared))
            .unwrap();
        cache
            .insert(second, 2u32, Footprint::host(4).with_handle(shared))
            .unwrap();
        cache.remove_geometry(first);
        assert_eq!(helpers.clean_oncard_memory(&device).unwrap(), 1);
        // The second entry still references the handle.
        assert_eq!(helpers.prune(&cache).unwrap(), 0);
        assert_eq!(helpers.tracked(), 1);

        cache.remove_geometry(second);
        assert_eq!(helpers.clean_oncard_memory(&device).unwrap(), 0);
        assert_eq!(helpers.prune(&cache).unwrap(), 1);
        assert_eq!(helpers.tracked(), 0);
        assert_eq!(device.counters().destroyed, 1);
        assert_eq!(helpers.disposed_count(), 1);
    }

    #[test]
    fn test_disposed_record_stays_bounded() {
        const CYCLES: usize = 200;
        let device = HeadlessDevice::new(8, 8);
        let cache = RenderDataCache::default();
        let mut helpers = DisposalHelpers::new();
        helpers.open(&cache).unwrap();

        for index in 0..CYCLES as u32 {
            let key = GeometryKey::from_raw_parts(index, 0);
            let handle = texture(&device);
            cache
                .insert(key, index, Footprint::host(4).with_handle(handle))
                .unwrap();
            cache.remove_geometry(key);
            assert_eq!(helpers.clean_oncard_memory(&device).unwrap(), 1);
            helpers.prune(&cache).unwrap();
            assert_eq!(helpers.tracked(), 0);
        }
        assert_eq!(helpers.disposed_count(), CYCLES);
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_duplicate_reports_in_one_cycle_queue_once() {
        let device = HeadlessDevice::new(8, 8);
        let cache = RenderDataCache::default();
        let mut helper = DisposalHelper::new(ResourceKind::Texture);
        helper.open(&cache).unwrap();

        let shared = texture(&device);
        for index in 0..4 {
            cache
                .insert(
                    GeometryKey::from_raw_parts(index, 0),
                    index,
                    Footprint::host(4).with_handle(shared),
                )
                .unwrap();
        }
        cache.clear();
        assert_eq!(helper.queued().unwrap(), 1);
        assert_eq!(helper.clean_oncard_memory(&device).unwrap(), 1);
        assert_eq!(helper.queued().unwrap(), 0);
    }

    #[test]
    fn test_helpers_only_take_their_own_kind() {
        let device = HeadlessDevice::new(8, 8);
        let cache = RenderDataCache::default();
        let mut textures = DisposalHelper::new(ResourceKind::Texture);
        let mut buffers = DisposalHelper::new(ResourceKind::Buffer);
        textures.open(&cache).unwrap();
        buffers.open(&cache).unwrap();

        let tex = texture(&device);
        let buf = device.create_buffer("vertices", &[0; 32]).unwrap();
        cache
            .insert(
                GeometryKey::from_raw_parts(3, 1),
                (),
                Footprint::default().with_handles([tex, buf]),
            )
            .unwrap();
        cache.clear();

        assert_eq!(textures.clean_oncard_memory(&device).unwrap(), 1);
        assert!(device.is_destroyed(tex.id));
        assert!(!device.is_destroyed(buf.id));
        assert_eq!(buffers.clean_oncard_memory(&device).unwrap(), 1);
        assert!(device.is_destroyed(buf.id));
    }

    #[test]
    fn test_force_dispose_frees_everything_cached() {
        let device = HeadlessDevice::new(8, 8);
        let cache = RenderDataCache::default();
        let mut helpers = DisposalHelpers::new();
        helpers.open(&cache).unwrap();
        for index in 0..3 {
            let handle = texture(&device);
            cache
                .insert(
                    GeometryKey::from_raw_parts(index, 0),
                    index,
                    Footprint::host(4).with_handle(handle),
                )
                .unwrap();
        }

        assert_eq!(helpers.force_dispose(&device, &cache).unwrap(), 3);
        assert!(cache.is_empty());
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_double_open_and_double_close_are_defects() {
        let cache = RenderDataCache::default();
        let mut helpers = DisposalHelpers::new();
        helpers.open(&cache).unwrap();
        assert!(helpers.is_open());
        assert!(matches!(
            helpers.open(&cache),
            Err(DisposalError::AlreadyOpen { .. })
        ));

        helpers.close().unwrap();
        assert!(!helpers.is_open());
        assert_eq!(
            helpers.close(),
            Err(DisposalError::Closed {
                kind: ResourceKind::Texture
            })
        );
    }
}
