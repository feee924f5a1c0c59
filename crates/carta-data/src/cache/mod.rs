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

//! The dual-budget LRU render-data cache.
//!
//! The cache stores per-geometry model data computed by renderers, keyed by
//! [`CacheKey`]: the geometry's generation-checked key plus the type of the
//! stored value. Every entry is charged to two independent budgets: the GPU
//! bytes of the device allocations it references and the host bytes of the
//! value itself.
//!
//! The cache never frees device memory. Whenever an entry leaves the cache a
//! [`CacheEvent::ContentRemoved`] is published and the disposal helpers free
//! the referenced handles on the render thread.
//!
//! Reads are safe from any thread: they take the read lock and touch an atomic
//! LRU stamp. Insertions, removals and evictions take the write lock and are
//! confined to the render thread.

mod budget;
mod entry;
mod error;

pub use budget::{BudgetClass, BudgetUsage, CacheBudgets};
pub use entry::{CacheEvent, CacheKey, Footprint, RemovalReason};
pub use error::CacheError;

use crate::keys::GeometryKey;
use budget::BudgetPool;
use carta_core::event::EventBus;
use carta_core::render::ProjectionId;
use carta_core::renderer::{ResourceId, ResourceKind};
use carta_core::telemetry::MemoryPressure;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Counters and budget snapshots of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that found nothing usable.
    pub misses: u64,
    /// Entries removed to satisfy a budget.
    pub evictions: u64,
    /// Entries currently cached.
    pub entries: usize,
    /// GPU budget snapshot.
    pub gpu: BudgetUsage,
    /// Host budget snapshot.
    pub host: BudgetUsage,
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    footprint: Footprint,
    last_used: AtomicU64,
}

struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    by_geometry: HashMap<GeometryKey, Vec<CacheKey>>,
    gpu: BudgetPool,
    host: BudgetPool,
    host_pressure: MemoryPressure,
    evictions: u64,
}

impl CacheState {
    fn pool(&self, class: BudgetClass) -> &BudgetPool {
        match class {
            BudgetClass::Gpu => &self.gpu,
            BudgetClass::Host => &self.host,
        }
    }

    fn pool_mut(&mut self, class: BudgetClass) -> &mut BudgetPool {
        match class {
            BudgetClass::Gpu => &mut self.gpu,
            BudgetClass::Host => &mut self.host,
        }
    }

    fn take(&mut self, key: &CacheKey, reason: RemovalReason) -> Option<CacheEvent> {
        let entry = self.entries.remove(key)?;
        if let Some(keys) = self.by_geometry.get_mut(&key.geometry) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.by_geometry.remove(&key.geometry);
            }
        }
        for class in BudgetClass::ALL {
            let pool = self.pool_mut(class);
            pool.used = pool.used.saturating_sub(entry.footprint.bytes(class));
        }
        if reason == RemovalReason::Evicted {
            self.evictions += 1;
        }
        Some(CacheEvent::ContentRemoved {
            key: *key,
            handles: entry.footprint.handles,
            reason,
        })
    }

    /// Keys charged to `class`, least recently used first.
    fn lru_candidates(&self, class: BudgetClass) -> Vec<CacheKey> {
        let mut candidates: Vec<(u64, CacheKey)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.footprint.bytes(class) > 0)
            .map(|(k, e)| (e.last_used.load(Ordering::Relaxed), *k))
            .collect();
        candidates.sort_by_key(|(stamp, _)| *stamp);
        candidates.into_iter().map(|(_, k)| k).collect()
    }

    /// Evicts LRU entries of `class` until usage is at or below the low-water
    /// mark and `incoming` more bytes fit under the hard maximum.
    fn make_room(&mut self, class: BudgetClass, incoming: u64, removed: &mut Vec<CacheEvent>) {
        if self.pool(class).fits(incoming) {
            return;
        }
        for key in self.lru_candidates(class) {
            let pool = self.pool(class);
            if pool.used <= pool.low_water() && pool.fits(incoming) {
                break;
            }
            if let Some(event) = self.take(&key, RemovalReason::Evicted) {
                log::debug!("RenderDataCache: evicted {key} to make room in the {class} budget.");
                removed.push(event);
            }
        }
    }

    /// Brings every budget whose ceiling shrank back below its maximum.
    fn enforce(&mut self, removed: &mut Vec<CacheEvent>) {
        for class in BudgetClass::ALL {
            if self.pool(class).used > self.pool(class).max() {
                for key in self.lru_candidates(class) {
                    if self.pool(class).used <= self.pool(class).low_water() {
                        break;
                    }
                    if let Some(event) = self.take(&key, RemovalReason::Evicted) {
                        removed.push(event);
                    }
                }
                log::debug!(
                    "RenderDataCache: {class} budget enforced, {} bytes in use.",
                    self.pool(class).used
                );
            }
        }
    }
}

/// A dual-budget LRU cache of render data.
pub struct RenderDataCache {
    state: RwLock<CacheState>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    events: EventBus<CacheEvent>,
}

impl RenderDataCache {
    /// Creates an empty cache with the given ceilings.
    pub fn new(budgets: CacheBudgets) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                by_geometry: HashMap::new(),
                gpu: BudgetPool::new(budgets.gpu_max_bytes, budgets.gpu_low_water_fraction),
                host: BudgetPool::new(budgets.host_max_bytes, budgets.host_low_water_fraction),
                host_pressure: MemoryPressure::Normal,
                evictions: 0,
            }),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            events: EventBus::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn publish(&self, removed: Vec<CacheEvent>) {
        for event in removed {
            self.events.publish(event);
        }
    }

    /// Subscribes to cache notifications.
    pub fn subscribe(&self) -> flume::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Stores `value` as the `T` association of `geometry`.
    ///
    /// An existing value for the same key is replaced. If a budget would exceed
    /// its hard maximum, least-recently-used entries charged to that budget are
    /// evicted first. Removal notifications are published before this returns.
    ///
    /// ## Returns
    /// The shared stored value, or [`CacheError::EntryTooLarge`] when the entry
    /// exceeds an empty budget. A rejected entry's handles are still published
    /// for disposal.
    pub fn insert<T: Any + Send + Sync>(
        &self,
        geometry: GeometryKey,
        value: T,
        footprint: Footprint,
    ) -> Result<Arc<T>, CacheError> {
        let key = CacheKey::of::<T>(geometry);
        let mut removed = Vec::new();

        let result = {
            let mut state = self.write();
            if let Some(event) = state.take(&key, RemovalReason::Replaced) {
                removed.push(event);
            }
            state.enforce(&mut removed);

            let too_large = BudgetClass::ALL
                .into_iter()
                .find(|class| footprint.bytes(*class) > state.pool(*class).max());

            match too_large {
                Some(class) => {
                    let err = CacheError::EntryTooLarge {
                        key,
                        class,
                        bytes: footprint.bytes(class),
                        max: state.pool(class).max(),
                    };
                    log::warn!("RenderDataCache: {err}");
                    removed.push(CacheEvent::ContentRemoved {
                        key,
                        handles: footprint.handles,
                        reason: RemovalReason::Rejected,
                    });
                    Err(err)
                }
                None => {
                    for class in BudgetClass::ALL {
                        state.make_room(class, footprint.bytes(class), &mut removed);
                    }
                    for class in BudgetClass::ALL {
                        state.pool_mut(class).used += footprint.bytes(class);
                    }
                    let value = Arc::new(value);
                    let stored: Arc<dyn Any + Send + Sync> = value.clone();
                    state.entries.insert(
                        key,
                        Entry {
                            value: stored,
                            footprint,
                            last_used: AtomicU64::new(self.tick()),
                        },
                    );
                    state.by_geometry.entry(geometry).or_default().push(key);
                    Ok(value)
                }
            }
        };

        self.publish(removed);
        result
    }

    /// Looks up the `T` association of `geometry`.
    ///
    /// An entry bound to a projection other than `projection` is a miss. Entries
    /// that do not depend on a projection match any query.
    pub fn get_cache_association<T: Any + Send + Sync>(
        &self,
        geometry: GeometryKey,
        projection: Option<ProjectionId>,
    ) -> Option<Arc<T>> {
        let key = CacheKey::of::<T>(geometry);
        let state = self.read();
        let found = state.entries.get(&key).filter(|entry| match entry.footprint.projection {
            Some(bound) => projection == Some(bound),
            None => true,
        });
        match found.and_then(|entry| {
            entry.last_used.store(self.tick(), Ordering::Relaxed);
            Arc::clone(&entry.value).downcast::<T>().ok()
        }) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Returns `true` if a `T` association exists for `geometry`, whatever its projection.
    pub fn contains<T: Any + Send + Sync>(&self, geometry: GeometryKey) -> bool {
        self.read().entries.contains_key(&CacheKey::of::<T>(geometry))
    }

    /// Removes the `T` association of `geometry`.
    pub fn remove<T: Any + Send + Sync>(&self, geometry: GeometryKey) -> bool {
        let event = self
            .write()
            .take(&CacheKey::of::<T>(geometry), RemovalReason::Removed);
        let found = event.is_some();
        self.publish(event.into_iter().collect());
        found
    }

    /// Removes every association of `geometry`.
    ///
    /// ## Returns
    /// The number of entries removed.
    pub fn remove_geometry(&self, geometry: GeometryKey) -> usize {
        let removed: Vec<CacheEvent> = {
            let mut state = self.write();
            let keys = state.by_geometry.get(&geometry).cloned().unwrap_or_default();
            keys.iter()
                .filter_map(|key| state.take(key, RemovalReason::Removed))
                .collect()
        };
        let count = removed.len();
        self.publish(removed);
        count
    }

    /// Removes everything, publishing a removal for every entry.
    pub fn clear(&self) -> usize {
        let removed: Vec<CacheEvent> = {
            let mut state = self.write();
            let keys: Vec<CacheKey> = state.entries.keys().copied().collect();
            keys.iter()
                .filter_map(|key| state.take(key, RemovalReason::Cleared))
                .collect()
        };
        let count = removed.len();
        if count > 0 {
            log::debug!("RenderDataCache: cleared {count} entries.");
        }
        self.publish(removed);
        count
    }

    /// Evicts down to the low-water mark any budget whose usage exceeds its maximum.
    pub fn enforce_budgets(&self) -> usize {
        let mut removed = Vec::new();
        self.write().enforce(&mut removed);
        let count = removed.len();
        self.publish(removed);
        count
    }

    /// Adjusts a budget ceiling. Eviction is deferred to the next `insert` or
    /// `enforce_budgets` call.
    pub fn set_budget(
        &self,
        class: BudgetClass,
        max_bytes: u64,
        low_water_fraction: f64,
    ) -> Result<(), CacheError> {
        if !(low_water_fraction > 0.0 && low_water_fraction <= 1.0) {
            return Err(CacheError::InvalidLowWater {
                class,
                fraction: low_water_fraction,
            });
        }
        self.write()
            .pool_mut(class)
            .reconfigure(max_bytes, low_water_fraction);
        log::info!("RenderDataCache: {class} budget set to {max_bytes} bytes (low water {low_water_fraction}).");
        Ok(())
    }

    /// Scales the host ceiling to the given pressure level.
    ///
    /// ## Returns
    /// `true` if the level changed.
    pub fn apply_memory_pressure(&self, pressure: MemoryPressure) -> bool {
        let mut state = self.write();
        if state.host_pressure == pressure {
            return false;
        }
        state.host_pressure = pressure;
        state.host.set_scale(pressure.budget_scale());
        log::info!(
            "RenderDataCache: host memory pressure {pressure:?}, host budget now {} bytes.",
            state.host.max()
        );
        true
    }

    /// Snapshot of one budget.
    pub fn usage(&self, class: BudgetClass) -> BudgetUsage {
        self.read().pool(class).usage()
    }

    /// Counters and budget snapshots.
    pub fn stats(&self) -> CacheStats {
        let state = self.read();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: state.evictions,
            entries: state.entries.len(),
            gpu: state.gpu.usage(),
            host: state.host.usage(),
        }
    }

    /// Ids of the `kind` handles referenced by live entries.
    pub fn referenced_handles(&self, kind: ResourceKind) -> HashSet<ResourceId> {
        self.read()
            .entries
            .values()
            .flat_map(|entry| &entry.footprint.handles)
            .filter(|handle| handle.kind == kind)
            .map(|handle| handle.id)
            .collect()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RenderDataCache {
    fn default() -> Self {
        Self::new(CacheBudgets::default())
    }
}

impl std::fmt::Debug for RenderDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDataCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_core::renderer::{ResourceHandle, ResourceId, ResourceKind};
    use flume::TryRecvError;

    const ITEM_BYTES: u64 = 100;

    #[derive(Debug, PartialEq)]
    struct Model(u32);

    #[derive(Debug, PartialEq)]
    struct Other;

    fn handle(id: u64) -> ResourceHandle {
        ResourceHandle::new(ResourceId(id), ResourceKind::Texture, ITEM_BYTES)
    }

    fn key(i: u32) -> GeometryKey {
        GeometryKey::from_raw_parts(i, 0)
    }

    fn gpu_cache(items: u64, low_water: f64) -> RenderDataCache {
        RenderDataCache::new(CacheBudgets {
            gpu_max_bytes: items * ITEM_BYTES,
            gpu_low_water_fraction: low_water,
            host_max_bytes: u64::MAX / 2,
            host_low_water_fraction: 0.75,
        })
    }

    fn drain(rx: &flume::Receiver<CacheEvent>) -> Vec<CacheEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_insert_and_get() {
        let cache = RenderDataCache::default();
        cache.insert(key(0), Model(7), Footprint::host(16)).unwrap();
        let value = cache.get_cache_association::<Model>(key(0), None).unwrap();
        assert_eq!(*value, Model(7));
        assert!(cache.get_cache_association::<Other>(key(0), None).is_none());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.host.used, 16);
    }

    #[test]
    fn test_projection_mismatch_is_a_miss() {
        let cache = RenderDataCache::default();
        let p1 = ProjectionId(1);
        let p2 = ProjectionId(2);
        cache
            .insert(key(0), Model(1), Footprint::host(8).bound_to(p1))
            .unwrap();
        assert!(cache.get_cache_association::<Model>(key(0), Some(p1)).is_some());
        assert!(cache.get_cache_association::<Model>(key(0), Some(p2)).is_none());
        assert!(cache.get_cache_association::<Model>(key(0), None).is_none());
    }

    #[test]
    fn test_projection_independent_entry_matches_any_projection() {
        let cache = RenderDataCache::default();
        cache.insert(key(0), Model(1), Footprint::host(8)).unwrap();
        assert!(cache
            .get_cache_association::<Model>(key(0), Some(ProjectionId(42)))
            .is_some());
    }

    #[test]
    fn test_twelve_insertions_evict_two_lru_entries() {
        let cache = gpu_cache(10, 0.9);
        let rx = cache.subscribe();

        for i in 0..10u32 {
            cache
                .insert(key(i), Model(i), Footprint::host(1).with_handle(handle(i as u64)))
                .unwrap();
        }
        assert!(drain(&rx).is_empty());

        cache
            .insert(key(10), Model(10), Footprint::host(1).with_handle(handle(10)))
            .unwrap();
        let first = drain(&rx);
        assert_eq!(first.len(), 1);

        cache
            .insert(key(11), Model(11), Footprint::host(1).with_handle(handle(11)))
            .unwrap();
        let second = drain(&rx);
        assert_eq!(second.len(), 1);

        let evicted: Vec<GeometryKey> = first
            .iter()
            .chain(second.iter())
            .map(|CacheEvent::ContentRemoved { key, reason, .. }| {
                assert_eq!(*reason, RemovalReason::Evicted);
                key.geometry
            })
            .collect();
        assert_eq!(evicted, vec![key(0), key(1)]);
        assert_eq!(cache.stats().evictions, 2);
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_read_refreshes_lru_order() {
        let cache = gpu_cache(3, 0.9);
        let rx = cache.subscribe();
        for i in 0..3u32 {
            cache
                .insert(key(i), Model(i), Footprint::default().with_handle(handle(i as u64)))
                .unwrap();
        }
        cache.get_cache_association::<Model>(key(0), None).unwrap();
        cache
            .insert(key(3), Model(3), Footprint::default().with_handle(handle(3)))
            .unwrap();

        let events = drain(&rx);
        assert!(events
            .iter()
            .all(|CacheEvent::ContentRemoved { key: k, .. }| k.geometry != key(0)));
        assert!(cache.contains::<Model>(key(0)));
    }

    #[test]
    fn test_budget_never_exceeded() {
        let cache = gpu_cache(5, 0.7);
        for i in 0..50u32 {
            let size = (i as u64 % 3 + 1) * ITEM_BYTES / 2;
            let h = ResourceHandle::new(ResourceId(i as u64), ResourceKind::Buffer, size);
            cache
                .insert(key(i), Model(i), Footprint::default().with_handle(h))
                .unwrap();
            let usage = cache.usage(BudgetClass::Gpu);
            assert!(usage.used <= usage.max, "{usage:?}");
        }
    }

    #[test]
    fn test_entry_too_large_is_rejected_and_published() {
        let cache = gpu_cache(1, 0.9);
        let rx = cache.subscribe();
        let big = ResourceHandle::new(ResourceId(1), ResourceKind::Texture, ITEM_BYTES * 2);
        let err = cache
            .insert(key(0), Model(0), Footprint::default().with_handle(big))
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::EntryTooLarge {
                class: BudgetClass::Gpu,
                ..
            }
        ));
        let events = drain(&rx);
        assert_eq!(
            events,
            vec![CacheEvent::ContentRemoved {
                key: CacheKey::of::<Model>(key(0)),
                handles: vec![big],
                reason: RemovalReason::Rejected,
            }]
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_replacement_publishes_old_handles() {
        let cache = RenderDataCache::default();
        let rx = cache.subscribe();
        cache
            .insert(key(0), Model(0), Footprint::default().with_handle(handle(1)))
            .unwrap();
        cache
            .insert(key(0), Model(1), Footprint::default().with_handle(handle(2)))
            .unwrap();
        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        let CacheEvent::ContentRemoved {
            handles, reason, ..
        } = &events[0];
        assert_eq!(handles, &vec![handle(1)]);
        assert_eq!(*reason, RemovalReason::Replaced);
        assert_eq!(cache.usage(BudgetClass::Gpu).used, ITEM_BYTES);
    }

    #[test]
    fn test_referenced_handles_follow_live_entries() {
        let cache = RenderDataCache::default();
        let buffer = ResourceHandle::new(ResourceId(9), ResourceKind::Buffer, 16);
        cache
            .insert(key(0), Model(0), Footprint::default().with_handles([handle(1), buffer]))
            .unwrap();
        cache
            .insert(key(1), Model(1), Footprint::default().with_handle(handle(1)))
            .unwrap();

        let textures = cache.referenced_handles(ResourceKind::Texture);
        assert_eq!(textures, HashSet::from([ResourceId(1)]));
        assert_eq!(
            cache.referenced_handles(ResourceKind::Buffer),
            HashSet::from([ResourceId(9)])
        );

        cache.remove_geometry(key(0));
        assert!(cache.referenced_handles(ResourceKind::Buffer).is_empty());
        assert_eq!(cache.referenced_handles(ResourceKind::Texture).len(), 1);
        cache.remove_geometry(key(1));
        assert!(cache.referenced_handles(ResourceKind::Texture).is_empty());
    }

    #[test]
    fn test_remove_geometry_drops_every_association() {
        let cache = RenderDataCache::default();
        cache.insert(key(0), Model(0), Footprint::host(4)).unwrap();
        cache.insert(key(0), Other, Footprint::host(4)).unwrap();
        cache.insert(key(1), Model(1), Footprint::host(4)).unwrap();

        assert_eq!(cache.remove_geometry(key(0)), 2);
        assert_eq!(cache.remove_geometry(key(0)), 0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.usage(BudgetClass::Host).used, 4);
        assert!(!cache.remove::<Model>(key(0)));
        assert!(cache.remove::<Model>(key(1)));
    }

    #[test]
    fn test_set_budget_defers_eviction() {
        let cache = gpu_cache(10, 0.9);
        let rx = cache.subscribe();
        for i in 0..10u32 {
            cache
                .insert(key(i), Model(i), Footprint::default().with_handle(handle(i as u64)))
                .unwrap();
        }
        cache
            .set_budget(BudgetClass::Gpu, 5 * ITEM_BYTES, 0.8)
            .unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(cache.enforce_budgets(), 6);
        assert_eq!(cache.usage(BudgetClass::Gpu).used, 4 * ITEM_BYTES);
        assert_eq!(drain(&rx).len(), 6);
    }

    #[test]
    fn test_invalid_low_water_is_rejected() {
        let cache = RenderDataCache::default();
        assert!(cache.set_budget(BudgetClass::Host, 10, 0.0).is_err());
        assert!(cache.set_budget(BudgetClass::Host, 10, 1.5).is_err());
    }

    #[test]
    fn test_memory_pressure_scales_host_budget() {
        let cache = RenderDataCache::new(CacheBudgets {
            host_max_bytes: 1000,
            host_low_water_fraction: 0.5,
            ..CacheBudgets::default()
        });
        for i in 0..8u32 {
            cache.insert(key(i), Model(i), Footprint::host(100)).unwrap();
        }
        assert!(cache.apply_memory_pressure(MemoryPressure::Critical));
        assert!(!cache.apply_memory_pressure(MemoryPressure::Critical));
        assert_eq!(cache.usage(BudgetClass::Host).max, 250);

        cache.enforce_budgets();
        let usage = cache.usage(BudgetClass::Host);
        assert!(usage.used <= usage.low_water, "{usage:?}");

        cache.apply_memory_pressure(MemoryPressure::Normal);
        assert_eq!(cache.usage(BudgetClass::Host).max, 1000);
    }

    #[test]
    fn test_clear_publishes_everything() {
        let cache = RenderDataCache::default();
        let rx = cache.subscribe();
        for i in 0..4u32 {
            cache
                .insert(key(i), Model(i), Footprint::host(1).with_handle(handle(i as u64)))
                .unwrap();
        }
        assert_eq!(cache.clear(), 4);
        let events = drain(&rx);
        assert_eq!(events.len(), 4);
        assert!(events
            .iter()
            .all(|CacheEvent::ContentRemoved { reason, .. }| *reason == RemovalReason::Cleared));
        assert_eq!(cache.stats().gpu.used, 0);
    }
}
