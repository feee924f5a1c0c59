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

//! Budget pools of the render-data cache.

use std::fmt;

/// The memory class an entry is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BudgetClass {
    /// Device-resident bytes, referenced through resource handles.
    Gpu,
    /// Host-resident bytes of computed model data.
    Host,
}

impl BudgetClass {
    /// Both classes.
    pub const ALL: [BudgetClass; 2] = [BudgetClass::Gpu, BudgetClass::Host];
}

impl fmt::Display for BudgetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetClass::Gpu => f.write_str("gpu"),
            BudgetClass::Host => f.write_str("host"),
        }
    }
}

/// A snapshot of one budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudgetUsage {
    /// Bytes currently charged.
    pub used: u64,
    /// Effective hard maximum.
    pub max: u64,
    /// Level eviction brings usage down to.
    pub low_water: u64,
}

/// Initial ceilings of a cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheBudgets {
    /// GPU hard maximum in bytes.
    pub gpu_max_bytes: u64,
    /// GPU low-water mark as a share of its maximum.
    pub gpu_low_water_fraction: f64,
    /// Host hard maximum in bytes.
    pub host_max_bytes: u64,
    /// Host low-water mark as a share of its maximum.
    pub host_low_water_fraction: f64,
}

impl Default for CacheBudgets {
    fn default() -> Self {
        Self {
            gpu_max_bytes: 256 * 1024 * 1024,
            gpu_low_water_fraction: 0.9,
            host_max_bytes: 512 * 1024 * 1024,
            host_low_water_fraction: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BudgetPool {
    configured_max: u64,
    low_water_fraction: f64,
    scale: f64,
    pub(crate) used: u64,
}

impl BudgetPool {
    pub(crate) fn new(max: u64, low_water_fraction: f64) -> Self {
        Self {
            configured_max: max,
            low_water_fraction,
            scale: 1.0,
            used: 0,
        }
    }

    pub(crate) fn max(&self) -> u64 {
        (self.configured_max as f64 * self.scale).round() as u64
    }

    pub(crate) fn low_water(&self) -> u64 {
        (self.max() as f64 * self.low_water_fraction).round() as u64
    }

    pub(crate) fn reconfigure(&mut self, max: u64, low_water_fraction: f64) {
        self.configured_max = max;
        self.low_water_fraction = low_water_fraction;
    }

    pub(crate) fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub(crate) fn fits(&self, bytes: u64) -> bool {
        self.used.saturating_add(bytes) <= self.max()
    }

    pub(crate) fn usage(&self) -> BudgetUsage {
        BudgetUsage {
            used: self.used,
            max: self.max(),
            low_water: self.low_water(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_water_is_rounded() {
        let pool = BudgetPool::new(1000, 0.9);
        assert_eq!(pool.low_water(), 900);
        assert_eq!(pool.max(), 1000);
    }

    #[test]
    fn test_scale_shrinks_both_marks() {
        let mut pool = BudgetPool::new(1000, 0.75);
        pool.set_scale(0.5);
        assert_eq!(pool.max(), 500);
        assert_eq!(pool.low_water(), 375);
    }
}
