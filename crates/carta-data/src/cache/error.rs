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

use super::{BudgetClass, CacheKey};
use thiserror::Error;

/// Errors returned by the render-data cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// The entry cannot fit even in an empty budget.
    #[error("entry {key} needs {bytes} {class} bytes but the {class} budget is {max} bytes")]
    EntryTooLarge {
        /// The rejected key.
        key: CacheKey,
        /// The budget that cannot hold it.
        class: BudgetClass,
        /// The entry's cost in that budget.
        bytes: u64,
        /// The budget's hard maximum.
        max: u64,
    },
    /// A budget was configured with an out-of-range low-water fraction.
    #[error("invalid {class} low-water fraction {fraction}, expected a value in (0, 1]")]
    InvalidLowWater {
        /// The budget being configured.
        class: BudgetClass,
        /// The rejected fraction.
        fraction: f64,
    },
}
