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

//! Deadline-based time budgets.
//!
//! A [`TimeBudget`] is the only cancellation mechanism of the frame: long-running
//! work checks it between units and stops early once it has expired.

use std::time::{Duration, Instant};

/// A deadline for a unit of frame work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    deadline: Option<Instant>,
}

impl TimeBudget {
    /// Creates a budget expiring `duration` from now.
    pub fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(duration),
        }
    }

    /// A budget that never expires.
    pub fn unlimited() -> Self {
        Self { deadline: None }
    }

    /// A budget that has already expired.
    pub fn expired() -> Self {
        Self {
            deadline: Some(Instant::now()),
        }
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left, `Duration::MAX` when unlimited.
    pub fn remaining(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Carves a child budget of at most `duration` that never outlives `self`.
    pub fn sub_budget(&self, duration: Duration) -> TimeBudget {
        let child = Instant::now().checked_add(duration);
        let deadline = match (self.deadline, child) {
            (Some(parent), Some(child)) => Some(parent.min(child)),
            (Some(parent), None) => Some(parent),
            (None, child) => child,
        };
        Self { deadline }
    }
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
