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

//! Work deferred to the render thread.
//!
//! Any thread may submit a task; only the render thread drains the queue, at
//! the start of each frame and within a share of the frame budget.

mod executor;
mod load_sensitive;

pub use executor::BackgroundExecutor;
pub use load_sensitive::{LoadSensitiveTaskQueue, TaskRoute};

use crate::pacing::RepaintCoalescer;
use carta_core::render::TimeBudget;
use carta_core::renderer::GraphicsDevice;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A unit of work run on the render thread with the device.
pub type RenderTask = Box<dyn FnOnce(&dyn GraphicsDevice) + Send>;

/// A thread-safe FIFO of render-thread tasks.
#[derive(Default)]
pub struct RenderTaskQueue {
    tasks: Mutex<VecDeque<RenderTask>>,
    repaint: Option<Arc<RepaintCoalescer>>,
}

impl RenderTaskQueue {
    /// Creates a queue that does not request repaints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue that requests a repaint on every submission, so it
    /// drains even when frames are rendered on demand.
    pub fn with_repaint(repaint: Arc<RepaintCoalescer>) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            repaint: Some(repaint),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, VecDeque<RenderTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `task`. Safe from any thread.
    pub fn submit(&self, task: impl FnOnce(&dyn GraphicsDevice) + Send + 'static) {
        self.tasks().push_back(Box::new(task));
        if let Some(repaint) = &self.repaint {
            repaint.request_repaint();
        }
    }

    /// Runs queued tasks in order until `budget` expires or the queue is empty.
    ///
    /// The budget is checked before each task, so this returns within the
    /// budget plus the duration of one task. Remaining tasks carry over.
    /// Must only be called on the render thread.
    pub fn drain(&self, device: &dyn GraphicsDevice, budget: &TimeBudget) -> usize {
        let mut ran = 0;
        while !budget.is_expired() {
            // The lock is released before the task runs, so tasks may submit more work.
            let Some(task) = self.tasks().pop_front() else {
                break;
            };
            task(device);
            ran += 1;
        }
        let left = self.len();
        if left > 0 {
            log::debug!("RenderTaskQueue: Budget expired after {ran} tasks, {left} carried over.");
        }
        ran
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RenderTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTaskQueue")
            .field("queued", &self.len())
            .finish()
    }
}
