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

use super::{BackgroundExecutor, RenderTaskQueue};
use carta_core::renderer::GraphicsDevice;
use std::sync::Arc;

/// Where a device-free task was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRoute {
    /// Queued for the render thread.
    RenderThread,
    /// Handed to the background executor.
    Background,
}

/// Routes device-free work away from a congested render-thread queue.
#[derive(Debug)]
pub struct LoadSensitiveTaskQueue {
    queue: Arc<RenderTaskQueue>,
    executor: BackgroundExecutor,
    threshold: usize,
}

impl LoadSensitiveTaskQueue {
    /// Wraps `queue`; device-free work goes to the background once more than
    /// `threshold` tasks are queued.
    pub fn new(queue: Arc<RenderTaskQueue>, threshold: usize) -> std::io::Result<Self> {
        Ok(Self {
            queue,
            executor: BackgroundExecutor::new("carta-background")?,
            threshold,
        })
    }

    /// The wrapped render-thread queue.
    pub fn queue(&self) -> &Arc<RenderTaskQueue> {
        &self.queue
    }

    /// Enqueues a task that needs the device.
    pub fn submit_render(&self, task: impl FnOnce(&dyn GraphicsDevice) + Send + 'static) {
        self.queue.submit(task);
    }

    /// Enqueues a task that does not touch the device.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> TaskRoute {
        let depth = self.queue.len();
        if depth > self.threshold {
            log::trace!("LoadSensitiveTaskQueue: Depth {depth}, running task in background.");
            if !self.executor.execute(task) {
                log::warn!("LoadSensitiveTaskQueue: Background executor is stopped, task dropped.");
            }
            return TaskRoute::Background;
        }
        self.queue.submit(move |_| task());
        TaskRoute::RenderThread
    }

    /// Stops the background executor after its pending jobs.
    pub fn shutdown(&mut self) {
        self.executor.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_core::render::TimeBudget;
    use carta_infra::HeadlessDevice;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_routes_by_queue_depth() {
        let queue = Arc::new(RenderTaskQueue::new());
        let mut tasks = LoadSensitiveTaskQueue::new(Arc::clone(&queue), 2).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let mut routes = Vec::new();
        for _ in 0..4 {
            let ran = Arc::clone(&ran);
            routes.push(tasks.submit(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(
            routes,
            vec![
                TaskRoute::RenderThread,
                TaskRoute::RenderThread,
                TaskRoute::RenderThread,
                TaskRoute::Background
            ]
        );
        assert_eq!(queue.len(), 3);

        tasks.shutdown();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        let device = HeadlessDevice::new(4, 4);
        assert_eq!(queue.drain(&device, &TimeBudget::unlimited()), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 4);
    }
}
