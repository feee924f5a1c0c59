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

use crossbeam_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

type Job = Box<dyn FnOnce() + Send>;

/// A single worker thread for device-free tasks.
#[derive(Debug)]
pub struct BackgroundExecutor {
    sender: Option<Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
    completed: Arc<AtomicUsize>,
}

impl BackgroundExecutor {
    /// Spawns the worker thread.
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (sender, receiver): (Sender<Job>, Receiver<Job>) = crossbeam_channel::unbounded();
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completed);
        let thread_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            log::debug!("BackgroundExecutor: '{thread_name}' started.");
            for job in receiver {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_default();
                    log::error!("BackgroundExecutor: Task panicked on '{thread_name}': {message}");
                }
                counter.fetch_add(1, Ordering::Release);
            }
            log::debug!("BackgroundExecutor: '{thread_name}' stopped.");
        })?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            completed,
        })
    }

    /// Queues `job`. Returns `false` once the executor is shut down.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Jobs finished so far, panicked ones included.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// Runs the remaining jobs and joins the worker.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("BackgroundExecutor: Worker thread panicked.");
            }
        }
    }
}

impl Drop for BackgroundExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
