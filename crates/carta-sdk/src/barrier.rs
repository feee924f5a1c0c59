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

//! The initialisation barrier between the render thread and its callers.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Progress of the one-time pipeline initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// No frame has run yet.
    Uninitialized,
    /// The first frame is initialising the pipeline.
    Initializing,
    /// Initialisation completed; waiters are released.
    Ready,
    /// Initialisation faulted; waiters are released empty-handed.
    Failed,
}

/// What the caller of [`InitBarrier::begin`] must do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// The caller won the race and must initialise, then call `complete` or `fail`.
    Initialize,
    /// Initialisation is in progress elsewhere.
    Busy,
    /// Initialisation already completed.
    Ready,
    /// Initialisation failed earlier.
    Failed,
}

/// Three-phase barrier on a mutex and condition variable.
#[derive(Debug)]
pub struct InitBarrier {
    state: Mutex<InitState>,
    changed: Condvar,
}

impl InitBarrier {
    /// Creates a closed barrier.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InitState::Uninitialized),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    pub fn state(&self) -> InitState {
        *self.lock()
    }

    /// Moves `Uninitialized` to `Initializing` for exactly one caller.
    pub fn begin(&self) -> Begin {
        let mut state = self.lock();
        match *state {
            InitState::Uninitialized => {
                *state = InitState::Initializing;
                Begin::Initialize
            }
            InitState::Initializing => Begin::Busy,
            InitState::Ready => Begin::Ready,
            InitState::Failed => Begin::Failed,
        }
    }

    /// Opens the barrier and wakes every waiter.
    pub fn complete(&self) {
        self.settle(InitState::Ready);
    }

    /// Releases every waiter without opening the barrier.
    pub fn fail(&self) {
        self.settle(InitState::Failed);
    }

    fn settle(&self, outcome: InitState) {
        let mut state = self.lock();
        if matches!(*state, InitState::Ready | InitState::Failed) {
            return;
        }
        *state = outcome;
        self.changed.notify_all();
    }

    /// Blocks until initialisation settles. Returns `true` if it succeeded.
    pub fn wait(&self) -> bool {
        let state = self
            .changed
            .wait_while(self.lock(), |state| {
                matches!(*state, InitState::Uninitialized | InitState::Initializing)
            })
            .unwrap_or_else(PoisonError::into_inner);
        *state == InitState::Ready
    }

    /// Like [`wait`](Self::wait) with a deadline. Returns `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            match *state {
                InitState::Ready => return true,
                InitState::Failed => return false,
                _ => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

impl Default for InitBarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_only_one_caller_initializes() {
        let barrier = InitBarrier::new();
        assert_eq!(barrier.begin(), Begin::Initialize);
        assert_eq!(barrier.begin(), Begin::Busy);
        barrier.complete();
        assert_eq!(barrier.begin(), Begin::Ready);
        assert_eq!(barrier.state(), InitState::Ready);
    }

    #[test]
    fn test_waiters_wake_on_complete() {
        let barrier = Arc::new(InitBarrier::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || barrier.wait())
            })
            .collect();

        assert_eq!(barrier.begin(), Begin::Initialize);
        thread::sleep(Duration::from_millis(20));
        barrier.complete();
        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[test]
    fn test_wait_timeout_expires_while_closed() {
        let barrier = InitBarrier::new();
        assert!(!barrier.wait_timeout(Duration::from_millis(10)));
        barrier.begin();
        barrier.fail();
        assert!(!barrier.wait_timeout(Duration::from_secs(5)));
        assert!(!barrier.wait());
    }

    #[test]
    fn test_settled_barrier_stays_settled() {
        let barrier = InitBarrier::new();
        barrier.begin();
        barrier.complete();
        barrier.fail();
        assert_eq!(barrier.state(), InitState::Ready);
    }
}
