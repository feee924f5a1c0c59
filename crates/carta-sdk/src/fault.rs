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

//! What happens after a context-level rendering fault.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Details of a fatal fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    /// The error or panic message.
    pub message: String,
    /// Frames rendered before the fault.
    pub frames_rendered: u64,
}

/// The reaction to a fatal fault. The driver refuses every later frame
/// whatever the policy.
#[derive(Clone)]
pub enum FaultPolicy {
    /// Exit the process with status 1 after `delay`, leaving time for logs
    /// and the fault notification to flush.
    TerminateProcess {
        /// Grace period before exiting.
        delay: Duration,
    },
    /// Hand the report to the embedding application.
    Callback(Arc<dyn Fn(&FaultReport) + Send + Sync>),
    /// Only log the fault.
    LogOnly,
}

impl FaultPolicy {
    /// Invokes the policy for `report`.
    pub fn invoke(&self, report: &FaultReport) {
        match self {
            FaultPolicy::TerminateProcess { delay } => {
                log::error!(
                    "FaultPolicy: Terminating in {} ms after a fatal rendering fault.",
                    delay.as_millis()
                );
                let delay = *delay;
                let spawned = thread::Builder::new()
                    .name("carta-fatal-exit".to_string())
                    .spawn(move || {
                        thread::sleep(delay);
                        std::process::exit(1);
                    });
                if let Err(e) = spawned {
                    log::error!("FaultPolicy: Could not schedule termination ({e}), exiting now.");
                    std::process::exit(1);
                }
            }
            FaultPolicy::Callback(callback) => callback(report),
            FaultPolicy::LogOnly => {
                log::error!("FaultPolicy: Rendering stopped: {}", report.message);
            }
        }
    }
}

impl Default for FaultPolicy {
    fn default() -> Self {
        FaultPolicy::TerminateProcess {
            delay: Duration::from_millis(2000),
        }
    }
}

impl fmt::Debug for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPolicy::TerminateProcess { delay } => f
                .debug_struct("TerminateProcess")
                .field("delay", delay)
                .finish(),
            FaultPolicy::Callback(_) => f.write_str("Callback"),
            FaultPolicy::LogOnly => f.write_str("LogOnly"),
        }
    }
}
