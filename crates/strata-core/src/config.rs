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

//! Engine-wide configuration constants and the job system configuration.

use crate::error::ConfigError;
use serde::Deserialize;

/// Upper bound on worker threads when the configuration does not specify one.
pub const DEFAULT_MAX_WORKER_THREADS: u32 = 32;

/// Capacity of the per-frame input event record.
pub const MAX_INPUT_EVENTS: usize = 256;

/// Configuration for the [`WorkerPool`](crate::job::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobSystemConfig {
    /// Requested number of worker threads.
    /// `0` selects `max(available_parallelism - 1, 1)`, leaving the main thread free.
    pub worker_threads: u32,
    /// Hard ceiling applied after the automatic selection.
    pub max_worker_threads: u32,
    /// When `false`, no worker is started and every job runs inline on the caller.
    pub enable_smp: bool,
}

impl Default for JobSystemConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            max_worker_threads: DEFAULT_MAX_WORKER_THREADS,
            enable_smp: true,
        }
    }
}

impl JobSystemConfig {
    /// A configuration that never starts worker threads.
    pub fn single_threaded() -> Self {
        Self {
            enable_smp: false,
            ..Default::default()
        }
    }

    /// A configuration requesting exactly `count` workers (still clamped by the ceiling).
    pub fn with_workers(count: u32) -> Self {
        Self {
            worker_threads: count,
            ..Default::default()
        }
    }

    /// Checks that the configuration can be honoured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enable_smp && self.max_worker_threads == 0 {
            return Err(ConfigError::invalid(
                "jobs.max_worker_threads",
                "must be at least 1 when SMP is enabled",
            ));
        }
        Ok(())
    }

    /// Resolves the number of workers to start, given the host's parallelism.
    pub fn resolve_worker_count(&self, available_parallelism: u32) -> u32 {
        if !self.enable_smp {
            return 0;
        }
        let requested = if self.worker_threads == 0 {
            available_parallelism.saturating_sub(1).max(1)
        } else {
            self.worker_threads
        };
        requested.min(self.max_worker_threads)
    }
}
