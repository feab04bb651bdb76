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

//! # Job System
//!
//! A fixed pool of worker threads fed by two priority lanes, plus a scoped
//! fork-join helper on top of it.
//!
//! ## Architecture
//!
//! 1. **[`JobSystem`]**: the object-safe contract every scheduler implements.
//!    The run loop owns exactly one instance and lends it out by reference.
//! 2. **[`WorkerPool`]**: the default implementation. Engine-lane jobs are always
//!    drained ahead of User-lane jobs; each lane is FIFO.
//! 3. **[`TaskGroup`]**: a scoped section that submits closures borrowing the
//!    caller's stack and waits for exactly those closures.
//!
//! A pool with zero workers is a supported mode, not an error: every job then
//! runs inline on the submitting thread, and all observable results match the
//! parallel path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use strata_core::job::{JobLane, TaskGroup, WorkerPool};
//! use strata_core::JobSystemConfig;
//!
//! let pool = WorkerPool::new(&JobSystemConfig::default());
//! let mut partial = [0u64; 4];
//! TaskGroup::scope(&pool, JobLane::User, |group| {
//!     for (i, slot) in partial.iter_mut().enumerate() {
//!         group.run(move || *slot = (i as u64) * 10);
//!     }
//! });
//! assert_eq!(partial, [0, 10, 20, 30]);
//! ```

mod pool;
mod task_group;

pub use pool::WorkerPool;
pub use task_group::{TaskGroup, TaskValue};

use std::fmt;

/// Priority class of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobLane {
    /// Work the engine schedules itself (rasterization, phase barriers).
    /// Latency critical, always serviced first.
    #[default]
    Engine,
    /// Work submitted explicitly by application code.
    User,
}

impl fmt::Display for JobLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobLane::Engine => write!(f, "Engine"),
            JobLane::User => write!(f, "User"),
        }
    }
}

/// A unit of work. Jobs must not panic: a panicking job is a fatal programming error.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A scheduler that executes [`Job`]s, possibly on other threads.
pub trait JobSystem: Send + Sync {
    /// Number of live worker threads. `0` means every job runs inline on the caller.
    fn worker_count(&self) -> usize;

    /// Submits `job` on `lane`.
    ///
    /// With no workers the job runs immediately on the calling thread.
    fn enqueue(&self, lane: JobLane, job: Job);

    /// Blocks until every job submitted so far (from any thread, on any lane) has
    /// finished, including jobs submitted while waiting.
    ///
    /// Must not be called from inside a job: the calling worker would wait for itself.
    fn wait_idle(&self);

    /// Submits `job` on the [`JobLane::Engine`] lane.
    fn submit(&self, job: Job) {
        self.enqueue(JobLane::Engine, job);
    }

    /// Returns `true` when submitted work can actually run in parallel.
    fn is_parallel(&self) -> bool {
        self.worker_count() > 0
    }
}
