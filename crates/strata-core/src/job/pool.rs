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

//! The default [`JobSystem`]: a fixed pool of OS threads with two priority lanes.

use super::{Job, JobLane, JobSystem};
use crate::config::JobSystemConfig;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// The two lane FIFOs plus the shutdown flag, guarded by one mutex.
#[derive(Default)]
struct LaneQueues {
    engine: VecDeque<Job>,
    user: VecDeque<Job>,
    stop: bool,
}

impl LaneQueues {
    /// Engine work always wins when both lanes have something pending.
    fn pop(&mut self) -> Option<Job> {
        self.engine.pop_front().or_else(|| self.user.pop_front())
    }
}

/// State shared between the pool handle and its workers.
struct Shared {
    queues: Mutex<LaneQueues>,
    work_available: Condvar,
    /// Jobs enqueued but not yet finished, across both lanes.
    outstanding: AtomicUsize,
    idle_lock: Mutex<()>,
    idle: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            queues: Mutex::new(LaneQueues::default()),
            work_available: Condvar::new(),
            outstanding: AtomicUsize::new(0),
            idle_lock: Mutex::new(()),
            idle: Condvar::new(),
        }
    }

    // Jobs never run while a lock is held and a panicking job aborts the process,
    // so a poisoned mutex still guards consistent data.
    fn lock_queues(&self) -> MutexGuard<'_, LaneQueues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn job_finished(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.idle.notify_all();
        }
    }
}

/// A fixed-size pool of worker threads servicing an Engine lane and a User lane.
///
/// The pool is created once by the run loop and passed by reference to everything
/// that needs to schedule work. Dropping it drains every pending job, then joins
/// the workers.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts a pool according to `config`.
    ///
    /// Thread creation failures are not fatal: the pool keeps the workers that did
    /// start, and with none at all it runs every job inline on the submitter.
    pub fn new(config: &JobSystemConfig) -> Self {
        let available = thread::available_parallelism()
            .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
            .unwrap_or(1);
        let target = config.resolve_worker_count(available);

        let shared = Arc::new(Shared::new());
        let mut workers = Vec::with_capacity(target as usize);

        for index in 0..target {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("strata-worker-{index}"))
                .spawn(move || worker_loop(index, &worker_shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    log::warn!(
                        "WorkerPool: failed to spawn worker {index} of {target}: {e}. \
                         Continuing with {} worker(s).",
                        workers.len()
                    );
                    break;
                }
            }
        }

        if workers.is_empty() {
            log::info!("WorkerPool running in inline mode (no worker threads).");
        } else {
            log::info!(
                "WorkerPool started with {} worker(s) (host parallelism: {available}).",
                workers.len()
            );
        }

        Self { shared, workers }
    }

    /// Starts a pool that never spawns threads.
    pub fn inline() -> Self {
        Self::new(&JobSystemConfig::single_threaded())
    }

    /// Number of jobs submitted to the workers that have not finished yet.
    pub fn outstanding_jobs(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }
}

impl JobSystem for WorkerPool {
    fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn enqueue(&self, lane: JobLane, job: Job) {
        if self.workers.is_empty() {
            job();
            return;
        }

        {
            let mut queues = self.shared.lock_queues();
            match lane {
                JobLane::Engine => queues.engine.push_back(job),
                JobLane::User => queues.user.push_back(job),
            }
            self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        }
        self.shared.work_available.notify_one();
    }

    fn wait_idle(&self) {
        if self.workers.is_empty() {
            return;
        }

        let mut guard = self
            .shared
            .idle_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while self.shared.outstanding.load(Ordering::Acquire) != 0 {
            guard = self
                .shared
                .idle
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.shared.lock_queues().stop = true;
        self.shared.work_available.notify_all();

        let count = self.workers.len();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("WorkerPool: a worker thread terminated abnormally.");
            }
        }
        log::info!("WorkerPool shut down ({count} worker(s) joined).");
    }
}

fn worker_loop(index: u32, shared: &Shared) {
    log::trace!("Worker {index} started.");
    loop {
        let job = {
            let mut queues = shared.lock_queues();
            loop {
                // Pending work is drained before the stop flag is honoured.
                if let Some(job) = queues.pop() {
                    break job;
                }
                if queues.stop {
                    log::trace!("Worker {index} exiting.");
                    return;
                }
                queues = shared
                    .work_available
                    .wait(queues)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        run_job(index, job);
        shared.job_finished();
    }
}

fn run_job(index: u32, job: Job) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        log::error!(
            "Job panicked on worker {index}: {}. Jobs must not panic; aborting.",
            panic_message(payload.as_ref())
        );
        std::process::abort();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
