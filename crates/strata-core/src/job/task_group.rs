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

//! Scoped fork-join sections on top of a [`JobSystem`].

use super::{Job, JobLane, JobSystem};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};

/// Completion bookkeeping shared between a group and its in-flight tasks.
struct GroupState {
    inflight: AtomicUsize,
    lock: Mutex<()>,
    done: Condvar,
}

impl GroupState {
    fn finish_one(&self) {
        if self.inflight.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.done.notify_all();
        }
    }
}

/// A set of tasks submitted to a [`JobSystem`] that can be waited on as a unit.
///
/// A group only exists inside [`TaskGroup::scope`], which is what allows tasks to
/// borrow data from the caller's stack: the group waits for all of its tasks
/// before the scope returns, including when the scope body unwinds.
pub struct TaskGroup<'env> {
    jobs: &'env dyn JobSystem,
    lane: JobLane,
    state: Arc<GroupState>,
    // Invariant in 'env, so a group can never be coerced to a shorter borrow.
    _env: PhantomData<&'env mut &'env ()>,
}

impl<'env> TaskGroup<'env> {
    /// Opens a fork-join section on `jobs`, submitting tasks on `lane`.
    ///
    /// Every task started through the group has finished when this returns.
    pub fn scope<F, R>(jobs: &'env dyn JobSystem, lane: JobLane, f: F) -> R
    where
        F: FnOnce(&TaskGroup<'env>) -> R,
    {
        let group = TaskGroup {
            jobs,
            lane,
            state: Arc::new(GroupState {
                inflight: AtomicUsize::new(0),
                lock: Mutex::new(()),
                done: Condvar::new(),
            }),
            _env: PhantomData,
        };
        f(&group)
    }

    /// The lane this group submits on.
    pub fn lane(&self) -> JobLane {
        self.lane
    }

    /// Starts `task`. With no worker threads it runs to completion before `run` returns.
    pub fn run<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'env,
    {
        if !self.jobs.is_parallel() {
            task();
            return;
        }

        self.state.inflight.fetch_add(1, Ordering::AcqRel);
        let state = Arc::clone(&self.state);
        let wrapped: Box<dyn FnOnce() + Send + 'env> = Box::new(move || {
            task();
            state.finish_one();
        });

        // SAFETY: the group waits for this task before the scope that created it
        // returns (explicitly or in `Drop`), and the group cannot leave that scope.
        // Everything the task borrows lives for 'env, which outlives the scope, so
        // the borrows are valid for as long as the job can run.
        let job: Job = unsafe {
            std::mem::transmute::<Box<dyn FnOnce() + Send + 'env>, Job>(wrapped)
        };
        self.jobs.enqueue(self.lane, job);
    }

    /// Starts `task` and stores its result in `cell`.
    ///
    /// The value is readable through [`TaskValue::get`] once [`wait`](Self::wait)
    /// returns.
    pub fn run_value<T, F>(&self, cell: &'env TaskValue<T>, task: F)
    where
        T: Send + Sync + 'env,
        F: FnOnce() -> T + Send + 'env,
    {
        self.run(move || {
            if !cell.set(task()) {
                log::warn!("TaskValue was already filled; discarding the new result.");
            }
        });
    }

    /// Number of tasks started through this group that have not finished.
    pub fn pending(&self) -> usize {
        self.state.inflight.load(Ordering::Acquire)
    }

    /// Blocks until every task started through this group so far has finished.
    ///
    /// Tasks submitted elsewhere on the same job system are not waited for.
    pub fn wait(&self) {
        if self.state.inflight.load(Ordering::Acquire) == 0 {
            return;
        }

        let mut guard = self
            .state
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while self.state.inflight.load(Ordering::Acquire) != 0 {
            guard = self
                .state
                .done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for TaskGroup<'_> {
    fn drop(&mut self) {
        self.wait();
    }
}

/// A write-once slot receiving the result of a task.
#[derive(Debug)]
pub struct TaskValue<T> {
    value: OnceLock<T>,
}

impl<T> Default for TaskValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskValue<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
        }
    }

    /// Whether a value has been stored.
    pub fn ready(&self) -> bool {
        self.value.get().is_some()
    }

    /// The stored value, if any.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Stores `value`. Returns `false` (and drops `value`) if the slot was already filled.
    pub fn set(&self, value: T) -> bool {
        self.value.set(value).is_ok()
    }

    /// Consumes the slot, returning the stored value.
    pub fn into_inner(self) -> Option<T> {
        self.value.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobSystemConfig;
    use crate::job::WorkerPool;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_wait_without_tasks_returns_immediately() {
        let pool = WorkerPool::new(&JobSystemConfig::with_workers(2));
        TaskGroup::scope(&pool, JobLane::Engine, |group| {
            assert_eq!(group.pending(), 0);
            group.wait();
            group.wait();
        });
    }

    #[test]
    fn test_tasks_can_borrow_stack_data() {
        let pool = WorkerPool::new(&JobSystemConfig::with_workers(4));
        let input: Vec<u64> = (1..=1000).collect();
        let mut partial = [0u64; 8];

        TaskGroup::scope(&pool, JobLane::User, |group| {
            for (chunk, slot) in input.chunks(125).zip(partial.iter_mut()) {
                group.run(move || *slot = chunk.iter().sum());
            }
        });

        assert_eq!(partial.iter().sum::<u64>(), 500_500);
    }

    #[test]
    fn test_inline_group_runs_tasks_in_submission_order() {
        let pool = WorkerPool::inline();
        let caller = thread::current().id();
        let order = Mutex::new(Vec::new());

        TaskGroup::scope(&pool, JobLane::Engine, |group| {
            for i in 0..5 {
                let order = &order;
                group.run(move || {
                    assert_eq!(thread::current().id(), caller);
                    order.lock().unwrap().push(i);
                });
                // Already finished before `run` returned.
                assert_eq!(group.pending(), 0);
            }
        });

        assert_eq!(order.into_inner().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_wait_ignores_foreign_jobs() {
        let pool = WorkerPool::new(&JobSystemConfig::with_workers(2));

        // --- 1. ARRANGE ---
        // A job outside the group that stays blocked on one worker.
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        pool.submit(Box::new(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        }));
        started_rx.recv().unwrap();

        // --- 2. ACT ---
        let mut value = 0;
        TaskGroup::scope(&pool, JobLane::Engine, |group| {
            group.run(|| value = 42);
            group.wait();
        });

        // --- 3. ASSERT ---
        // The foreign job is still blocked, yet the group has completed.
        assert_eq!(value, 42);
        assert!(pool.outstanding_jobs() >= 1);

        release_tx.send(()).unwrap();
        pool.wait_idle();
    }

    #[test]
    fn test_run_value_delivers_result() {
        let pool = WorkerPool::new(&JobSystemConfig::with_workers(2));
        let left = TaskValue::new();
        let right = TaskValue::new();

        TaskGroup::scope(&pool, JobLane::User, |group| {
            group.run_value(&left, || (1..=10u32).sum::<u32>());
            group.run_value(&right, || (11..=20u32).sum::<u32>());
            group.wait();
            assert!(left.ready());
            assert!(right.ready());
        });

        assert_eq!(left.get().copied(), Some(55));
        assert_eq!(right.into_inner(), Some(155));
    }

    #[test]
    fn test_task_value_is_write_once() {
        let cell = TaskValue::new();
        assert!(!cell.ready());
        assert!(cell.set(1));
        assert!(!cell.set(2));
        assert_eq!(cell.get(), Some(&1));
    }
}
