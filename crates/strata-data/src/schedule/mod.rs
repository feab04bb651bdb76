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

//! # Phase Scheduler
//!
//! Runs update logic over an application-owned store once per tick.
//!
//! For each [`Phase`] in order:
//!
//! 1. every **read system** of the phase is started in one [`TaskGroup`] with a
//!    shared `&S`, and the group is waited on as a hard barrier;
//! 2. every **write system** of the phase then runs on the calling thread, in
//!    registration order, with `&mut S`.
//!
//! The store type only needs to be `Sync`. Read systems get nothing but `&S`, so
//! shared/exclusive access is enforced by the borrow checker instead of locks.
//! Without worker threads the read systems simply run inline, one after the
//! other, with the same end result.

mod phase;

pub use phase::Phase;

use crate::frame::FrameContext;
use strata_core::job::{JobLane, TaskGroup};

type ReadSystem<S> = Box<dyn Fn(&FrameContext<'_>, &S) + Send + Sync>;
type WriteSystem<S> = Box<dyn FnMut(&FrameContext<'_>, &mut S) + Send>;

struct PhaseSystems<S> {
    reads: Vec<ReadSystem<S>>,
    writes: Vec<WriteSystem<S>>,
}

impl<S> Default for PhaseSystems<S> {
    fn default() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }
}

/// Runs registered systems over a store of type `S`, phase by phase.
pub struct PhaseScheduler<S> {
    phases: [PhaseSystems<S>; Phase::COUNT],
}

impl<S> Default for PhaseScheduler<S> {
    fn default() -> Self {
        Self {
            phases: std::array::from_fn(|_| PhaseSystems::default()),
        }
    }
}

impl<S> PhaseScheduler<S> {
    /// Creates a scheduler with no systems.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system that only reads the store during `phase`.
    ///
    /// Read systems of the same phase may run concurrently with each other.
    pub fn add_read_system<F>(&mut self, phase: Phase, system: F)
    where
        F: Fn(&FrameContext<'_>, &S) + Send + Sync + 'static,
    {
        self.phases[phase.index()].reads.push(Box::new(system));
    }

    /// Registers a system that mutates the store during `phase`.
    ///
    /// Write systems run one at a time, after all read systems of the phase.
    pub fn add_write_system<F>(&mut self, phase: Phase, system: F)
    where
        F: FnMut(&FrameContext<'_>, &mut S) + Send + 'static,
    {
        self.phases[phase.index()].writes.push(Box::new(system));
    }

    /// Number of (read, write) systems registered for `phase`.
    pub fn system_count(&self, phase: Phase) -> (usize, usize) {
        let systems = &self.phases[phase.index()];
        (systems.reads.len(), systems.writes.len())
    }

    /// Whether no system is registered at all.
    pub fn is_empty(&self) -> bool {
        self.phases
            .iter()
            .all(|p| p.reads.is_empty() && p.writes.is_empty())
    }

    /// Runs one tick: every phase, reads then writes.
    pub fn tick(&mut self, ctx: &FrameContext<'_>, store: &mut S)
    where
        S: Sync,
    {
        for phase in Phase::ALL {
            let systems = &mut self.phases[phase.index()];
            if systems.reads.is_empty() && systems.writes.is_empty() {
                continue;
            }
            log::trace!(
                "Frame {}: phase {phase} ({} read, {} write)",
                ctx.frame_index,
                systems.reads.len(),
                systems.writes.len()
            );

            if !systems.reads.is_empty() {
                let shared: &S = store;
                let reads = &systems.reads;
                TaskGroup::scope(ctx.jobs, JobLane::Engine, |group| {
                    for system in reads {
                        group.run(move || system(ctx, shared));
                    }
                });
            }

            for system in &mut systems.writes {
                system(ctx, store);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::RenderQueue;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use strata_core::job::WorkerPool;
    use strata_core::platform::{InputQueue, InputState};
    use strata_core::JobSystemConfig;

    #[test]
    fn test_phases_run_in_order() {
        let pool = WorkerPool::inline();
        let queue = RenderQueue::new(1, 0);
        let (input, events) = (InputState::new(), InputQueue::new());
        let ctx = FrameContext::new(&pool, &queue, &input, &events);

        let mut scheduler = PhaseScheduler::<Vec<Phase>>::new();
        // Registered out of order on purpose.
        for phase in [Phase::RenderPrep, Phase::PreUpdate, Phase::PostUpdate, Phase::Update] {
            scheduler.add_write_system(phase, move |_, log: &mut Vec<Phase>| log.push(phase));
        }

        let mut log = Vec::new();
        scheduler.tick(&ctx, &mut log);
        assert_eq!(log, Phase::ALL.to_vec());
    }

    #[test]
    fn test_writes_run_in_registration_order_after_reads() {
        let pool = WorkerPool::new(&JobSystemConfig::with_workers(2));
        let queue = RenderQueue::new(1, 0);
        let (input, events) = (InputState::new(), InputQueue::new());
        let ctx = FrameContext::new(&pool, &queue, &input, &events);

        let reads_done = Arc::new(AtomicU64::new(0));
        let trace = Arc::new(Mutex::new(Vec::new()));

        let mut scheduler = PhaseScheduler::<u64>::new();
        for _ in 0..3 {
            let reads_done = Arc::clone(&reads_done);
            scheduler.add_read_system(Phase::Update, move |_, _| {
                reads_done.fetch_add(1, Ordering::SeqCst);
            });
        }
        for name in ["first", "second"] {
            let reads_done = Arc::clone(&reads_done);
            let trace = Arc::clone(&trace);
            scheduler.add_write_system(Phase::Update, move |_, store: &mut u64| {
                assert_eq!(reads_done.load(Ordering::SeqCst), 3);
                trace.lock().unwrap().push(name);
                *store += 1;
            });
        }

        let mut store = 0;
        scheduler.tick(&ctx, &mut store);
        assert_eq!(store, 2);
        assert_eq!(*trace.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(scheduler.system_count(Phase::Update), (3, 2));
        assert_eq!(scheduler.system_count(Phase::PreUpdate), (0, 0));
    }

    #[test]
    fn test_empty_scheduler_is_a_no_op() {
        let pool = WorkerPool::inline();
        let queue = RenderQueue::new(1, 0);
        let (input, events) = (InputState::new(), InputQueue::new());
        let ctx = FrameContext::new(&pool, &queue, &input, &events);

        let mut scheduler = PhaseScheduler::<i32>::new();
        assert!(scheduler.is_empty());
        let mut store = 7;
        scheduler.tick(&ctx, &mut store);
        assert_eq!(store, 7);
    }
}
