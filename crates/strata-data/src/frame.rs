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

//! The per-frame context shared with every system and rendering step.

use crate::queue::RenderQueue;
use strata_core::job::JobSystem;
use strata_core::platform::{InputQueue, InputState};

/// A read-only snapshot of everything a frame's logic may consult.
///
/// Built by the run loop once per frame and shared by reference. It is `Sync`, so
/// read systems running on worker threads can all hold it at once.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    /// Index of the frame, starting at 0.
    pub frame_index: u64,
    /// Time step of this frame, in seconds.
    pub dt_seconds: f64,
    /// Simulated time elapsed since the start of the run, in seconds.
    pub time_seconds: f64,
    /// Input state for this frame.
    pub input: &'a InputState,
    /// Input events recorded this frame (possibly truncated).
    pub input_events: &'a InputQueue,
    /// The job system, for parallel work.
    pub jobs: &'a dyn JobSystem,
    /// The command queue this frame draws into.
    pub queue: &'a RenderQueue,
}

impl<'a> FrameContext<'a> {
    /// A context for frame 0 with no elapsed time.
    pub fn new(
        jobs: &'a dyn JobSystem,
        queue: &'a RenderQueue,
        input: &'a InputState,
        input_events: &'a InputQueue,
    ) -> Self {
        Self {
            frame_index: 0,
            dt_seconds: 0.0,
            time_seconds: 0.0,
            input,
            input_events,
            jobs,
            queue,
        }
    }

    /// The same context with the given frame timing.
    pub fn with_timing(mut self, frame_index: u64, dt_seconds: f64, time_seconds: f64) -> Self {
        self.frame_index = frame_index;
        self.dt_seconds = dt_seconds;
        self.time_seconds = time_seconds;
        self
    }
}

impl std::fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameContext")
            .field("frame_index", &self.frame_index)
            .field("dt_seconds", &self.dt_seconds)
            .field("time_seconds", &self.time_seconds)
            .field("workers", &self.jobs.worker_count())
            .field("queued_commands", &self.queue.size())
            .field("input_events", &self.input_events.len())
            .finish()
    }
}
