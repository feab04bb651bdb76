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

use std::fmt;

/// One stage of a tick. Phases always run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Input handling and bookkeeping before simulation.
    PreUpdate,
    /// Main simulation.
    Update,
    /// Reactions to the simulation results.
    PostUpdate,
    /// Turning state into draw commands.
    RenderPrep,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 4] = [
        Phase::PreUpdate,
        Phase::Update,
        Phase::PostUpdate,
        Phase::RenderPrep,
    ];

    /// Number of phases.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of the phase in [`Phase::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// A stable name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::PreUpdate => "PreUpdate",
            Phase::Update => "Update",
            Phase::PostUpdate => "PostUpdate",
            Phase::RenderPrep => "RenderPrep",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
