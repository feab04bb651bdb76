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

//! # Strata Data
//!
//! The data that flows through one frame: the multi-producer render command
//! queue, the read-only [`FrameContext`], and the [`PhaseScheduler`] that runs
//! update logic over an application-owned store.

#![warn(missing_docs)]

pub mod frame;
pub mod queue;
pub mod schedule;

pub use frame::FrameContext;
pub use queue::{Command, Op, Payload, PushError, RenderQueue, SortKey, SpriteView, TextSpan};
pub use schedule::{Phase, PhaseScheduler};
