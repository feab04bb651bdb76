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

//! # Strata Core
//!
//! Foundational crate containing the job system, pixel types, and the interface
//! contracts (presentation surfaces, input sources) the rest of the engine is
//! built on.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gfx;
pub mod job;
pub mod platform;

pub use config::JobSystemConfig;
pub use error::{ConfigError, SurfaceError};
pub use gfx::{FramebufferMut, PixelCanvas, PixelFormat, PixelFrame, Rgba8};
pub use job::{Job, JobLane, JobSystem, TaskGroup, TaskValue, WorkerPool};
pub use platform::{InputSource, Surface};
