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

//! Error types shared across the engine's edges.
//!
//! Nothing inside the frame pipeline returns these: capacity overflow and degenerate
//! geometry are absorbed where they happen. These errors only cover configuration
//! and presentation, where the caller can actually react.

use thiserror::Error;

/// An error raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value the engine cannot honour.
    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The configuration source could not be read.
    #[error("Failed to read configuration from '{path}': {source}")]
    Io {
        /// Path of the configuration file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration source is not valid for the expected schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Convenience constructor for [`ConfigError::Invalid`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// An error raised by a presentation [`Surface`](crate::platform::Surface).
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The frame descriptor handed to the surface is malformed.
    #[error("Invalid frame: {0}")]
    InvalidFrame(&'static str),
    /// The frame size does not match what the surface was created for.
    #[error("Frame size {got_width}x{got_height} does not match surface size {width}x{height}")]
    SizeMismatch {
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
        /// Presented frame width.
        got_width: u32,
        /// Presented frame height.
        got_height: u32,
    },
    /// The backend failed to output the frame.
    #[error("Presentation backend failed: {0}")]
    Backend(#[from] std::io::Error),
}
