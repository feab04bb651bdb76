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

//! Engine and run loop configuration.
//!
//! Every struct deserializes with `#[serde(default)]`, so a JSON document only
//! needs the fields it wants to change.

use serde::Deserialize;
use std::path::Path;
use strata_core::{ConfigError, JobSystemConfig};
use strata_data::queue::{DEFAULT_COMMAND_CAPACITY, DEFAULT_TEXT_ARENA_BYTES};
use strata_lanes::render_lane::DEFAULT_TILE_SIZE;

/// Timing policy of [`Engine::run`](crate::Engine::run).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunLoopConfig {
    /// Run `update` in fixed `fixed_dt` steps driven by an accumulator.
    pub fixed_timestep: bool,
    /// Fixed step length, in seconds.
    pub fixed_dt: f64,
    /// Upper clamp for a measured frame time, in seconds.
    pub max_dt: f64,
    /// Stop after this many frames; `0` runs until the application stops.
    pub max_frames: u64,
    /// Sleep to cap the frame rate; `0` disables pacing.
    pub target_fps: u32,
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: false,
            fixed_dt: 1.0 / 60.0,
            max_dt: 0.1,
            max_frames: 0,
            target_fps: 0,
        }
    }
}

impl RunLoopConfig {
    /// Checks the timing values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(ConfigError::invalid("run_loop.fixed_dt", "must be a positive number of seconds"));
        }
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            return Err(ConfigError::invalid("run_loop.max_dt", "must be a positive number of seconds"));
        }
        Ok(())
    }
}

/// Everything needed to build an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Command slots per frame.
    pub queue_capacity: usize,
    /// Text arena bytes per frame.
    pub text_arena_bytes: usize,
    /// Rasterizer tile edge, in pixels.
    pub tile_size: u32,
    /// Worker pool settings.
    pub jobs: JobSystemConfig,
    /// Run loop timing.
    pub run_loop: RunLoopConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            queue_capacity: DEFAULT_COMMAND_CAPACITY,
            text_arena_bytes: DEFAULT_TEXT_ARENA_BYTES,
            tile_size: DEFAULT_TILE_SIZE,
            jobs: JobSystemConfig::default(),
            run_loop: RunLoopConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that the engine can be built from this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::invalid("width/height", "the canvas must not be empty"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid("queue_capacity", "must be at least 1"));
        }
        // The rasterizer packs queue indices into 32 bits.
        if self.queue_capacity > u32::MAX as usize {
            return Err(ConfigError::invalid("queue_capacity", "must fit in 32 bits"));
        }
        if self.text_arena_bytes > u32::MAX as usize {
            return Err(ConfigError::invalid("text_arena_bytes", "must fit in 32 bits"));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::invalid("tile_size", "must be at least 1"));
        }
        self.jobs.validate()?;
        self.run_loop.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "width": 64, "run_loop": { "max_frames": 3 } }"#).unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, EngineConfig::default().height);
        assert_eq!(config.run_loop.max_frames, 3);
        assert_eq!(config.run_loop.max_dt, 0.1);
        assert_eq!(config.jobs, JobSystemConfig::default());
        assert_eq!(config.queue_capacity, 8192);
    }

    #[test]
    fn test_empty_document_is_the_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "height": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "width/height", .. }));

        let err = EngineConfig::from_json_str(r#"{ "run_loop": { "fixed_dt": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "run_loop.fixed_dt", .. }));

        let err = EngineConfig::from_json_str(r#"{ "jobs": { "max_worker_threads": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jobs.max_worker_threads", .. }));

        let err = EngineConfig::from_json_str(r#"{ "tile_size": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tile_size", .. }));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = EngineConfig::from_json_str(r#"{ "width": "wide" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
