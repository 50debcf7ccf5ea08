#![allow(dead_code)]

//! Parses the `(group, key) -> value` configuration map into typed
//! descriptors (`boxing_core::FrameFormat`, `PipelineSpec`) the rest of
//! the workspace consumes, and ships the named built-in presets.

mod descriptor;
mod error;
mod map;
mod presets;

pub use descriptor::{parse_frame_format, parse_pipeline_spec, PipelineSpec, StageConfig};
pub use error::ConfigError;
pub use map::RawConfig;
pub use presets::named_preset;
