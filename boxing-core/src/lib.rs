#![allow(dead_code)]

//! Shared data model for the boxing workspace: images, geometry primitives,
//! the generic matrix container, metadata items, and the result/error
//! taxonomy every other crate in the workspace propagates.

mod error;
mod format;
mod geom;
mod image;
mod matrix;
mod metadata;
mod stats;

pub use error::BoxingError;
pub use format::{CornerMarks, FrameFormat, FrameType};
pub use geom::{Line, Point, PointF};
pub use image::Image;
pub use matrix::Matrix;
pub use metadata::{ContentType, MetadataItem};
pub use stats::DecodeStats;

pub type BoxingResult<T> = Result<T, BoxingError>;
