#![allow(dead_code)]

//! Frame geometry recovery: corner-mark search, reference-bar tracking,
//! sync-point refinement, and the sampler family that turns a coordinate
//! matrix into a rectified symbol image.

mod mapper;
mod sampler;
mod tracker;

pub use mapper::CoordinateMapper;
pub use sampler::{AreaSampler, BicubicSampler, BilinearSampler, BiquadraticSampler, Sampler};
pub use tracker::{Tracker, TrackerMode, TrackerOutput};
