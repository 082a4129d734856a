//! # edge-core: shared foundation for the edge offloading toolkit
//!
//! Holds the pieces every other crate in this workspace depends on:
//!
//! - [`EdgeError`] / [`EdgeResult`]: the unified error type.
//! - [`BucketParams`] / [`getqpm`]: integer token-bucket arithmetic shared
//!   by the MDP solver and both simulators.
//! - [`UniformIndexSource`]: the injectable RNG trait used by the
//!   simulators so tests can pin exact draw sequences.

pub mod bucket;
pub mod data;
pub mod error;
pub mod rng;

pub use bucket::{getqpm, BucketParams};
pub use data::TrainingData;
pub use error::{EdgeError, EdgeResult};
pub use rng::{SeededIndexSource, UniformIndexSource};
