//! # edge-batch: the experiment driver
//!
//! Fans a `(rate, depth, camera count, cost kind)` parameter grid across a
//! rayon thread pool, one worker per tuple, averaging each tuple's held-out
//! gain over the dataset's cross-validation folds and writing one manifest
//! entry per tuple. No data is shared between workers; each reads the same
//! immutable [`edge_io::dataset::RawSamples`] and writes into its own
//! [`job::JobRecord`].

pub mod hier_search;
pub mod job;
pub mod manifest;
pub mod naive;
pub mod runner;
pub mod sweep;

pub use job::{JobRecord, ParamJob};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest};
pub use runner::{run_batch, BatchRunnerConfig, BatchSummary};
pub use sweep::{load_sweep_config, SweepConfig};
