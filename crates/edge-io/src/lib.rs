//! # edge-io: dataset loading, calibration, cost reduction, and artifact I/O
//!
//! The dataset loader is a swappable seam — only its interface matters to
//! the core — but the exact numerics of calibration/cost/entropy are
//! pinned by the upstream research code this toolkit is descended from,
//! so they're implemented exactly rather than left to each driver to
//! reinvent.

pub mod artifacts;
pub mod calibration;
pub mod cost;
pub mod dataset;
pub mod entropy;

pub use artifacts::{read_artifact, write_artifact};
pub use calibration::calib;
pub use cost::{cost, CostKind};
pub use dataset::{build_training_data, CsvDatasetLoader, DatasetLoader, RawSamples};
pub use entropy::entropy;
