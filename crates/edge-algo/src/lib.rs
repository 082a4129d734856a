//! # edge-algo: the numerical core of the edge offloading toolkit
//!
//! Three independent pieces, composed by the batch driver but usable on
//! their own:
//!
//! - [`metric_fit`]: entropy → expected-reward curve fitting.
//! - [`mdp`]: the threshold [`mdp::Policy`] solver.
//! - [`simulate`]: Monte Carlo evaluation of a policy, single-device or
//!   hierarchical multi-device.
//!
//! Bucket arithmetic ([`edge_core::bucket`]) and the injectable RNG trait
//! ([`edge_core::rng`]) live in `edge-core` since both the solver and the
//! simulators need them.

pub mod mdp;
pub mod metric_fit;
pub mod simulate;

pub use mdp::{mdp as solve_mdp, MdpOutcome, Policy};
pub use metric_fit::{fit_metric, MetricFitOutcome, MetricMap};
pub use simulate::{mcsimulate, simulate as simulate_policy, McSimulationResult, SimulationResult};
