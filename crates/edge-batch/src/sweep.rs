//! A `toml`-deserializable description of a parameter sweep, expanded into
//! the flat `ParamJob` list the runner consumes.

use crate::job::ParamJob;
use edge_io::CostKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub rates: Vec<f64>,
    pub depths: Vec<f64>,
    pub ncams: Vec<usize>,
    pub cost_kinds: Vec<CostKind>,
}

impl SweepConfig {
    /// Cartesian product of every axis, in rate-major, then depth, then
    /// camera-count, then cost-kind order.
    pub fn jobs(&self) -> Vec<ParamJob> {
        let mut jobs = Vec::with_capacity(
            self.rates.len() * self.depths.len() * self.ncams.len() * self.cost_kinds.len(),
        );
        for &rate in &self.rates {
            for &bdepth in &self.depths {
                for &ncam in &self.ncams {
                    for &cost_kind in &self.cost_kinds {
                        jobs.push(ParamJob {
                            rate,
                            bdepth,
                            ncam,
                            cost_kind,
                        });
                    }
                }
            }
        }
        jobs
    }
}

pub fn load_sweep_config(text: &str) -> anyhow::Result<SweepConfig> {
    Ok(toml::from_str(text)?)
}
