//! A single point in the (rate, depth, camera count, cost kind) grid.

use edge_io::CostKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParamJob {
    pub rate: f64,
    pub bdepth: f64,
    pub ncam: usize,
    pub cost_kind: CostKind,
}

impl ParamJob {
    pub fn job_id(&self) -> String {
        format!(
            "r{:04}_b{:03}_c{}_n{}",
            (self.rate * 1000.0).round() as i64,
            (self.bdepth * 10.0).round() as i64,
            self.cost_kind.as_str(),
            self.ncam
        )
    }
}

/// Outcome of running one `ParamJob` across all folds, averaged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: String,
    pub error: Option<String>,
    pub avg_gain: Option<f64>,
    pub converged: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_is_stable_and_readable() {
        let job = ParamJob {
            rate: 0.25,
            bdepth: 2.0,
            ncam: 1,
            cost_kind: CostKind::Top1Error,
        };
        assert_eq!(job.job_id(), "r0250_b020_ctop1-error_n1");
    }
}
