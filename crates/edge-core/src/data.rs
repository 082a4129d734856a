//! Shared data-model types that cross crate boundaries: produced by
//! `edge-io`'s dataset loader, consumed by `edge-algo`'s fitting/solving
//! operations.

use crate::error::{EdgeError, EdgeResult};
use serde::{Deserialize, Serialize};

/// Parallel `(metric, reward)` arrays. No ordering is required or assumed;
/// `edge-algo` operations take it apart into the slices they need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    pub metrics: Vec<f64>,
    pub rewards: Vec<f64>,
}

impl TrainingData {
    pub fn new(metrics: Vec<f64>, rewards: Vec<f64>) -> EdgeResult<Self> {
        if metrics.len() != rewards.len() {
            return Err(EdgeError::ShapeMismatch(format!(
                "metrics has {} samples, rewards has {}",
                metrics.len(),
                rewards.len()
            )));
        }
        Ok(TrainingData { metrics, rewards })
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        let err = TrainingData::new(vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, EdgeError::ShapeMismatch(_)));
    }

    #[test]
    fn len_and_is_empty_agree() {
        let td = TrainingData::new(vec![], vec![]).unwrap();
        assert_eq!(td.len(), 0);
        assert!(td.is_empty());
    }
}
