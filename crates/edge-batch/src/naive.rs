//! A constant-percentile baseline policy, used as a comparison point
//! against the solved MDP policy — not a core algorithm, just a convenient
//! fixed threshold derived from the training metric distribution.

use edge_algo::mdp::Policy;
use edge_core::bucket::{getqpm, BucketParams};
use edge_core::error::EdgeResult;

/// Builds a `Policy` whose threshold is constant across all occupancies,
/// set to the `(1 - rate) * 100`th percentile of the training metrics —
/// i.e. "send whenever this item is among the top `rate` fraction by
/// metric", regardless of how full the bucket currently is.
pub fn from_percentile(train_metrics: &[f64], rate: f64, bdepth: f64, maxp: u64) -> EdgeResult<Policy> {
    let bucket: BucketParams = getqpm(rate, bdepth, maxp)?;
    let threshold = percentile(train_metrics, (1.0 - rate) * 100.0);
    Ok(Policy {
        bucket,
        thresholds: vec![threshold; bucket.num_send_states()],
    })
}

/// Linear-interpolation percentile, matching `numpy.percentile`'s default.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_policy_has_constant_threshold() {
        let metrics: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let policy = from_percentile(&metrics, 0.25, 1.0, 100).unwrap();
        assert!(policy.thresholds.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn percentile_matches_known_values() {
        let values: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        assert!((percentile(&values, 50.0) - 50.0).abs() < 1e-9);
        assert!((percentile(&values, 0.0) - 0.0).abs() < 1e-9);
        assert!((percentile(&values, 100.0) - 100.0).abs() < 1e-9);
    }
}
