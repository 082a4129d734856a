//! Finite-horizon discounted value iteration over bucket occupancy.
//!
//! Collapses the continuous "pick a metric threshold" action into a choice
//! of index `k` into the training pairs sorted by metric, descending: index
//! `k` means "send whenever the item's metric is among the top `k`".

use edge_core::bucket::{getqpm, BucketParams};
use edge_core::error::{EdgeError, EdgeResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A threshold policy indexed by bucket occupancy.
///
/// `thresholds[n - bucket.p]` is the metric cutoff to use when the bucket
/// holds `n` tokens; occupancies below `bucket.p` cannot send and have no
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub bucket: BucketParams,
    pub thresholds: Vec<f64>,
}

impl Policy {
    /// Whether an item with the given metric value should be sent when the
    /// bucket holds `n` tokens.
    pub fn decide(&self, n: u64, metric: f64) -> bool {
        if n < self.bucket.p {
            return false;
        }
        let idx = (n - self.bucket.p) as usize;
        metric >= self.thresholds[idx]
    }
}

/// Outcome of [`mdp`]. `converged = false` surfaces a non-fatal warning:
/// the last iterate is still a usable (if not fully converged) policy.
/// `warning` carries the same information as a structured
/// [`EdgeError::NonConvergence`] for callers that want to log or propagate
/// it rather than just branch on `converged`.
pub struct MdpOutcome {
    pub policy: Policy,
    pub converged: bool,
    pub iterations: usize,
    pub warning: Option<EdgeError>,
}

/// Solve for a threshold policy via finite-horizon discounted value
/// iteration.
///
/// `theta` / `reward` are paired training observations: `theta[i]` is the
/// metric value of sample `i`, `reward[i]` the reward earned if that sample
/// is sent. `rate`/`bdepth`/`maxp` parameterize the token bucket (see
/// [`getqpm`]). `discount` is the per-timestep discount factor, `tol` the
/// relative convergence tolerance, `maxiter` the iteration cap.
pub fn mdp(
    theta: &[f64],
    reward: &[f64],
    rate: f64,
    bdepth: f64,
    maxp: u64,
    discount: f64,
    tol: f64,
    maxiter: usize,
) -> EdgeResult<MdpOutcome> {
    if theta.len() != reward.len() {
        return Err(EdgeError::ShapeMismatch(format!(
            "theta has {} samples, reward has {}",
            theta.len(),
            reward.len()
        )));
    }
    let n_samples = theta.len();
    if n_samples == 0 {
        return Err(EdgeError::DegenerateInput(
            "mdp: no training samples to derive a policy from".into(),
        ));
    }

    let bucket = getqpm(rate, bdepth, maxp)?;

    let mut order: Vec<usize> = (0..n_samples).collect();
    order.sort_by(|&a, &b| theta[b].partial_cmp(&theta[a]).unwrap());
    let sorted_theta: Vec<f64> = order.iter().map(|&i| theta[i]).collect();
    let sorted_reward: Vec<f64> = order.iter().map(|&i| reward[i]).collect();

    // F[k] = fraction of samples sent when the cutoff admits the top k.
    // G[k] = cumulative mean reward of those top k samples.
    let n = n_samples as f64;
    let mut f_tab = vec![0.0f64; n_samples + 1];
    let mut g_tab = vec![0.0f64; n_samples + 1];
    let mut running = 0.0;
    for k in 0..=n_samples {
        f_tab[k] = k as f64 / n;
        if k > 0 {
            running += sorted_reward[k - 1];
        }
        g_tab[k] = running / n;
    }

    let tau = sorted_theta.iter().fold(0.0f64, |acc, t| acc.max(t.abs())) * tol;

    let m = bucket.m as usize;
    let p = bucket.p as usize;
    let q = bucket.q as usize;

    let mut value = vec![0.0f64; m + 1];
    let mut thresholds = vec![sorted_theta[n_samples - 1]; m - p + 1];
    let mut converged = false;
    let mut iterations = 0;
    let mut last_delta = f64::INFINITY;

    for iter in 1..=maxiter {
        iterations = iter;
        let ext = |i: usize| value[i.min(m)];

        let mut new_value = vec![0.0f64; m + 1];
        for occ in 0..p.min(m + 1) {
            new_value[occ] = discount * ext(occ + q);
        }

        let send_results: Vec<(f64, f64)> = (p..=m)
            .into_par_iter()
            .map(|occ| {
                let no_send = ext(occ + q);
                let send = ext(occ - p + q);
                let mut best_val = f64::NEG_INFINITY;
                let mut best_k = 1usize;
                for k in 1..=n_samples {
                    let q_k = g_tab[k] + discount * (f_tab[k] * send + (1.0 - f_tab[k]) * no_send);
                    if q_k > best_val {
                        best_val = q_k;
                        best_k = k;
                    }
                }
                (best_val, sorted_theta[best_k - 1])
            })
            .collect();

        let prev_thresholds = thresholds.clone();
        for (offset, (val, threshold)) in send_results.into_iter().enumerate() {
            new_value[p + offset] = val;
            thresholds[offset] = threshold;
        }

        value = new_value;

        // Convergence is on policy stability, not value stability: the
        // value array can keep drifting under a near-1 discount even once
        // the argmax thresholds have settled.
        if iter > 1 {
            let policy_delta = thresholds
                .iter()
                .zip(prev_thresholds.iter())
                .fold(0.0f64, |acc, (a, b)| acc.max((a - b).abs()));
            last_delta = policy_delta;
            if policy_delta < tau.max(f64::EPSILON) {
                converged = true;
                break;
            }
        }
    }

    let warning = if !converged {
        tracing::warn!(
            iterations,
            tau,
            "mdp: value iteration did not converge within maxiter, returning last iterate"
        );
        Some(EdgeError::NonConvergence { max_iter: maxiter, last_delta })
    } else {
        None
    };

    Ok(MdpOutcome {
        policy: Policy { bucket, thresholds },
        converged,
        iterations,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_training() -> (Vec<f64>, Vec<f64>) {
        let theta: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let reward: Vec<f64> = theta.iter().map(|t| 1.0 - t).collect();
        (theta, reward)
    }

    #[test]
    fn s2_value_iteration_converges() {
        let (theta, reward) = toy_training();
        let outcome = mdp(&theta, &reward, 0.25, 2.0, 100, 0.95, 1e-4, 500).unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations <= 500);
        assert_eq!(
            outcome.policy.thresholds.len(),
            outcome.policy.bucket.num_send_states()
        );
    }

    #[test]
    fn policy_never_sends_below_p_tokens() {
        let (theta, reward) = toy_training();
        let outcome = mdp(&theta, &reward, 0.25, 2.0, 100, 0.95, 1e-4, 500).unwrap();
        let bucket = outcome.policy.bucket;
        for n in 0..bucket.p {
            assert!(!outcome.policy.decide(n, f64::INFINITY));
        }
    }

    #[test]
    fn higher_occupancy_never_requires_a_stricter_threshold() {
        // Monotonicity of the optimal policy in occupancy: having more
        // tokens banked should never make the threshold for sending an
        // item stricter than at lower occupancy.
        let (theta, reward) = toy_training();
        let outcome = mdp(&theta, &reward, 0.25, 2.0, 100, 0.95, 1e-4, 500).unwrap();
        let thresholds = &outcome.policy.thresholds;
        for w in thresholds.windows(2) {
            assert!(w[1] <= w[0] + 1e-9);
        }
    }

    #[test]
    fn rejects_empty_training_data() {
        let err = mdp(&[], &[], 0.25, 2.0, 100, 0.95, 1e-4, 500).unwrap_err();
        assert!(matches!(err, EdgeError::DegenerateInput(_)));
    }

    #[test]
    fn non_convergence_is_surfaced_not_fatal() {
        let (theta, reward) = toy_training();
        let outcome = mdp(&theta, &reward, 0.25, 2.0, 100, 0.95, 1e-4, 1).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn s2_trivial_mdp_with_no_reward_is_indifferent() {
        let theta = vec![0.0; 100];
        let reward = vec![0.0; 100];
        let outcome = mdp(&theta, &reward, 0.25, 1.0, 100, 0.9999, 1e-6, 10000).unwrap();
        assert_eq!(outcome.policy.bucket.num_send_states(), 5);
        assert_eq!(outcome.policy.thresholds.len(), 5);
        for &t in &outcome.policy.thresholds {
            assert_eq!(t, 0.0);
        }
    }

    #[test]
    fn s3_greedy_mdp_with_uniform_positive_reward_sends_near_lowest_metric() {
        let theta: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let reward = vec![1.0; 100];
        let outcome = mdp(&theta, &reward, 0.5, 1.0, 100, 0.9999, 1e-6, 10000).unwrap();
        let lowest = theta.iter().cloned().fold(f64::INFINITY, f64::min);
        for &t in &outcome.policy.thresholds {
            assert!(t - lowest < 0.05);
        }
    }
}
