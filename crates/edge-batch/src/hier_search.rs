//! Grid search over per-device inner-bucket parameters for the
//! hierarchical multi-camera setting.
//!
//! Given a fixed shared outer bucket `(r_g, b_g)`, different inner
//! `(rate, depth)` choices trade off how aggressively each device spends
//! its own budget against how often it gets blocked by the shared uplink.
//! This searches a small grid and keeps whichever inner parameters score
//! best on a validation rollout.

use edge_algo::mdp::mdp;
use edge_algo::simulate::mcsimulate;
use edge_core::bucket::{getqpm, BucketParams};
use edge_core::error::EdgeResult;
use edge_core::rng::SeededIndexSource;

/// One scored candidate from the search.
#[derive(Debug, Clone, Copy)]
pub struct InnerCandidate {
    pub rate: f64,
    pub bdepth: f64,
    pub score: f64,
}

/// Search `inner_rates x inner_depths` for the inner bucket parameters
/// that maximize `mcsimulate`'s `avg_gain` against `(valid_metrics,
/// valid_rewards)`, training each candidate's policy on
/// `(train_metrics, train_rewards)`.
///
/// Candidates with inner rate below the outer rate `r_g` are skipped: they
/// can never be the bottleneck's binding constraint and only waste search
/// budget.
pub fn search_inner_bucket(
    train_metrics: &[f64],
    train_rewards: &[f64],
    valid_metrics: &[f64],
    valid_rewards: &[f64],
    outer: BucketParams,
    r_g: f64,
    ncam: usize,
    inner_rates: &[f64],
    inner_depths: &[f64],
    maxp: u64,
    discount: f64,
    tol: f64,
    maxiter: usize,
    timesteps: usize,
    replicas: usize,
    seed: u64,
) -> EdgeResult<(InnerCandidate, Vec<InnerCandidate>)> {
    let mut scored = Vec::new();

    for &rate in inner_rates {
        if rate < r_g {
            continue;
        }
        for &bdepth in inner_depths {
            if getqpm(rate, bdepth, maxp).is_err() {
                continue;
            }

            let outcome = mdp(
                train_metrics,
                train_rewards,
                rate,
                bdepth,
                maxp,
                discount,
                tol,
                maxiter,
            )?;

            let mut rng = SeededIndexSource::new(seed ^ (rate.to_bits() >> 1) ^ bdepth.to_bits());
            let result = mcsimulate(
                &outcome.policy,
                outer,
                ncam,
                valid_metrics,
                valid_rewards,
                timesteps,
                replicas,
                &mut rng,
            )?;

            scored.push(InnerCandidate {
                rate,
                bdepth,
                score: result.avg_gain,
            });
        }
    }

    let best = scored
        .iter()
        .cloned()
        .fold(None, |acc: Option<InnerCandidate>, c| match acc {
            Some(best) if best.score >= c.score => Some(best),
            _ => Some(c),
        })
        .ok_or_else(|| {
            edge_core::error::EdgeError::DegenerateInput(
                "hierarchical search: no feasible inner bucket candidate".into(),
            )
        })?;

    Ok((best, scored))
}
