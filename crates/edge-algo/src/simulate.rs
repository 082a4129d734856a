//! Monte Carlo rollout of a threshold policy against empirical data.
//!
//! Deterministic given an injected [`UniformIndexSource`]: the only
//! randomness is which dataset sample gets drawn at each step, and every
//! draw is taken up front, in order, from the single injected source before
//! any replica trajectory runs. Per step, decision, accounting, and state
//! update happen strictly in that order — the state recorded into the
//! occupancy histogram and used for the send decision is always the
//! PRE-transition state; reordering this would corrupt both.
//!
//! Per spec.md §5, replica trajectories are independent and the only
//! dimension safe to parallelize: once the draws are pinned, each replica's
//! bucket trajectory runs on its own rayon task and the per-replica
//! accumulators are reduced afterward. The `mcsimulate` camera loop stays
//! serial within a replica — it shares one outer bucket across cameras.

use crate::mdp::Policy;
use edge_core::bucket::BucketParams;
use edge_core::error::{EdgeError, EdgeResult};
use edge_core::rng::UniformIndexSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a single-device [`simulate`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Mean reward per timestep, averaged over all replicas.
    pub avg_gain: f64,
    /// `(times_sent, times_offered)` per input sample, reordered so the
    /// output is sorted by that sample's metric value ascending.
    pub send_per_item: Vec<(u64, u64)>,
    /// Fraction of `(t, r)` pairs, length `m-p+1`, at which a send occurred
    /// while occupancy was in that send-eligible state.
    pub send_hist: Vec<f64>,
    /// Fraction of `(t, r)` pairs, length `m-q+1`, the bucket spent in each
    /// occupancy state.
    pub occup_hist: Vec<f64>,
}

/// Outcome of a multi-device [`mcsimulate`] run: only the aggregate
/// (outer-bucket) statistics are meaningful once many devices share a
/// single uplink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McSimulationResult {
    pub avg_gain: f64,
    pub occup_hist: Vec<f64>,
}

/// Single-device rollout of `policy` over `timesteps` ticks across
/// `replicas` independent bucket trajectories, drawing from the shared
/// `(metric, reward)` population.
pub fn simulate(
    policy: &Policy,
    metric: &[f64],
    reward: &[f64],
    timesteps: usize,
    replicas: usize,
    rng: &mut impl UniformIndexSource,
) -> EdgeResult<SimulationResult> {
    if metric.len() != reward.len() {
        return Err(EdgeError::ShapeMismatch(format!(
            "metric has {} samples, reward has {}",
            metric.len(),
            reward.len()
        )));
    }
    if metric.is_empty() {
        return Err(EdgeError::DegenerateInput(
            "simulate: no evaluation samples".into(),
        ));
    }

    let bucket = policy.bucket;

    // Draw the full T x R sample-index matrix up front, in the same (t
    // outer, r inner) order a fused draw/decide/update loop would use, so
    // every replica trajectory below can run independently of the others.
    let mut draws = vec![0usize; timesteps * replicas];
    for t in 0..timesteps {
        for r in 0..replicas {
            draws[t * replicas + r] = rng.next_index(metric.len());
        }
    }

    let per_replica: Vec<ReplicaAccum> = (0..replicas)
        .into_par_iter()
        .map(|r| {
            let mut n = bucket.m;
            let mut accum = ReplicaAccum::new(metric.len(), &bucket);

            for t in 0..timesteps {
                let idx = draws[t * replicas + r];
                let sent = n >= bucket.p && policy.decide(n, metric[idx]);

                accum.offered[idx] += 1;
                accum.occup_hist[(n - bucket.q) as usize] += 1;
                if sent {
                    accum.sent_count[idx] += 1;
                    accum.gain_sum += reward[idx];
                    accum.send_hist[(n - bucket.p) as usize] += 1;
                }

                n = (n - if sent { bucket.p } else { 0 } + bucket.q).min(bucket.m);
            }

            accum
        })
        .collect();

    let mut offered = vec![0u64; metric.len()];
    let mut sent_count = vec![0u64; metric.len()];
    let mut send_hist = vec![0u64; bucket.num_send_states()];
    let mut occup_hist = vec![0u64; bucket.num_states()];
    let mut gain_sum = 0.0f64;
    for accum in per_replica {
        for i in 0..metric.len() {
            offered[i] += accum.offered[i];
            sent_count[i] += accum.sent_count[i];
        }
        for i in 0..send_hist.len() {
            send_hist[i] += accum.send_hist[i];
        }
        for i in 0..occup_hist.len() {
            occup_hist[i] += accum.occup_hist[i];
        }
        gain_sum += accum.gain_sum;
    }

    let denom = (timesteps * replicas) as f64;
    let mut item_order: Vec<usize> = (0..metric.len()).collect();
    item_order.sort_by(|&a, &b| metric[a].partial_cmp(&metric[b]).unwrap());
    let send_per_item = item_order
        .into_iter()
        .map(|i| (sent_count[i], offered[i]))
        .collect();

    Ok(SimulationResult {
        avg_gain: gain_sum / denom,
        send_per_item,
        send_hist: send_hist.into_iter().map(|c| c as f64 / denom).collect(),
        occup_hist: occup_hist.into_iter().map(|c| c as f64 / denom).collect(),
    })
}

/// Per-replica accumulators for [`simulate`], reduced across replicas once
/// every rayon task has finished its own independent trajectory.
struct ReplicaAccum {
    offered: Vec<u64>,
    sent_count: Vec<u64>,
    send_hist: Vec<u64>,
    occup_hist: Vec<u64>,
    gain_sum: f64,
}

impl ReplicaAccum {
    fn new(num_items: usize, bucket: &BucketParams) -> Self {
        ReplicaAccum {
            offered: vec![0u64; num_items],
            sent_count: vec![0u64; num_items],
            send_hist: vec![0u64; bucket.num_send_states()],
            occup_hist: vec![0u64; bucket.num_states()],
            gain_sum: 0.0,
        }
    }
}

/// Hierarchical multi-device rollout: `ncam` devices each run `inner_policy`
/// against their own inner bucket, gated through a single outer bucket
/// (capacity-only, no threshold of its own) shared across `ncam` devices
/// within each of `replicas` independent trajectories.
///
/// Cameras are processed in order `0..ncam` against the outer bucket each
/// timestep: earlier cameras can exhaust it before later ones see it. This
/// asymmetry models serialized access to a single shared uplink and is
/// preserved deliberately, not incidental.
pub fn mcsimulate(
    inner_policy: &Policy,
    outer_bucket: BucketParams,
    ncam: usize,
    metric: &[f64],
    reward: &[f64],
    timesteps: usize,
    replicas: usize,
    rng: &mut impl UniformIndexSource,
) -> EdgeResult<McSimulationResult> {
    if metric.len() != reward.len() {
        return Err(EdgeError::ShapeMismatch(format!(
            "metric has {} samples, reward has {}",
            metric.len(),
            reward.len()
        )));
    }
    if metric.is_empty() {
        return Err(EdgeError::DegenerateInput(
            "mcsimulate: no evaluation samples".into(),
        ));
    }
    if ncam == 0 {
        return Err(EdgeError::DegenerateInput(
            "mcsimulate: ncam must be at least 1".into(),
        ));
    }

    let inner = inner_policy.bucket;

    // Draw the full T x (R*ncam) sample-index matrix up front, preserving
    // the per-timestep flat order (`r*ncam + c`, cameras innermost) a fused
    // loop would draw in, so each replica's (inner-bucket + outer-bucket)
    // trajectory below can run independently of the others. The camera
    // loop inside one replica's timestep stays strictly serial — it shares
    // one outer bucket across cameras, which is the one dependency spec.md
    // §5 says is not parallelizable.
    let mut draws = vec![0usize; timesteps * replicas * ncam];
    for t in 0..timesteps {
        for i in 0..replicas * ncam {
            draws[t * replicas * ncam + i] = rng.next_index(metric.len());
        }
    }

    let per_replica: Vec<McReplicaAccum> = (0..replicas)
        .into_par_iter()
        .map(|r| {
            let mut inner_occ = vec![inner.m; ncam];
            let mut outer_occ = outer_bucket.m;
            let mut occup_hist = vec![0u64; outer_bucket.num_states()];
            let mut gain_sum = 0.0f64;

            for t in 0..timesteps {
                let base = t * replicas * ncam + r * ncam;
                let mut wants_send = vec![false; ncam];
                let mut idx_for = vec![0usize; ncam];

                for c in 0..ncam {
                    let idx = draws[base + c];
                    idx_for[c] = idx;
                    let n = inner_occ[c];
                    let wants = n >= inner.p && inner_policy.decide(n, metric[idx]);
                    wants_send[c] = wants;
                    inner_occ[c] = (n - if wants { inner.p } else { 0 } + inner.q).min(inner.m);
                }

                for c in 0..ncam {
                    let n = outer_occ;
                    let sent = wants_send[c] && n >= outer_bucket.p;

                    occup_hist[(n - outer_bucket.q) as usize] += 1;
                    if sent {
                        gain_sum += reward[idx_for[c]];
                    }

                    outer_occ =
                        (n - if sent { outer_bucket.p } else { 0 } + outer_bucket.q).min(outer_bucket.m);
                }
            }

            McReplicaAccum { occup_hist, gain_sum }
        })
        .collect();

    let mut occup_hist = vec![0u64; outer_bucket.num_states()];
    let mut gain_sum = 0.0f64;
    for accum in per_replica {
        for i in 0..occup_hist.len() {
            occup_hist[i] += accum.occup_hist[i];
        }
        gain_sum += accum.gain_sum;
    }

    let denom = (timesteps * replicas * ncam) as f64;
    Ok(McSimulationResult {
        avg_gain: gain_sum / denom,
        occup_hist: occup_hist.into_iter().map(|c| c as f64 / denom).collect(),
    })
}

/// Per-replica accumulators for [`mcsimulate`], reduced across replicas
/// once every rayon task has finished its own independent trajectory.
struct McReplicaAccum {
    occup_hist: Vec<u64>,
    gain_sum: f64,
}
