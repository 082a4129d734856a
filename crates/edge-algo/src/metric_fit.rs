//! Non-parametric entropy → expected-reward-per-send mapping.
//!
//! Fits a Gaussian-kernel-smoothed curve from a scalar uncertainty signal
//! (entropy of the weak classifier's logits) to the expected reward of
//! sending that sample to the strong classifier, with bandwidth chosen by
//! split-half validation on the training fold.

use edge_core::error::{EdgeError, EdgeResult};
use serde::{Deserialize, Serialize};

/// Chunk size used when tabulating the smoother over `xbins`, keeping
/// memory at `O(chunk * N)` instead of `O(1000 * N)` for large training
/// sets.
const XBIN_CHUNK: usize = 100;

/// Number of bandwidth candidates searched during split-half validation.
const BANDWIDTH_CANDIDATES: usize = 10;

/// Piecewise-linear map from entropy to expected per-send reward.
///
/// `xbins` is strictly increasing and has length 1000 by construction.
/// Evaluate with [`MetricMap::interpolate`], which does linear
/// interpolation with flat extrapolation at both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricMap {
    pub xbins: Vec<f64>,
    pub ybins: Vec<f64>,
}

impl MetricMap {
    /// Linearly interpolate the fitted curve at `x`, clamping to the first
    /// or last `ybins` value outside `[xbins[0], xbins[-1]]`.
    pub fn interpolate(&self, x: f64) -> f64 {
        let xs = &self.xbins;
        let ys = &self.ybins;
        if xs.is_empty() {
            return 0.0;
        }
        if x <= xs[0] {
            return ys[0];
        }
        if x >= xs[xs.len() - 1] {
            return ys[ys.len() - 1];
        }
        // `partition_point` finds the first index where xs[i] > x.
        let hi = xs.partition_point(|&xv| xv <= x).max(1).min(xs.len() - 1);
        let lo = hi - 1;
        let (x0, x1) = (xs[lo], xs[hi]);
        let (y0, y1) = (ys[lo], ys[hi]);
        if x1 == x0 {
            return y0;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Interpolate a whole slice at once (the driver's usual usage:
    /// mapping a raw entropy array to calibrated metric values).
    pub fn interpolate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.interpolate(x)).collect()
    }
}

/// Outcome of [`fit_metric`], distinguishing the normal fit from the
/// degenerate-input fallback so callers can log/flag it without treating it
/// as fatal (spec's `DegenerateInput` is documented as non-fatal).
pub struct MetricFitOutcome {
    pub map: MetricMap,
    pub degenerate: bool,
}

/// Fit `entrain -> rewtrain` with Gaussian-kernel smoothing, selecting the
/// bandwidth by split-half validation (even-index samples fit, odd-index
/// samples score).
///
/// Returns a constant map (mean of `rewtrain` broadcast) and
/// `degenerate = true` when `entrain.len() < 2` or all entropy values are
/// equal, per spec's documented edge-case policy.
pub fn fit_metric(entrain: &[f64], rewtrain: &[f64]) -> EdgeResult<MetricFitOutcome> {
    if entrain.len() != rewtrain.len() {
        return Err(EdgeError::ShapeMismatch(format!(
            "entrain has {} samples, rewtrain has {}",
            entrain.len(),
            rewtrain.len()
        )));
    }

    let n = entrain.len();
    if n < 2 {
        tracing::warn!(n, "fit_metric: fewer than 2 training samples, returning constant map");
        return Ok(constant_outcome(rewtrain));
    }

    let (lo, hi) = min_max(entrain);
    if hi <= lo {
        tracing::warn!("fit_metric: zero-variance entropy span, returning constant map");
        return Ok(constant_outcome(rewtrain));
    }

    let xbins = linspace(lo, hi, 1000);

    // Split-half validation: even-index samples fit, odd-index samples
    // score. Parity is on array position, not on value, per spec.
    let (e0, r0) = parity_split(entrain, rewtrain, 0);
    let (e1, r1) = parity_split(entrain, rewtrain, 1);

    let span = xbins[xbins.len() - 1] - xbins[0];
    let mut best_h = span * 2f64.powf(-8.0);
    let mut best_cost = f64::INFINITY;

    for k in 0..BANDWIDTH_CANDIDATES {
        let h = span * 2f64.powf(-8.0 + 0.5 * k as f64);
        let curve = smooth_chunked(&xbins, &e0, &r0, h);
        let curve_map = MetricMap {
            xbins: xbins.clone(),
            ybins: curve,
        };
        let cost = mean_squared_error(&curve_map, &e1, &r1);
        if cost < best_cost {
            best_cost = cost;
            best_h = h;
        }
    }

    let ybins = smooth_chunked(&xbins, entrain, rewtrain, best_h);
    Ok(MetricFitOutcome {
        map: MetricMap { xbins, ybins },
        degenerate: false,
    })
}

fn constant_outcome(rewtrain: &[f64]) -> MetricFitOutcome {
    let mean = if rewtrain.is_empty() {
        0.0
    } else {
        rewtrain.iter().sum::<f64>() / rewtrain.len() as f64
    };
    MetricFitOutcome {
        map: MetricMap {
            xbins: vec![0.0; 1000],
            ybins: vec![mean; 1000],
        },
        degenerate: true,
    }
}

fn parity_split(xs: &[f64], ys: &[f64], parity: usize) -> (Vec<f64>, Vec<f64>) {
    let mut out_x = Vec::with_capacity(xs.len() / 2 + 1);
    let mut out_y = Vec::with_capacity(ys.len() / 2 + 1);
    for (i, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
        if i % 2 == parity {
            out_x.push(x);
            out_y.push(y);
        }
    }
    (out_x, out_y)
}

fn min_max(xs: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &x in xs {
        if x < lo {
            lo = x;
        }
        if x > hi {
            hi = x;
        }
    }
    (lo, hi)
}

fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (count - 1) as f64;
    (0..count).map(|i| lo + step * i as f64).collect()
}

/// Evaluate the numerically-stabilized softmax-kernel smoother at every
/// point in `xs`, processing `XBIN_CHUNK` points at a time so memory stays
/// bounded by `O(chunk * e.len())` rather than `O(xs.len() * e.len())`.
fn smooth_chunked(xs: &[f64], e: &[f64], r: &[f64], h: f64) -> Vec<f64> {
    let mut out = vec![0.0; xs.len()];
    let h2 = h * h;
    for chunk_start in (0..xs.len()).step_by(XBIN_CHUNK) {
        let chunk_end = (chunk_start + XBIN_CHUNK).min(xs.len());
        for (offset, &x) in xs[chunk_start..chunk_end].iter().enumerate() {
            out[chunk_start + offset] = smooth_one(x, e, r, h2);
        }
    }
    out
}

fn smooth_one(x: f64, e: &[f64], r: &[f64], h2: f64) -> f64 {
    // neg_sq[j] = -(x - e_j)^2; the max is the closest training point.
    let mut shift = f64::NEG_INFINITY;
    let mut neg_sq = Vec::with_capacity(e.len());
    for &ej in e {
        let v = -(x - ej) * (x - ej);
        neg_sq.push(v);
        if v > shift {
            shift = v;
        }
    }
    let mut denom = 0.0;
    let mut weighted = 0.0;
    for (j, &v) in neg_sq.iter().enumerate() {
        let w = ((v - shift) / h2).exp();
        denom += w;
        weighted += w * r[j];
    }
    if denom == 0.0 {
        0.0
    } else {
        weighted / denom
    }
}

fn mean_squared_error(curve: &MetricMap, xs: &[f64], ys: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let pred = curve.interpolate(x);
        total += (pred - y) * (pred - y);
    }
    total / xs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xbins_strictly_increasing_and_span_matches_input() {
        let entrain: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let rewtrain: Vec<f64> = entrain.iter().map(|e| 1.0 - e).collect();
        let outcome = fit_metric(&entrain, &rewtrain).unwrap();
        let map = outcome.map;
        assert_eq!(map.xbins.len(), 1000);
        assert_eq!(map.ybins.len(), 1000);
        for w in map.xbins.windows(2) {
            assert!(w[1] > w[0]);
        }
        assert!((map.xbins[0] - 0.0).abs() < 1e-9);
        assert!((map.xbins[999] - 1.99).abs() < 1e-9);
        assert!(!outcome.degenerate);
    }

    #[test]
    fn degenerate_on_single_sample() {
        let outcome = fit_metric(&[0.5], &[1.0]).unwrap();
        assert!(outcome.degenerate);
        assert!(outcome.map.ybins.iter().all(|&y| (y - 1.0).abs() < 1e-12));
    }

    #[test]
    fn degenerate_on_zero_variance_entropy() {
        let entrain = vec![0.3; 20];
        let rewtrain: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let outcome = fit_metric(&entrain, &rewtrain).unwrap();
        assert!(outcome.degenerate);
        let expected_mean = rewtrain.iter().sum::<f64>() / rewtrain.len() as f64;
        assert!((outcome.map.ybins[0] - expected_mean).abs() < 1e-9);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = fit_metric(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, EdgeError::ShapeMismatch(_)));
    }

    #[test]
    fn interpolation_round_trips_near_fitted_points() {
        let entrain: Vec<f64> = (0..500).map(|i| i as f64 * 0.002).collect();
        let rewtrain: Vec<f64> = entrain.iter().map(|e| (e * 3.0).sin()).collect();
        let outcome = fit_metric(&entrain, &rewtrain).unwrap();
        // Smoothed curve should track the underlying signal reasonably
        // well away from the boundary, within kernel approximation error.
        let mid = entrain[entrain.len() / 2];
        let predicted = outcome.map.interpolate(mid);
        let truth = (mid * 3.0).sin();
        assert!((predicted - truth).abs() < 0.2);
    }

    #[test]
    fn flat_extrapolation_outside_span() {
        let entrain: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let rewtrain: Vec<f64> = vec![1.0; 100];
        let outcome = fit_metric(&entrain, &rewtrain).unwrap();
        let below = outcome.map.interpolate(-5.0);
        let above = outcome.map.interpolate(5.0);
        assert_eq!(below, outcome.map.ybins[0]);
        assert_eq!(above, outcome.map.ybins[outcome.map.ybins.len() - 1]);
    }
}
