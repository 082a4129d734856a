//! Integer token-bucket arithmetic.
//!
//! Real-valued `(rate, depth)` requests are reduced to an integer triple
//! `(q, p, m)` so every downstream component (the MDP solver and both
//! simulators) shares exactly the same bucket arithmetic.

use crate::error::{EdgeError, EdgeResult};
use serde::{Deserialize, Serialize};

/// Reduced integer token-bucket parameters: each timestep adds `q` tokens,
/// a send consumes `p` tokens, capacity is `m`. Rate = q/p, depth = m/p.
///
/// Invariant: `0 < q < p <= m`, and `gcd(q, p, m) = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketParams {
    pub q: u64,
    pub p: u64,
    pub m: u64,
}

impl BucketParams {
    /// Number of occupancy states `n ∈ {q, ..., m}`.
    pub fn num_states(&self) -> usize {
        (self.m - self.q + 1) as usize
    }

    /// Number of send-eligible states `n ∈ {p, ..., m}`.
    pub fn num_send_states(&self) -> usize {
        (self.m - self.p + 1) as usize
    }
}

/// Find integer `(q, p, m)` such that `q/p ≈ rate` and `m/p ≈ bdepth`.
///
/// For each candidate denominator `d ∈ {1, ..., maxp}`, picks the one
/// minimizing `(frac(d*rate) + frac(d*bdepth)) / d`, ties going to the
/// smallest `d`. `p` is set to the winning denominator, `q` and `m` are the
/// floors of `rate*p` and `bdepth*p`, and the triple is reduced by its GCD.
pub fn getqpm(rate: f64, bdepth: f64, maxp: u64) -> EdgeResult<BucketParams> {
    let mut best_d = 1u64;
    let mut best_err = f64::INFINITY;

    for d in 1..=maxp {
        let df = d as f64;
        let rerr = df * rate;
        let berr = df * bdepth;
        let err = (frac(rerr) + frac(berr)) / df;
        if err < best_err {
            best_err = err;
            best_d = d;
        }
    }

    let p = best_d;
    let q = (rate * p as f64).floor() as i64;
    let m = (bdepth * p as f64).floor() as i64;

    if q <= 0 {
        return Err(EdgeError::InvalidBucket(format!(
            "rate {rate} too small for maxp {maxp}: derived q={q}"
        )));
    }
    let q = q as u64;
    let m = if m < 0 { 0 } else { m as u64 };

    let divisor = gcd(gcd(q, p), m);
    let (q, p, m) = (q / divisor, p / divisor, m / divisor);

    if q == 0 || q >= p || m < p {
        return Err(EdgeError::InvalidBucket(format!(
            "reduced params q={q}, p={p}, m={m} violate 0 < q < p <= m"
        )));
    }

    Ok(BucketParams { q, p, m })
}

fn frac(x: f64) -> f64 {
    x - x.floor()
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_deterministic_bucket_arithmetic() {
        let p = getqpm(0.25, 2.0, 100).unwrap();
        assert_eq!((p.q, p.p, p.m), (1, 4, 8));

        let p = getqpm(0.1, 1.0, 100).unwrap();
        assert_eq!((p.q, p.p, p.m), (1, 10, 10));

        let p = getqpm(0.05, 1.0, 100).unwrap();
        assert_eq!((p.q, p.p, p.m), (1, 20, 20));
    }

    #[test]
    fn invariants_hold_for_a_grid_of_rates() {
        for rate_milli in [25u64, 50, 100, 200, 333] {
            for depth_tenths in [10u64, 15, 20, 40] {
                let rate = rate_milli as f64 / 1000.0;
                let depth = depth_tenths as f64 / 10.0;
                let bp = getqpm(rate, depth, 100).unwrap();
                assert!(bp.q > 0 && bp.q < bp.p && bp.p <= bp.m);
                assert!((bp.q as f64 / bp.p as f64 - rate).abs() <= 1.0 / bp.p as f64 + 1e-9);
                assert!((bp.m as f64 / bp.p as f64 - depth).abs() <= 1.0 / bp.p as f64 + 1e-9);
                assert_eq!(gcd(gcd(bp.q, bp.p), bp.m), 1);
            }
        }
    }

    #[test]
    fn state_counts_match_bucket_span() {
        let bp = getqpm(0.25, 1.0, 100).unwrap();
        assert_eq!(bp.num_states(), (bp.m - bp.q + 1) as usize);
        assert_eq!(bp.num_send_states(), (bp.m - bp.p + 1) as usize);
    }

    #[test]
    fn rejects_degenerate_rate() {
        let err = getqpm(0.0, 1.0, 100).unwrap_err();
        assert!(matches!(err, EdgeError::InvalidBucket(_)));
    }
}
