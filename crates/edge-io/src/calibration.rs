//! Temperature calibration: finds the inverse-temperature scaling that
//! minimizes cross-entropy of the softmax over a held-out label set.

/// Number of candidate temperatures sampled per round.
const GRID_POINTS: usize = 10;
/// Number of coordinate-halving rounds.
const ROUNDS: usize = 6;

/// Find the inverse temperature `tinv` minimizing mean cross-entropy of
/// `softmax(tinv * logits)` against `gtlbl`, searching `[0, 2]` with a
/// 10-point grid, halving the bracket around the best point each round.
///
/// `logits[i]` is sample `i`'s per-class logit vector; `gtlbl[i]` is the
/// index of its ground-truth class.
pub fn calib(logits: &[Vec<f64>], gtlbl: &[usize]) -> f64 {
    let shifted: Vec<Vec<f64>> = logits
        .iter()
        .map(|row| {
            let max = row.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            row.iter().map(|&v| v - max).collect()
        })
        .collect();

    let n = shifted.len() as f64;
    let base = -shifted
        .iter()
        .zip(gtlbl.iter())
        .map(|(row, &lbl)| row[lbl])
        .sum::<f64>()
        / n;

    let mut lb = 0.0f64;
    let mut ub = 2.0f64;
    let mut best = lb;

    for _ in 0..ROUNDS {
        let step = (ub - lb) / (GRID_POINTS - 1) as f64;
        let tinvs: Vec<f64> = (0..GRID_POINTS).map(|k| lb + step * k as f64).collect();

        let mut best_xent = f64::INFINITY;
        for &tinv in &tinvs {
            let mean_log_z = shifted
                .iter()
                .map(|row| row.iter().map(|&v| (tinv * v).exp()).sum::<f64>().ln())
                .sum::<f64>()
                / n;
            let xent = base * tinv + mean_log_z;
            if xent < best_xent {
                best_xent = xent;
                best = tinv;
            }
        }

        lb = (best - step).max(0.0);
        ub = best + step;
    }

    best
}
