//! Numerically stable softmax entropy, computed directly in log-space from
//! calibrated logits.

/// Entropy of the softmax distribution over `logits`, scaled by inverse
/// temperature `tinv`.
///
/// `H = log(Z) - (1/Z) * sum_i exp(l_i) * l_i` where `l_i = tinv * (logit_i
/// - max(logits))` and `Z = sum_i exp(l_i)`; subtracting the max before
/// exponentiating keeps the sum finite for large logits.
pub fn entropy(logits: &[f64], tinv: f64) -> f64 {
    let max_logit = logits.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let scaled: Vec<f64> = logits.iter().map(|&l| tinv * (l - max_logit)).collect();
    let exp_scaled: Vec<f64> = scaled.iter().map(|&l| l.exp()).collect();
    let z: f64 = exp_scaled.iter().sum();
    let weighted: f64 = exp_scaled
        .iter()
        .zip(scaled.iter())
        .map(|(&e, &l)| e * l)
        .sum();
    z.ln() - weighted / z
}
