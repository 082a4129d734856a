//! Cost-kind reductions: turning a classifier's rank-of-ground-truth into
//! a scalar cost for the weak and strong models.

use serde::{Deserialize, Serialize};

/// The three supported ways of reducing a rank to a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostKind {
    /// 1 if the ground truth falls outside the top-1 prediction.
    #[serde(rename = "top1-error")]
    Top1Error,
    /// 1 if the ground truth falls outside the top-5 predictions.
    #[serde(rename = "top5-error")]
    Top5Error,
    /// The rank itself, capped at 10.
    #[serde(rename = "rank")]
    Rank,
}

impl CostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostKind::Top1Error => "top1-error",
            CostKind::Top5Error => "top5-error",
            CostKind::Rank => "rank",
        }
    }
}

/// Reduce a (weak-rank, strong-rank) pair to (weak-cost, strong-cost).
pub fn cost(weak_rank: u32, strong_rank: u32, kind: CostKind) -> (f64, f64) {
    match kind {
        CostKind::Top1Error => (
            if weak_rank > 1 { 1.0 } else { 0.0 },
            if strong_rank > 1 { 1.0 } else { 0.0 },
        ),
        CostKind::Top5Error => (
            if weak_rank > 5 { 1.0 } else { 0.0 },
            if strong_rank > 5 { 1.0 } else { 0.0 },
        ),
        CostKind::Rank => (weak_rank.min(10) as f64, strong_rank.min(10) as f64),
    }
}
