//! Dataset loading and the calibration/cost/entropy pipeline that turns raw
//! classifier output into the `(metric, reward)` pairs `edge-algo` consumes.
//!
//! The dataset loader itself is out of the core's contract — only its
//! interface is specified — so this module is a thin, swappable adapter:
//! [`DatasetLoader`] is the seam, [`CsvDatasetLoader`] the one concrete
//! implementation shipped here.

use crate::calibration::calib;
use crate::cost::{cost, CostKind};
use crate::entropy::entropy;
use edge_core::data::TrainingData;
use edge_core::error::{EdgeError, EdgeResult};
use std::path::{Path, PathBuf};

/// Raw per-sample fields a dataset loader is responsible for supplying:
/// weak-classifier logits, ground-truth label, weak/strong rank of the
/// ground truth, and a fold id for train/test splitting.
#[derive(Debug, Clone)]
pub struct RawSamples {
    pub wlogit: Vec<Vec<f64>>,
    pub gt: Vec<usize>,
    pub wrank: Vec<u32>,
    pub srank: Vec<u32>,
    pub split: Vec<u32>,
}

impl RawSamples {
    fn validate(&self) -> EdgeResult<()> {
        let n = self.wlogit.len();
        if self.gt.len() != n || self.wrank.len() != n || self.srank.len() != n || self.split.len() != n {
            return Err(EdgeError::ShapeMismatch(
                "dataset arrays (wlogit, gt, wrank, srank, split) must share the same length".into(),
            ));
        }
        Ok(())
    }
}

/// Seam between the core and whatever produces labeled classifier output.
pub trait DatasetLoader {
    fn load(&self) -> EdgeResult<RawSamples>;
}

/// Loads `RawSamples` from a CSV with columns `fold,gt,wrank,srank,logit_0..logit_{K-1}`.
pub struct CsvDatasetLoader {
    path: PathBuf,
}

impl CsvDatasetLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvDatasetLoader {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetLoader for CsvDatasetLoader {
    fn load(&self) -> EdgeResult<RawSamples> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| EdgeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        let headers = reader
            .headers()
            .map_err(|e| EdgeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
            .clone();
        let logit_cols: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with("logit_"))
            .map(|(i, _)| i)
            .collect();
        if logit_cols.is_empty() {
            return Err(EdgeError::ShapeMismatch(
                "dataset CSV has no logit_* columns".into(),
            ));
        }

        let mut raw = RawSamples {
            wlogit: Vec::new(),
            gt: Vec::new(),
            wrank: Vec::new(),
            srank: Vec::new(),
            split: Vec::new(),
        };

        for record in reader.records() {
            let record = record.map_err(|e| EdgeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
            let get = |name: &str| -> EdgeResult<&str> {
                let idx = headers.iter().position(|h| h == name).ok_or_else(|| {
                    EdgeError::ShapeMismatch(format!("dataset CSV missing column '{name}'"))
                })?;
                record.get(idx).ok_or_else(|| {
                    EdgeError::ShapeMismatch(format!("dataset CSV row missing column '{name}'"))
                })
            };

            let parse_u32 = |s: &str, col: &str| -> EdgeResult<u32> {
                s.parse::<u32>()
                    .map_err(|_| EdgeError::ShapeMismatch(format!("'{col}' is not an integer: {s}")))
            };

            raw.split.push(parse_u32(get("fold")?, "fold")?);
            raw.gt.push(parse_u32(get("gt")?, "gt")? as usize);
            raw.wrank.push(parse_u32(get("wrank")?, "wrank")?);
            raw.srank.push(parse_u32(get("srank")?, "srank")?);

            let mut row_logits = Vec::with_capacity(logit_cols.len());
            for &col in &logit_cols {
                let v: f64 = record
                    .get(col)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| EdgeError::ShapeMismatch("non-numeric logit value".into()))?;
                row_logits.push(v);
            }
            raw.wlogit.push(row_logits);
        }

        raw.validate()?;
        Ok(raw)
    }
}

/// Derive calibrated train/test `TrainingData` for one `(fold, cost_kind)`
/// pair: calibrate temperature on the train partition, compute entropy as
/// the metric, and `reward = weak_cost - strong_cost` as the reward.
///
/// Samples with `split == held_out_fold` become the test partition;
/// everything else is train.
pub fn build_training_data(
    raw: &RawSamples,
    held_out_fold: u32,
    cost_kind: CostKind,
) -> EdgeResult<(TrainingData, TrainingData)> {
    raw.validate()?;

    let train_idx: Vec<usize> = (0..raw.wlogit.len())
        .filter(|&i| raw.split[i] != held_out_fold)
        .collect();
    let test_idx: Vec<usize> = (0..raw.wlogit.len())
        .filter(|&i| raw.split[i] == held_out_fold)
        .collect();

    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(EdgeError::DegenerateInput(format!(
            "fold {held_out_fold}: train or test partition is empty"
        )));
    }

    let train_logits: Vec<Vec<f64>> = train_idx.iter().map(|&i| raw.wlogit[i].clone()).collect();
    let train_gt: Vec<usize> = train_idx.iter().map(|&i| raw.gt[i]).collect();
    let tinv = calib(&train_logits, &train_gt);

    let metric_reward = |indices: &[usize]| -> EdgeResult<TrainingData> {
        let metrics: Vec<f64> = indices
            .iter()
            .map(|&i| entropy(&raw.wlogit[i], tinv))
            .collect();
        let rewards: Vec<f64> = indices
            .iter()
            .map(|&i| {
                let (wcost, scost) = cost(raw.wrank[i], raw.srank[i], cost_kind);
                wcost - scost
            })
            .collect();
        TrainingData::new(metrics, rewards)
    };

    Ok((metric_reward(&train_idx)?, metric_reward(&test_idx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn synthetic_raw() -> RawSamples {
        let mut raw = RawSamples {
            wlogit: Vec::new(),
            gt: Vec::new(),
            wrank: Vec::new(),
            srank: Vec::new(),
            split: Vec::new(),
        };
        for i in 0..60 {
            raw.wlogit.push(vec![
                1.0 + (i as f64 * 0.01),
                0.1,
                -0.5,
            ]);
            raw.gt.push(0);
            raw.wrank.push((i % 7) as u32);
            raw.srank.push((i % 3) as u32);
            raw.split.push((i % 3) as u32);
        }
        raw
    }

    #[test]
    fn build_training_data_splits_by_fold() {
        let raw = synthetic_raw();
        let (train, test) = build_training_data(&raw, 0, CostKind::Top1Error).unwrap();
        assert_eq!(train.len() + test.len(), raw.wlogit.len());
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn rejects_degenerate_fold_selection() {
        let mut raw = synthetic_raw();
        raw.split = vec![0; raw.split.len()];
        let err = build_training_data(&raw, 1, CostKind::Rank).unwrap_err();
        assert!(matches!(err, EdgeError::DegenerateInput(_)));
    }

    #[test]
    fn csv_loader_round_trips_a_small_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fold,gt,wrank,srank,logit_0,logit_1,logit_2").unwrap();
        for i in 0..10 {
            writeln!(file, "{},0,{},{},1.0,0.2,-0.3", i % 3, i % 5, i % 2).unwrap();
        }
        file.flush().unwrap();

        let loader = CsvDatasetLoader::new(file.path());
        let raw = loader.load().unwrap();
        assert_eq!(raw.wlogit.len(), 10);
        assert_eq!(raw.wlogit[0].len(), 3);
    }
}
