//! Compact binary archives for the three kinds of artifact the driver
//! persists: a metric-fit bundle, a policy, and simulation stats. These are
//! internal producer/consumer pairs (this crate writes and reads its own
//! files), so `bincode` is used instead of the JSON used for the
//! human-facing batch manifest.

use edge_core::error::{EdgeError, EdgeResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

/// Write any serializable artifact to `path` as a compact bincode blob,
/// creating parent directories as needed.
pub fn write_artifact<T: Serialize>(path: &Path, value: &T) -> EdgeResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read an artifact previously written by [`write_artifact`].
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> EdgeResult<T> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes).map_err(EdgeError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_algo::{MetricMap, Policy};
    use edge_core::bucket::getqpm;
    use tempfile::tempdir;

    #[test]
    fn metric_map_round_trips() {
        let map = MetricMap {
            xbins: (0..1000).map(|i| i as f64).collect(),
            ybins: (0..1000).map(|i| (i as f64).sin()).collect(),
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("fold0_cost0.bin");
        write_artifact(&path, &map).unwrap();
        let loaded: MetricMap = read_artifact(&path).unwrap();
        assert_eq!(loaded.xbins, map.xbins);
        assert_eq!(loaded.ybins, map.ybins);
    }

    #[test]
    fn policy_round_trips() {
        let bucket = getqpm(0.25, 2.0, 100).unwrap();
        let policy = Policy {
            bucket,
            thresholds: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.bin");
        write_artifact(&path, &policy).unwrap();
        let loaded: Policy = read_artifact(&path).unwrap();
        assert_eq!(loaded.bucket, policy.bucket);
        assert_eq!(loaded.thresholds, policy.thresholds);
    }

    #[test]
    fn missing_file_surfaces_an_io_error() {
        let err = read_artifact::<Policy>(Path::new("/nonexistent/path/x.bin")).unwrap_err();
        assert!(matches!(err, EdgeError::Io(_)));
    }
}
