use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::tempdir;

fn synthetic_dataset(path: &std::path::Path) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "fold,gt,wrank,srank,logit_0,logit_1,logit_2").unwrap();
    for i in 0..300 {
        let fold = i % 3;
        let wrank = i % 6;
        let srank = i % 2;
        let spread = 0.5 + (i % 20) as f64 * 0.2;
        writeln!(file, "{fold},0,{wrank},{srank},{spread},0.1,-0.2").unwrap();
    }
}

#[test]
fn fit_solve_simulate_pipeline_runs_end_to_end() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("data.csv");
    synthetic_dataset(&dataset);

    let fit_bin = dir.path().join("fit.bin");
    Command::cargo_bin("edge-cli")
        .unwrap()
        .args([
            "fit",
            "--dataset",
            dataset.to_str().unwrap(),
            "--fold",
            "0",
            "--cost",
            "top1-error",
            "--out",
            fit_bin.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(fit_bin.exists());

    let policy_bin = dir.path().join("policy.bin");
    Command::cargo_bin("edge-cli")
        .unwrap()
        .args([
            "solve",
            "--dataset",
            dataset.to_str().unwrap(),
            "--fold",
            "0",
            "--cost",
            "top1-error",
            "--rate",
            "0.25",
            "--depth",
            "2.0",
            "--maxiter",
            "200",
            "--out",
            policy_bin.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(policy_bin.exists());

    Command::cargo_bin("edge-cli")
        .unwrap()
        .args([
            "simulate",
            "--dataset",
            dataset.to_str().unwrap(),
            "--fold",
            "0",
            "--cost",
            "top1-error",
            "--policy",
            policy_bin.to_str().unwrap(),
            "--timesteps",
            "500",
            "--replicas",
            "2",
            "--seed",
            "7",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("avg_gain"));
}

#[test]
fn sweep_writes_a_manifest() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("data.csv");
    synthetic_dataset(&dataset);

    let sweep_config = dir.path().join("sweep.toml");
    std::fs::write(
        &sweep_config,
        r#"
rates = [0.1, 0.25]
depths = [1.0]
ncams = [1]
cost_kinds = ["top1-error"]
"#,
    )
    .unwrap();

    let out_dir = dir.path().join("out");
    Command::cargo_bin("edge-cli")
        .unwrap()
        .args([
            "sweep",
            "--dataset",
            dataset.to_str().unwrap(),
            "--sweep-config",
            sweep_config.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--threads",
            "1",
        ])
        .assert()
        .success();

    assert!(out_dir.join("batch_manifest.json").exists());
}
