//! End-to-end run of the tsrkit binary: import -> cluster -> associate ->
//! mark-dominant -> merge -> export -> stats.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn tsrkit_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tsrkit"))
}

fn run(store: &Path, args: &[&str]) -> Output {
    let output = Command::new(tsrkit_binary())
        .arg(args[0])
        .arg("--store")
        .arg(store)
        .args(&args[1..])
        .output()
        .expect("failed to run tsrkit");
    assert!(
        output.status.success(),
        "tsrkit {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn write_table(dir: &Path, name: &str, rows: &[(&str, i32, &str, f64)]) -> PathBuf {
    let mut text = String::from("seqname\tstart\tend\tstrand\tscore\n");
    for (seqname, pos, strand, score) in rows {
        text.push_str(&format!("{seqname}\t{pos}\t{pos}\t{strand}\t{score}\n"));
    }
    let path = dir.join(format!("{name}.tsv"));
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_full_workflow() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("experiment.tsrkit");

    let rep1 = write_table(
        dir.path(),
        "rep1",
        &[
            ("chr1", 100, "+", 4.0),
            ("chr1", 110, "+", 9.0),
            ("chr1", 500, "-", 2.0),
        ],
    );
    let rep2 = write_table(dir.path(), "rep2", &[("chr1", 105, "+", 3.0), ("chr2", 50, "+", 1.0)]);

    run(
        &store,
        &["import", rep1.to_str().unwrap(), &format!("second={}", rep2.display())],
    );
    run(&store, &["cluster", "--max-distance", "25"]);
    run(&store, &["associate", "--map", "rep1=rep1", "--map", "second=second"]);
    run(&store, &["mark-dominant"]);

    let out_dir = dir.path().join("out");
    run(
        &store,
        &["export", "--data-type", "tss", "--output-dir", out_dir.to_str().unwrap()],
    );
    let rep1_tss = fs::read_to_string(out_dir.join("rep1.tss.tsv")).unwrap();
    let lines: Vec<&str> = rep1_tss.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("\tdominant"));
    assert!(lines.iter().any(|line| line.starts_with("chr1\t110\t110\t+\t9\trep1\tchr1:100:110:+") && line.ends_with("true")));
    assert!(lines.iter().any(|line| line.starts_with("chr1\t100\t100\t+\t4\t") && line.ends_with("false")));

    run(
        &store,
        &["merge", "--group-by", "rep1=all", "--group-by", "second=all", "--output", "tsr-features"],
    );
    let merged = run(&store, &["export", "--data-type", "tsr-features", "--sample", "all"]);
    let merged = String::from_utf8(merged.stdout).unwrap();
    assert!(merged.lines().any(|line| line.starts_with("chr1\t100\t110\t+\t16\t2\t11\t")));

    let stats = run(&store, &["stats"]);
    let stats = String::from_utf8(stats.stdout).unwrap();
    assert!(stats.contains("tsr\trep1\t2\t15\t6"));
    assert!(stats.contains("tsr_features\tall\t"));

    run(
        &store,
        &["associate", "--tsr-slot", "tsr-features", "--map", "all=rep1,second"],
    );
    let second = run(&store, &["export", "--data-type", "tss", "--sample", "second"]);
    let second = String::from_utf8(second.stdout).unwrap();
    assert!(second
        .lines()
        .any(|line| line.starts_with("chr1\t105\t105\t+\t3\tall\tchr1:100:110:+\t16\t11\t2\t")));
}

#[test]
fn test_invalid_parameters_fail() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("experiment.tsrkit");
    let table = write_table(dir.path(), "s1", &[("chr1", 1, "*", 1.0)]);

    let output = Command::new(tsrkit_binary())
        .args(["import", "--store"])
        .arg(&store)
        .arg(&table)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unstranded"));

    let output = Command::new(tsrkit_binary())
        .args(["cluster", "--store"])
        .arg(dir.path().join("missing.tsrkit"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}
