//! Runs of the `gbtracks` binary.

use std::process::Command;

fn gbtracks() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gbtracks"))
}

#[test]
fn test_assembly_command() {
    let output = gbtracks()
        .args(["assembly", "tests_data/assembly.bed"])
        .output()
        .expect("gbtracks failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "chr1\t0\t20000\nchr2\t0\t10000\nchrX\t0\t5000\n");

    let output = gbtracks()
        .args(["assembly", "--bands", "GRCh38"])
        .output()
        .expect("gbtracks failed to run");
    let bands: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(bands["chr1"][0][1], 248956422);
}

#[test]
fn test_assembly_command_unknown_name() {
    let output = gbtracks()
        .args(["assembly", "hg99"])
        .output()
        .expect("gbtracks failed to run");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("hg99"));
    assert!(stderr.contains("GRCh38"));
}

#[test]
fn test_load_command() {
    let dir = tempfile::tempdir().unwrap();
    let outdir = dir.path().join("out");
    let sequences = dir.path().join("sequences");
    let output = gbtracks()
        .args(["load", "--assembly", "tests_data/assembly.bed"])
        .args(["tests_data/example.gff3", "tests_data/example.vcf", "tests_data/example.fa"])
        .arg("--outdir")
        .arg(&outdir)
        .arg("--sequences")
        .arg(&sequences)
        .args(["--show", "DP", "--remove", "CDS"])
        .output()
        .expect("gbtracks failed to run");
    assert!(output.status.success());

    let tracks = std::fs::read_to_string(outdir.join("tracks.tsv")).unwrap();
    let names: Vec<_> = tracks
        .lines()
        .map(|line| line.split('\t').nth(1).unwrap())
        .collect();
    assert_eq!(names, vec!["gene", "mRNA", "example.vcf", "NA00001", "NA00002"]);
    assert!(tracks.contains(r#""show":["DP"]"#));

    let genes = std::fs::read_to_string(outdir.join("genes.tsv")).unwrap();
    assert_eq!(genes.lines().count(), 3);
    let chr2 = std::fs::read_to_string(sequences.join("chr2.fa")).unwrap();
    assert_eq!(chr2, ">chr2\nTTTTGGGG\n");
}

#[test]
fn test_genomemap_command() {
    let output = gbtracks()
        .args(["genomemap", "--assembly", "tests_data/assembly.bed"])
        .args(["--values", "tests_data/example.bed"])
        .output()
        .expect("gbtracks failed to run");
    assert!(output.status.success());
    let map: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(map["chromosomes"], serde_json::json!(["chr1", "chr2", "chrX"]));
    assert_eq!(map["max"], 20000);
    assert_eq!(map["data"]["chr1"][0], serde_json::json!([1000, 5000, 0.0]));
    assert_eq!(map["dataDomain"], serde_json::json!([0.0, 0.0]));
}
