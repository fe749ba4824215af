use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const FEATURES: &str = "tests/data/features.gff3";
const ANNOVAR_DIR: &str = "tests/data/annovar";

const MULTIPLE_MATRIX: &str = "Gene\tS1\tS2\tS3\n\
    geneA\tmissense\twildtype\twildtype\n\
    geneB\twildtype\tsilent\tnonstop\n\
    geneC\tnonsense\twildtype\twildtype\n";

const BINARY_MATRIX: &str = "Gene\tS1\tS2\tS3\n\
    geneA\tmutated\twildtype\twildtype\n\
    geneB\twildtype\twildtype\tmutated\n\
    geneC\tmutated\twildtype\twildtype\n";

fn muggwas() -> Command {
    Command::cargo_bin("muggwas").unwrap()
}

#[test]
fn test_compile_directory_multiple() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("gene_mutations.tsv");

    muggwas()
        .arg("compile")
        .args(["--features", FEATURES])
        .args(["--annotation-dir", ANNOVAR_DIR])
        .args(["--mode", "multiple"])
        .args(["-t", "2"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap(), MULTIPLE_MATRIX);
}

#[test]
fn test_compile_files_default_binary() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("gene_mutations.tsv");

    muggwas()
        .arg("compile")
        .args(["--features", FEATURES])
        .arg("-o")
        .arg(&output)
        .args([
            "tests/data/annovar/cohort.S1.avinput.exonic_variant_function",
            "tests/data/annovar/cohort.S2.avinput.exonic_variant_function",
            "tests/data/annovar/cohort.S3.avinput.exonic_variant_function",
        ])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap(), BINARY_MATRIX);
}

#[test]
fn test_compile_malformed_sample_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("gene_mutations.tsv");

    muggwas()
        .arg("compile")
        .args(["--features", FEATURES])
        .arg("-o")
        .arg(&output)
        .arg("--keep-going")
        .args([
            "tests/data/annovar/cohort.S1.avinput.exonic_variant_function",
            "tests/data/malformed.S9.avinput.exonic_variant_function",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("S9"));

    assert!(!output.exists());
}

#[test]
fn test_compile_requires_input() {
    let dir = TempDir::new().unwrap();

    muggwas()
        .arg("compile")
        .args(["--features", FEATURES])
        .arg("-o")
        .arg(dir.path().join("out.tsv"))
        .assert()
        .failure();
}

#[test]
fn test_compile_missing_features() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.tsv");

    muggwas()
        .arg("compile")
        .args(["--features", "tests/data/does_not_exist.gff3"])
        .args(["--annotation-dir", ANNOVAR_DIR])
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist.gff3"));

    assert!(!output.exists());
}

#[test]
fn test_presence_from_compiled_matrix() {
    let dir = TempDir::new().unwrap();
    let matrix = dir.path().join("gene_mutations.tsv");
    fs::write(
        &matrix,
        format!("{}geneD\twildtype\twildtype\twildtype\n", MULTIPLE_MATRIX),
    )
    .unwrap();

    muggwas().arg("presence").arg(&matrix).assert().success();

    let presence = dir.path().join("gene_mutations_filtered_numeric.txt");
    assert_eq!(
        fs::read_to_string(presence).unwrap(),
        "Gene\tS1\tS2\tS3\ngeneA\t1\t0\t0\ngeneB\t0\t1\t1\ngeneC\t1\t0\t0\n"
    );
}

#[test]
fn test_rename_contigs() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("renamed.vcf");

    muggwas()
        .arg("rename-contigs")
        .args(["-i", "tests/data/vcf/sample.vcf"])
        .arg("-o")
        .arg(&output)
        .args(["-c", "chr"])
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("##contig=<ID=chr,length=5000>"));
    assert!(!content.contains("NZ_CP009072.1"));
    assert_eq!(
        content
            .lines()
            .filter(|l| !l.starts_with('#'))
            .filter(|l| l.starts_with("chr\t"))
            .count(),
        2
    );
}

#[test]
fn test_rename_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("renamed.vcf");

    muggwas()
        .arg("rename-contigs")
        .args(["-i", "tests/data/vcf/sample.vcf"])
        .arg("-o")
        .arg(&output)
        .args(["-c", "chr 1"])
        .assert()
        .failure();

    assert!(!Path::new(&output).exists());
}

#[test]
fn test_markdown_help() {
    muggwas()
        .arg("--markdown-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rename-contigs"));
}
