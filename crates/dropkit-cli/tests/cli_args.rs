//! Argument parsing and full runs of both entry points.

use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::Parser;
use dropkit_cli::{run_counts, run_filter, CountsArgs, FilterArgs};
use dropkit_config::Config;
use dropkit_counts::Strandedness;
use dropkit_outliers::PanelChoice;
use dropkit_test_utils::{expression_tsv, gtf_line, read_gz, star_counts, ExpressionRow, Fixture};
use pretty_assertions::assert_eq;

fn counts_argv<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut argv = vec![
        "drop-counts",
        "--star", "A.tab", "B.tab",
        "--samples", "A", "B",
        "--strandedness", "forward", "reverse",
        "--output", "geneCounts.tsv.gz",
        "--gtf", "annotation.gtf",
    ];
    argv.extend_from_slice(extra);
    argv
}

#[test]
fn test_counts_args_parse_and_build_request() {
    let args = CountsArgs::try_parse_from(counts_argv(&["--ref_count_file", "None", "--outdir", "out"])).unwrap();
    args.validate().unwrap();

    let request = args.to_request(&Config::default());

    assert_eq!(request.inputs.len(), 2);
    assert_eq!(request.inputs[1].sample.as_str(), "B");
    assert_eq!(request.inputs[1].strandedness, Strandedness::Reverse);
    assert_eq!(request.reference, None);
    assert_eq!(request.output, Path::new("out/geneCounts.tsv.gz"));
    assert_eq!(request.gzip_level, 6);
}

#[test]
fn test_counts_reference_path_is_kept() {
    let args = CountsArgs::try_parse_from(counts_argv(&["--ref_count_file", "ref.tsv.gz"])).unwrap();
    let request = args.to_request(&Config::default());
    assert_eq!(request.reference, Some(PathBuf::from("ref.tsv.gz")));
    assert_eq!(request.output, Path::new("./geneCounts.tsv.gz"));
}

#[test]
fn test_mismatched_sample_lists_are_usage_errors() {
    let argv = vec![
        "drop-counts",
        "--star", "A.tab", "B.tab",
        "--samples", "A",
        "--strandedness", "forward", "forward",
        "--output", "out.tsv.gz",
        "--gtf", "annotation.gtf",
    ];
    let args = CountsArgs::try_parse_from(argv).unwrap();
    let err = args.validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongNumberOfValues);
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_unknown_strandedness_is_rejected_by_the_parser() {
    let mut argv = counts_argv(&[]);
    argv[8] = "sideways";
    assert!(CountsArgs::try_parse_from(argv).is_err());
}

#[test]
fn test_filter_args_defaults_and_sentinels() {
    let args = FilterArgs::try_parse_from([
        "drop-filter-results",
        "--samples", "S1", "S2",
        "--drop_ae_rds", "None",
        "--out_drop_gene_name", "None",
        "--out_drop_as_tsv", "fraser.tsv",
    ])
    .unwrap();
    args.validate().unwrap();
    assert_eq!(args.gene_panel, PanelChoice::NoPanel);

    let request = args.to_request(&Config::default());
    assert!(request.expression.is_none());
    assert_eq!(request.splicing, Some(PathBuf::from("fraser.tsv")));
    assert_eq!(request.top_hits, 20);
    assert_eq!(request.samples.len(), 2);
}

#[test]
fn test_filter_expression_inputs_must_come_together() {
    let args = FilterArgs::try_parse_from([
        "drop-filter-results",
        "--samples", "S1",
        "--drop_ae_rds", "results.tsv",
    ])
    .unwrap();
    assert_eq!(args.validate().unwrap_err().kind(), ErrorKind::MissingRequiredArgument);

    let args = FilterArgs::try_parse_from(["drop-filter-results", "--samples", "S1"]).unwrap();
    assert!(args.validate().is_err());
}

#[test]
fn test_version_flag() {
    let err = CountsArgs::try_parse_from(["drop-counts", "--version"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    assert_eq!(err.exit_code(), 0);
    assert_eq!(err.to_string().trim(), "drop-counts v1.0");

    let err = FilterArgs::try_parse_from(["drop-filter-results", "--version"]).unwrap_err();
    assert_eq!(err.to_string().trim(), "drop-filter-results v1.0");
}

#[test]
fn test_run_counts_writes_matrix_and_report() {
    let fx = Fixture::new();
    let a = fx.write("A.tab", &star_counts(&[("g1", 9, 4, 5), ("g2", 3, 1, 2)]));
    let gtf = fx.write("annotation.gtf", &gtf_line("chr1", "g1"));
    let config = fx.write("dropkit.toml", "[output]\ngzip_level = 1\n");
    let out = fx.path("out");
    let audit = fx.path("counts.json");

    let args = CountsArgs::try_parse_from([
        "drop-counts",
        "--star", a.to_str().unwrap(),
        "--samples", "A",
        "--strandedness", "unstranded",
        "--output", "nested/geneCounts.tsv.gz",
        "--gtf", gtf.to_str().unwrap(),
        "--ref_count_file", "None",
        "--config", config.to_str().unwrap(),
        "--outdir", out.to_str().unwrap(),
        "--audit", audit.to_str().unwrap(),
    ])
    .unwrap();
    run_counts(&args).unwrap();

    assert_eq!(
        read_gz(&out.join("nested/geneCounts.tsv.gz")),
        "geneID\tA\ng1\t9\ng2\t3\n"
    );
    assert!(fx.read("counts.json").contains("\"genes_written\": 2"));
}

#[test]
fn test_run_filter_with_missing_config_fails() {
    let fx = Fixture::new();
    let args = FilterArgs::try_parse_from([
        "drop-filter-results",
        "--samples", "S1",
        "--out_drop_as_tsv", "fraser.tsv",
        "--config", fx.path("missing.toml").to_str().unwrap(),
    ])
    .unwrap();
    assert!(run_filter(&args).is_err());
}

#[test]
fn test_run_filter_expression_end_to_end() {
    let fx = Fixture::new();
    let results = fx.write(
        "OUTRIDER_results_all.tsv",
        &expression_tsv(&[
            ExpressionRow::new("S1", "ENSG1", 0.2, false),
            ExpressionRow::new("S1", "ENSG2", 0.01, true),
            ExpressionRow::new("S2", "ENSG1", 0.001, true),
        ]),
    );
    let names = fx.write("gene_name_mapping.csv", "gene_id,gene_name\nENSG1,TTN\nENSG2,DMD\n");
    let out = fx.path("out");

    let args = FilterArgs::try_parse_from([
        "drop-filter-results",
        "--samples", "S1",
        "--drop_ae_rds", results.to_str().unwrap(),
        "--out_drop_gene_name", names.to_str().unwrap(),
        "--outdir", out.to_str().unwrap(),
    ])
    .unwrap();
    args.validate().unwrap();
    run_filter(&args).unwrap();

    let written = fx.read("out/OUTRIDER_provided_samples_top_hits.tsv");
    let genes: Vec<&str> = written.lines().skip(1).map(|l| l.split('\t').nth(2).unwrap()).collect();
    assert_eq!(genes, vec!["ENSG2", "ENSG1"]);
    assert!(!out.join("OUTRIDER_provided_samples_top_hits_filtered.tsv").exists());
}
