//! End-to-end collation from aligner count files to the compressed matrix.

use dropkit_common::{DropkitError, SampleId};
use dropkit_counts::{collate_counts, CollateRequest, CountMatrix, SampleInput, Strandedness};
use dropkit_test_utils::{gtf_line, read_gz, star_counts, Fixture};
use pretty_assertions::assert_eq;

fn two_sample_request(fx: &Fixture) -> CollateRequest {
    let a = fx.write(
        "A.ReadsPerGene.out.tab",
        &star_counts(&[("g1", 100, 40, 60), ("g2", 50, 20, 30), ("g3", 9, 8, 1)]),
    );
    let b = fx.write(
        "B.ReadsPerGene.out.tab",
        &star_counts(&[("g1", 101, 41, 61), ("g2", 51, 21, 31), ("g3", 7, 6, 1)]),
    );
    let gtf = fx.write(
        "annotation.gtf",
        &[
            "#!genome-build GRCh38\n".to_string(),
            gtf_line("chr1", "g1"),
            gtf_line("chrM", "g2"),
            gtf_line("chr19_KI270938v1_alt", "g3"),
        ]
        .concat(),
    );

    CollateRequest {
        inputs: vec![
            SampleInput {
                sample: SampleId::new("A"),
                counts_path: a,
                strandedness: Strandedness::Forward,
            },
            SampleInput {
                sample: SampleId::new("B"),
                counts_path: b,
                strandedness: Strandedness::Forward,
            },
        ],
        annotation: gtf,
        reference: None,
        output: fx.path("geneCounts.tsv.gz"),
        gzip_level: 6,
    }
}

#[test]
fn test_two_forward_samples_exclude_non_standard_gene() {
    let fx = Fixture::new();
    let request = two_sample_request(&fx);

    let summary = collate_counts(&request).unwrap();

    assert_eq!(summary.genes_written, 2);
    assert_eq!(summary.columns_written, 2);
    assert_eq!(
        read_gz(&request.output),
        "geneID\tA\tB\ng1\t40\t41\ng2\t20\t21\n"
    );
}

#[test]
fn test_mixed_strandedness_per_sample() {
    let fx = Fixture::new();
    let mut request = two_sample_request(&fx);
    request.inputs[1].strandedness = Strandedness::Reverse;

    collate_counts(&request).unwrap();

    let matrix = CountMatrix::read(&request.output).unwrap();
    assert_eq!(matrix.get("g1", "A"), Some(40));
    assert_eq!(matrix.get("g1", "B"), Some(61));
}

#[test]
fn test_reference_matrix_is_merged_before_exclusion() {
    let fx = Fixture::new();
    let mut request = two_sample_request(&fx);
    request.reference = Some(fx.write_gz(
        "reference.tsv.gz",
        "geneID\tREF1\ng1\t5.0\ng3\t2\ng7\t1\n",
    ));

    collate_counts(&request).unwrap();

    assert_eq!(
        read_gz(&request.output),
        "geneID\tA\tB\tREF1\ng1\t40\t41\t5\ng2\t20\t21\t\ng7\t\t\t1\n"
    );
}

#[test]
fn test_excluding_unknown_gene_fails_without_output() {
    let fx = Fixture::new();
    let mut request = two_sample_request(&fx);
    request.annotation = fx.write("annotation.gtf", &gtf_line("chrUn_GL000220v1", "g404"));

    let err = collate_counts(&request).unwrap_err();

    assert!(matches!(err, DropkitError::ExcludedGeneAbsent(ref g) if g == "g404"));
    assert!(!request.output.exists());
    assert!(!fx.list().iter().any(|name| name.ends_with(".partial")));
}

#[test]
fn test_unparseable_counts_abort_the_run() {
    let fx = Fixture::new();
    let mut request = two_sample_request(&fx);
    request.inputs[0].counts_path = fx.write("A.ReadsPerGene.out.tab", "g1\t1\tmany\t1\n");

    assert!(matches!(
        collate_counts(&request).unwrap_err(),
        DropkitError::Parse { .. }
    ));
    assert!(!request.output.exists());
}
