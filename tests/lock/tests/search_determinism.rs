//! In-process determinism of the canonical segmentation: identical inputs
//! give byte-identical traces, reports and digests.

use branchcut_harness::runner::segment;
use branchcut_search::StrategyV1;
use lock_tests::canonical_search::{canonical_config, canonical_image, canonical_run};

#[test]
fn search_determinism_inproc_n10() {
    for strategy in [StrategyV1::BestFirst, StrategyV1::DepthFirst] {
        let first = canonical_run(strategy);
        let first_trace = first.trace.to_canonical_json_bytes().unwrap();
        let first_report = first.report.to_canonical_json_bytes().unwrap();

        for i in 1..10 {
            let run = canonical_run(strategy);
            assert_eq!(
                run.trace.to_canonical_json_bytes().unwrap(),
                first_trace,
                "{strategy:?}: trace bytes differ on run {i}"
            );
            assert_eq!(
                run.report.to_canonical_json_bytes().unwrap(),
                first_report,
                "{strategy:?}: report bytes differ on run {i}"
            );
        }
    }
}

#[test]
fn report_binds_trace_and_config_digests() {
    for strategy in [StrategyV1::BestFirst, StrategyV1::DepthFirst] {
        let run = canonical_run(strategy);
        assert_eq!(run.report.trace_digest, run.trace.digest().unwrap());
        assert_eq!(run.report.evaluations, run.trace.metadata.total_evaluations);
        assert!(run.report.optimal);
        assert_eq!(
            run.trace.metadata.best_bound.finite(),
            Some(run.report.energy)
        );
    }
}

#[test]
fn strategies_differ_in_digests_but_not_energy() {
    let best_first = canonical_run(StrategyV1::BestFirst);
    let depth_first = canonical_run(StrategyV1::DepthFirst);
    assert_ne!(best_first.report.config_digest, depth_first.report.config_digest);
    assert_ne!(best_first.report.trace_digest, depth_first.report.trace_digest);
    assert_eq!(best_first.report.energy, depth_first.report.energy);
}

#[test]
fn lambda_changes_the_digests() {
    let image = canonical_image();
    let base = canonical_config(StrategyV1::BestFirst);
    let stiffer = branchcut_harness::config::SegmentationConfig {
        lambda: base.lambda * 5,
        ..base.clone()
    };
    let a = segment(&image, &base).unwrap();
    let b = segment(&image, &stiffer).unwrap();
    assert_ne!(a.report.config_digest, b.report.config_digest);
    assert_ne!(a.report.trace_digest, b.report.trace_digest);
}

#[test]
fn canonical_segmentation_finds_the_bright_block() {
    let run = canonical_run(StrategyV1::BestFirst);
    let foreground: Vec<usize> = run
        .report
        .labeling
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == branchcut_kernel::grid::Label::Foreground)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(foreground, vec![6, 7, 8, 11, 12, 13]);
    assert!(run.report.c_b < 40 && run.report.c_f > 180);
}
