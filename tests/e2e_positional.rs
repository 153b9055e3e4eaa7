//! E2E tests for positional (start/middle/end) subset walks

use approx::assert_abs_diff_eq;
use dbfs_probe::sampling::positional::Walk;
use dbfs_probe::{
    run_positional, BitDepth, ExperimentConfig, SampleBuffer, SignalGenerator, SignalKind,
};

/// Loud intro, quiet remainder: the walks disagree until they see enough
fn fade_source() -> SampleBuffer {
    let mut samples: Vec<i32> = (0..2000)
        .map(|n| if n % 2 == 0 { 20000 } else { -20000 })
        .collect();
    samples.extend((0..8000).map(|n| if n % 2 == 0 { 500 } else { -500 }));
    SampleBuffer::new(samples, BitDepth::Sixteen, 1000)
}

/// Each walk covers exactly its own region under a fixed budget
#[test]
fn test_fixed_budget_regions() {
    let source = fade_source();
    let config = ExperimentConfig {
        duration_secs: 1.0,
        ..Default::default()
    };

    let report = run_positional(&source, &config).unwrap();
    assert_eq!(report.sample_cap, 1000);

    let loud = 20.0 * (20000.0f64 / 32768.0).log10();
    let quiet = 20.0 * (500.0f64 / 32768.0).log10();

    let start = report.walk(Walk::Start).unwrap();
    assert_eq!(start.samples_used, 1000);
    assert_abs_diff_eq!(start.final_dbfs, loud, epsilon = 1e-9);

    let middle = report.walk(Walk::Middle).unwrap();
    assert_abs_diff_eq!(middle.final_dbfs, quiet, epsilon = 1e-9);

    let end = report.walk(Walk::End).unwrap();
    assert_abs_diff_eq!(end.final_dbfs, quiet, epsilon = 1e-9);

    assert!(!start.converged, "Loud intro is far from the overall loudness");
}

/// Until-close walks converge independently on a stationary tone
#[test]
fn test_until_close_on_sine() {
    let source = SignalGenerator::new(
        SignalKind::Sine { frequency_hz: 100.0 },
        8000,
        BitDepth::Sixteen,
    )
    .generate(2.0)
    .unwrap();
    let config = ExperimentConfig {
        until_close: true,
        error_factor: 0.1,
        ..Default::default()
    };

    let report = run_positional(&source, &config).unwrap();
    assert_eq!(report.walks.len(), 3);
    for walk in &report.walks {
        assert!(walk.converged, "{} walk should converge", walk.walk);
        assert!((walk.final_dbfs - report.true_dbfs).abs() < 0.1);
        // One 100 Hz period is 80 samples; convergence needs at most a few
        assert!(walk.samples_used <= 400, "{} took {}", walk.walk, walk.samples_used);
    }
}

/// The overall run only ends when every walk has converged
#[test]
fn test_slowest_walk_governs_run_length() {
    let source = fade_source();
    let config = ExperimentConfig {
        until_close: true,
        error_factor: 0.5,
        keep_traces: true,
        ..Default::default()
    };

    let report = run_positional(&source, &config).unwrap();
    assert!(report.walks.iter().all(|w| w.converged));

    let counts: Vec<u64> = report.walks.iter().map(|w| w.samples_used).collect();
    assert!(
        counts.iter().any(|&c| c != counts[0]),
        "Walks starting in different regions should stop at different points: {:?}",
        counts
    );

    for walk in &report.walks {
        let trace = walk.trace.as_ref().unwrap();
        assert_eq!(trace.len() as u64, walk.samples_used);
        assert_abs_diff_eq!(
            trace.points().last().unwrap().dbfs,
            walk.final_dbfs,
            epsilon = 1e-12
        );
    }
}

/// Positional reports serialize walk names in lowercase
#[test]
fn test_report_serializes() {
    let source = fade_source();
    let report = run_positional(&source, &ExperimentConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let names: Vec<&str> = json["walks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["walk"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["start", "middle", "end"]);
}
