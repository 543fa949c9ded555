//! Timeline reconciliation against real WAV files

mod helpers;

use helpers::{generate_segment, SegmentConfig};
use partypower_hl::models::ValidAudioRange;
use partypower_hl::services::{MergeStatus, TimelineReconciler};
use std::path::PathBuf;

fn segment(dir: &std::path::Path, start_epoch: f64, duration_seconds: f64, sample_rate: u32) -> PathBuf {
    generate_segment(
        dir,
        &SegmentConfig {
            start_epoch,
            duration_seconds,
            sample_rate,
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn test_three_segments_with_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        segment(dir.path(), 1400.0, 100.0, 1_000),
        segment(dir.path(), 1000.0, 100.0, 1_000),
        segment(dir.path(), 1150.0, 100.0, 1_000),
    ];

    let reconciler = TimelineReconciler::new();
    let segments = reconciler.discover_segments(&paths);
    assert_eq!(segments.len(), 3);

    let outcome = reconciler.merge(&segments);
    assert_eq!(outcome.status, MergeStatus::Merged { skipped: 0 });
    assert_eq!(
        outcome.valid_ranges,
        vec![
            ValidAudioRange::new(0.0, 100.0),
            ValidAudioRange::new(150.0, 250.0),
            ValidAudioRange::new(400.0, 500.0),
        ]
    );
    assert_eq!(outcome.origin_epoch, 1000.0);

    let timeline = outcome.timeline.unwrap();
    assert_eq!(timeline.sample_rate, 1_000);
    assert_eq!(timeline.samples.len(), 500 * 1_000);
    // Gap between first and second segment is silent
    assert!(timeline.samples[120_000..130_000].iter().all(|&s| s == 0.0));
    assert!(timeline.samples[150_000..160_000].iter().any(|&s| s != 0.0));
}

#[test]
fn test_single_segment_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = segment(dir.path(), 1_700_000_000.0, 12.5, 2_000);

    let reconciler = TimelineReconciler::new();
    let segments = reconciler.discover_segments(&[path]);
    let outcome = reconciler.merge(&segments);

    assert_eq!(outcome.status, MergeStatus::Single);
    assert_eq!(outcome.valid_ranges, vec![ValidAudioRange::new(0.0, 12.5)]);
    assert_eq!(outcome.total_duration, 12.5);
    let timeline = outcome.timeline.unwrap();
    assert!((timeline.duration_secs() - 12.5).abs() < 1e-9);
}

#[test]
fn test_mixed_sample_rates_resampled_to_first() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        segment(dir.path(), 0.5e9, 4.0, 2_000),
        segment(dir.path(), 0.5e9 + 10.0, 4.0, 4_000),
    ];

    let reconciler = TimelineReconciler::new();
    let segments = reconciler.discover_segments(&paths);
    let outcome = reconciler.merge(&segments);

    let timeline = outcome.timeline.unwrap();
    assert_eq!(timeline.sample_rate, 2_000);
    // 14 s at 2 kHz; resampler output length may differ by a few frames
    let expected = 14 * 2_000;
    assert!((timeline.samples.len() as i64 - expected as i64).abs() < 200);
}

#[test]
fn test_unreadable_files_skipped_at_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let good = segment(dir.path(), 2000.0, 5.0, 1_000);
    let corrupt = dir.path().join("audio_2100.wav");
    std::fs::write(&corrupt, b"definitely not audio").unwrap();
    let unnamed = dir.path().join("recording.wav");
    std::fs::copy(&good, &unnamed).unwrap();

    let reconciler = TimelineReconciler::new();
    let segments = reconciler.discover_segments(&[good, corrupt, unnamed]);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start_timestamp, 2000.0);
}

#[test]
fn test_export_to_unwritable_location_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        segment(dir.path(), 3000.0, 5.0, 1_000),
        segment(dir.path(), 3010.0, 5.0, 1_000),
    ];

    let reconciler = TimelineReconciler::new();
    let segments = reconciler.discover_segments(&paths);
    let output = dir.path().join("missing-dir").join("merged.wav");
    let outcome = reconciler.merge_and_export(&segments, &output);

    assert!(matches!(outcome.status, MergeStatus::Degraded { .. }));
    assert_eq!(outcome.valid_ranges, vec![ValidAudioRange::new(0.0, 5.0)]);
    assert!(outcome.timeline.is_some());
    assert!(!output.exists());
}
