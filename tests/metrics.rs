#![cfg(feature = "metrics")]
//! Tests for `stomp-relay` metrics helpers.
//!
//! These tests verify that counters and gauges update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use stomp_relay::metrics::{self as relay_metrics, Direction};

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn frame_metric_increments(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || relay_metrics::inc_frames(direction));

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::FRAMES_TOTAL
            && k.key()
                .labels()
                .any(|l| l.key() == "direction" && l.value() == label)
            && matches!(v, DebugValue::Counter(c) if *c > 0)
    });
    assert!(found, "{label} frames metric not recorded");
}

#[test]
fn error_metric_increments() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, relay_metrics::inc_errors);

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::ERRORS_TOTAL
            && matches!(v, DebugValue::Counter(c) if *c > 0)
    });
    assert!(found, "error metric not recorded");
}

#[test]
fn session_gauge_tracks_open_sessions() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        relay_metrics::inc_sessions();
        relay_metrics::inc_sessions();
        relay_metrics::dec_sessions();
    });

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::SESSIONS_ACTIVE
            && matches!(v, DebugValue::Gauge(g) if g.into_inner() == 1.0)
    });
    assert!(found, "sessions gauge not at 1");
}

#[test]
fn broker_availability_gauge_is_binary() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || relay_metrics::set_broker_available(true));
    let metrics = snapshotter.snapshot().into_vec();
    assert!(metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::BROKER_AVAILABLE
            && matches!(v, DebugValue::Gauge(g) if g.into_inner() == 1.0)
    }));

    metrics::with_local_recorder(&recorder, || relay_metrics::set_broker_available(false));
    let metrics = snapshotter.snapshot().into_vec();
    assert!(metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::BROKER_AVAILABLE
            && matches!(v, DebugValue::Gauge(g) if g.into_inner() == 0.0)
    }));
}
