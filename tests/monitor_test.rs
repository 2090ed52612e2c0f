//! Integration tests for a full monitoring session

use chrono::Utc;
use std::time::Duration;
use temper_sanitizer::{
    BakeMonitor, Collector, CollectorConfig, Comparison, Config, EndReason, ReplaySensor, Scale,
    SensorError, Settings, Statistic, TickOutcome,
};

fn bake_config() -> Config {
    Config::try_from(Settings {
        target: 70.0,
        scale: "c".to_string(),
        interval: 2,
        min_time: 4,
        compare_op: ">=".to_string(),
        use_stat: "average".to_string(),
        ..Settings::default()
    })
    .expect("valid settings")
}

#[test]
fn test_session_completes_on_threshold_window() {
    let config = bake_config();
    let mut monitor = BakeMonitor::new(&config);
    let mut sensor = ReplaySensor::new([71.0, 72.0, 73.0, 74.0, 69.0, 68.0, 75.0, 76.0, 77.0, 78.0]);
    let mut lines: Vec<String> = Vec::new();

    let mut ticks = 0;
    loop {
        ticks += 1;
        match monitor.tick(&mut sensor, &mut lines).expect("reading") {
            TickOutcome::Continue => continue,
            TickOutcome::SessionComplete => break,
        }
    }

    // Promoted when window 2 brings the interval to 4 seconds
    assert_eq!(ticks, 4);
    assert_eq!(sensor.remaining(), 6);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("#(>= 70) Last 2 second(s) avg:71.5; min:71"));
    assert!(lines[1].starts_with("#(>= 70) Last 2 second(s) avg:73.5; min:73"));
    assert!(lines[1].ends_with("# prebake_mins:0"));
    assert_eq!(lines[2], "#Bake is finished: ");

    let report = monitor.finish(EndReason::Completed);
    assert!(report.is_success());
    assert_eq!(report.complete.len(), 1);
    assert_eq!(report.complete[0].temperatures, vec![71.5, 73.5]);
    assert_eq!(report.complete[0].elapsed_secs, 4);
    assert!(report.incomplete.is_empty());
    assert!(report.in_progress.is_none());
    assert_eq!(report.stats.samples, 4);
    assert_eq!(report.stats.windows_closed, 2);
    assert_eq!(report.stats.qualifying_windows, 2);
}

#[test]
fn test_incomplete_intervals_are_reported() {
    let config = Config {
        min_total_secs: 6,
        ..bake_config()
    };
    let mut monitor = BakeMonitor::new(&config);
    // qualify, qualify, break, qualify x3
    let mut sensor = ReplaySensor::new([
        71.0, 72.0, 73.0, 74.0, 60.0, 60.0, 75.0, 76.0, 77.0, 78.0, 79.0, 80.0,
    ]);
    let mut lines: Vec<String> = Vec::new();

    while monitor.tick(&mut sensor, &mut lines).expect("reading") == TickOutcome::Continue {}

    let report = monitor.finish(EndReason::Completed);
    assert_eq!(report.incomplete.len(), 1);
    assert_eq!(report.incomplete[0].temperatures, vec![71.5, 73.5]);
    assert_eq!(report.incomplete[0].elapsed_secs, 4);
    assert_eq!(report.complete.len(), 1);
    assert_eq!(report.complete[0].temperatures, vec![75.5, 77.5, 79.5]);
    assert_eq!(report.stats.intervals_incomplete, 1);
    assert_eq!(report.stats.intervals_completed, 1);

    let text = report.lines();
    assert!(text.contains(&"complete_bakes: 1".to_string()));
    assert!(text.contains(&"incomplete_bakes: 1".to_string()));
}

#[test]
fn test_collector_feeds_monitor_in_order() {
    let config = Config {
        statistic: Statistic::Minimum,
        comparison: Comparison::LessOrEqual,
        target: 4.0,
        scale: Scale::Celsius,
        interval_secs: 3,
        min_total_secs: 6,
        ..Config::default()
    };
    let mut monitor = BakeMonitor::new(&config);
    let source = Box::new(ReplaySensor::new([3.0, 3.5, 3.9, 4.0, 2.0, 3.0]));
    let mut collector = Collector::new(
        source,
        CollectorConfig {
            sample_period: Duration::from_millis(1),
        },
    );
    collector.start().expect("collector starts");

    let receiver = collector.receiver().clone();
    let mut lines: Vec<String> = Vec::new();
    let outcome = loop {
        let event = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("reading arrives");
        let reading = event.expect("reading succeeds");
        let outcome = monitor.feed(reading.celsius, reading.timestamp, &mut lines);
        if outcome == TickOutcome::SessionComplete {
            break outcome;
        }
    };
    collector.stop();

    assert_eq!(outcome, TickOutcome::SessionComplete);
    assert_eq!(lines.last().map(String::as_str), Some("#Chill is finished: "));
    let report = monitor.finish(EndReason::Completed);
    assert_eq!(report.complete[0].temperatures, vec![3.0, 2.0]);
}

#[test]
fn test_read_failure_mid_session() {
    let config = Config {
        min_total_secs: 100,
        ..bake_config()
    };
    let mut monitor = BakeMonitor::new(&config);
    let mut sensor = ReplaySensor::new([80.0, 80.0, 80.0]);
    let mut lines: Vec<String> = Vec::new();

    let err = loop {
        match monitor.tick(&mut sensor, &mut lines) {
            Ok(_) => continue,
            Err(e) => break e,
        }
    };

    let reason = err.end_reason();
    match &reason {
        EndReason::ReadFailed {
            message,
            bake_seconds,
            at,
        } => {
            assert_eq!(message, &SensorError::Exhausted.to_string());
            assert_eq!(*bake_seconds, 2);
            assert!(*at <= Utc::now());
        }
        other => panic!("unexpected end reason {other:?}"),
    }

    let report = monitor.finish(reason);
    assert!(!report.is_success());
    // The odd third sample never closed a window
    assert_eq!(report.stats.samples, 3);
    assert_eq!(report.stats.windows_closed, 1);
}

#[test]
fn test_report_export_round_trip() {
    let config = bake_config();
    let mut monitor = BakeMonitor::new(&config);
    let mut lines: Vec<String> = Vec::new();
    let now = Utc::now();
    for value in [71.0, 72.0, 73.0, 74.0] {
        monitor.feed(value, now, &mut lines);
    }
    let report = monitor.finish(EndReason::Completed);

    let dir = std::env::temp_dir().join("temper-sanitizer-export-test");
    let path = report.export(&dir).expect("export succeeds");
    let content = std::fs::read_to_string(&path).expect("report written");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");

    assert_eq!(value["mode"], "bake");
    assert_eq!(value["end_reason"]["kind"], "completed");
    assert_eq!(value["criterion"]["comparison"], ">=");
    assert_eq!(value["criterion"]["statistic"], "average");
    assert_eq!(value["complete"][0]["elapsed_secs"], 4);

    let parsed: temper_sanitizer::SessionReport =
        serde_json::from_str(&content).expect("report parses");
    assert_eq!(parsed, report);

    let _ = std::fs::remove_file(&path);
}
