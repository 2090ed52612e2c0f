//! Demonstration of a complete monitoring session without hardware.
//!
//! This example shows how to:
//! 1. Build a validated configuration from untyped settings
//! 2. Drive the monitor from a simulated oven on a collector thread
//! 3. Print the per-window status lines and the final report
//!
//! Run with: cargo run --example replay_demo

use std::time::Duration;

use temper_sanitizer::{
    BakeMonitor, Collector, CollectorConfig, Config, EndReason, Settings, SimulatedSensor,
    TickOutcome, WriteSink,
};

fn main() {
    println!("Temper Sanitizer - Replay Demo");
    println!("==============================");
    println!();

    // 60°C for 30 seconds, judged on 5-second windows
    let settings = Settings {
        target: 60.0,
        scale: "celcius".to_string(),
        interval: 5,
        min_time: 30,
        compare_op: ">=".to_string(),
        use_stat: "min".to_string(),
        ..Settings::default()
    };
    let config = match Config::try_from(settings) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid settings: {e}");
            return;
        }
    };

    let oven = SimulatedSensor::new(20.0, 63.0).with_time_constant(8.0);
    let mut collector = Collector::new(
        Box::new(oven),
        CollectorConfig {
            sample_period: Duration::from_millis(20),
        },
    );
    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        return;
    }

    let mut monitor = BakeMonitor::new(&config);
    let mut out = WriteSink::stdout();
    let receiver = collector.receiver().clone();

    let end_reason = loop {
        match receiver.recv_timeout(Duration::from_secs(1)) {
            Ok(Ok(reading)) => {
                if monitor.feed(reading.celsius, reading.timestamp, &mut out)
                    == TickOutcome::SessionComplete
                {
                    break EndReason::Completed;
                }
            }
            Ok(Err(e)) => break monitor.read_failed(e, chrono::Utc::now()).end_reason(),
            Err(_) => break EndReason::Interrupted,
        }
    };
    collector.stop();

    let stats = monitor.stats().clone();
    let report = monitor.finish(end_reason);
    println!();
    for line in report.lines() {
        println!("{line}");
    }
    println!();
    println!("{}", stats.summary());
}
