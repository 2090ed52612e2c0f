//! Background sampling of a temperature source.
//!
//! A collector thread takes one reading per sample period and sends it over
//! a channel. Readings arrive in the order they were taken, so every sample
//! of window N is consumed before window N+1 is classified. The first read
//! failure is forwarded and ends the thread. Only the thread holds the
//! sender, so the channel disconnects once the thread exits.

use crate::sensor::{SensorError, TemperatureSource};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// A single timestamped reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub celsius: f64,
    pub timestamp: DateTime<Utc>,
}

/// What the collector thread sends.
pub type CollectorEvent = Result<Reading, SensorError>;

/// Collector settings.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Time between readings (one second per sample in normal operation)
    pub sample_period: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_secs(1),
        }
    }
}

/// Errors that can occur when starting collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    ThreadSpawn(String),
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::ThreadSpawn(e) => write!(f, "Could not start collector thread: {e}"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// Samples a source on a background thread.
pub struct Collector {
    config: CollectorConfig,
    source: Option<Box<dyn TemperatureSource>>,
    /// Moved into the thread on `start`
    sender: Option<Sender<CollectorEvent>>,
    receiver: Receiver<CollectorEvent>,
    stop: Option<Sender<()>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Collector {
    /// Create a new collector for `source`.
    pub fn new(source: Box<dyn TemperatureSource>, config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(1_024);
        Self {
            config,
            source: Some(source),
            sender: Some(sender),
            receiver,
            stop: None,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start sampling. A collector can only be started once.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        let (mut source, sender) = match (self.source.take(), self.sender.take()) {
            (Some(source), Some(sender)) => (source, sender),
            _ => return Err(CollectorError::AlreadyRunning),
        };

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let running = self.running.clone();
        let period = self.config.sample_period;

        running.store(true, Ordering::SeqCst);
        let handle = std::thread::Builder::new()
            .name("temper-collector".to_string())
            .spawn(move || {
                tracing::debug!("Collector started on {}", source.name());
                loop {
                    let event = source.read_celsius().map(|celsius| Reading {
                        celsius,
                        timestamp: Utc::now(),
                    });
                    let failed = event.is_err();
                    // A full channel must not keep the thread from seeing a stop.
                    let sent = select! {
                        send(sender, event) -> res => res.is_ok(),
                        recv(stop_rx) -> _ => false,
                    };
                    if !sent || failed {
                        break;
                    }
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                running.store(false, Ordering::SeqCst);
                tracing::debug!("Collector stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CollectorError::ThreadSpawn(e.to_string())
            })?;

        self.stop = Some(stop_tx);
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop sampling and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Dropping the stop sender wakes the thread as well.
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the collector thread is still sampling.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for readings.
    pub fn receiver(&self) -> &Receiver<CollectorEvent> {
        &self.receiver
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop();
    }
}
