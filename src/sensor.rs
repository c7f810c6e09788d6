//! Face tracking sensor abstraction.
//!
//! A sensor pushes [`SensorEvent`]s into the channel it is given on
//! [`FaceSensor::run`] until it is paused. The session worker is the only
//! consumer of that channel.

use crate::{
    frame_gate::{Anchor, SensorFrame},
    pose::FacePose,
    Error, Result,
};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// Something the sensor reports
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A new frame of anchors
    Frame(SensorFrame),
    /// The sensor failed internally
    Failed(String),
    /// The sensor was interrupted (e.g. camera taken by another client)
    Interrupted,
}

/// Options passed when the sensor starts delivering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Restart tracking from scratch
    pub reset_tracking: bool,
    /// Drop anchors left over from a previous run
    pub remove_existing_anchors: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            reset_tracking: true,
            remove_existing_anchors: true,
        }
    }
}

/// Face tracking capability
pub trait FaceSensor: Send {
    /// Whether face tracking is available on this device
    fn is_supported(&self) -> bool;

    /// Start delivering events into `events`
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be started
    fn run(&mut self, events: Sender<SensorEvent>, options: RunOptions) -> Result<()>;

    /// Stop delivering events
    fn pause(&mut self);
}

/// One line of a recorded pose trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Sensor clock capture time in seconds
    pub capture_time: f64,
    /// Epoch milliseconds; replay time is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Tracked face, absent when the face was lost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FacePose>,
    /// Sensor fault message recorded at this point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl TraceRecord {
    /// Event this record replays as
    #[must_use]
    pub fn to_event(&self) -> SensorEvent {
        if let Some(fault) = &self.fault {
            return SensorEvent::Failed(fault.clone());
        }

        let anchors = self.face.iter().cloned().map(Anchor::Face).collect();
        let frame = match self.timestamp {
            Some(timestamp) => SensorFrame::with_timestamp(anchors, self.capture_time, timestamp),
            None => SensorFrame::new(anchors, self.capture_time),
        };
        SensorEvent::Frame(frame)
    }
}

/// Parse a JSON-lines trace; blank lines and `#` comments are skipped
///
/// # Errors
///
/// Returns an error naming the first line that fails to parse
pub fn parse_trace(content: &str) -> Result<Vec<TraceRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| Error::Trace(format!("line {}: {e}", idx + 1)))
        })
        .collect()
}

/// Sensor that replays a recorded trace on a background thread
pub struct ReplaySensor {
    records: Arc<Vec<TraceRecord>>,
    realtime: bool,
    stop_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ReplaySensor {
    /// Replay the given records
    #[must_use]
    pub fn new(records: Vec<TraceRecord>) -> Self {
        Self {
            records: Arc::new(records),
            realtime: false,
            stop_tx: None,
            handle: None,
        }
    }

    /// Load a JSON-lines trace from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading pose trace from {}", path.as_ref().display());
        let content = fs::read_to_string(path)?;
        let records = parse_trace(&content)?;
        info!("Loaded {} trace records", records.len());
        Ok(Self::new(records))
    }

    /// Pace events by their recorded capture times
    #[must_use]
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Number of records in the trace
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the trace is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn shutdown(&mut self) {
        // Disconnecting the stop channel wakes the replay thread
        self.stop_tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Replay thread panicked");
            }
        }
    }
}

impl FaceSensor for ReplaySensor {
    fn is_supported(&self) -> bool {
        true
    }

    fn run(&mut self, events: Sender<SensorEvent>, options: RunOptions) -> Result<()> {
        self.shutdown();

        debug!("Starting trace replay with {:?}", options);
        let (stop_tx, stop_rx) = bounded(1);

        let records = Arc::clone(&self.records);
        let realtime = self.realtime;

        let handle = thread::Builder::new()
            .name("trace-replay".to_string())
            .spawn(move || replay(&records, realtime, &stop_rx, &events))?;
        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);

        Ok(())
    }

    fn pause(&mut self) {
        self.shutdown();
    }
}

impl Drop for ReplaySensor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn replay(records: &[TraceRecord], realtime: bool, stop: &Receiver<()>, events: &Sender<SensorEvent>) {
    let started = Instant::now();
    let first_capture = records.first().map_or(0.0, |r| r.capture_time);

    for record in records {
        let wait = if realtime {
            let offset = (record.capture_time - first_capture).max(0.0);
            Duration::from_secs_f64(offset).saturating_sub(started.elapsed())
        } else {
            Duration::ZERO
        };

        // Both the pacing wait and a blocked send give way to a stop request
        select! {
            recv(stop) -> _ => {
                debug!("Trace replay stopped");
                return;
            }
            default(wait) => {}
        }

        select! {
            send(events, record.to_event()) -> sent => {
                if sent.is_err() {
                    debug!("Event channel closed, ending replay");
                    return;
                }
            }
            recv(stop) -> _ => {
                debug!("Trace replay stopped");
                return;
            }
        }
    }

    debug!("Trace replay finished");
}
