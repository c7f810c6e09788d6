//! End-to-end replay of recorded traces through a tracking session


use crossbeam_channel::unbounded;
use gaze_estimation::{
    config::Config,
    frame::GazeFrame,
    sensor::{parse_trace, ReplaySensor, TraceRecord},
    session::GazeTracker,
    Error,
};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use test_helpers::*;

fn record(capture_time: f64, timestamp: i64) -> TraceRecord {
    TraceRecord {
        capture_time,
        timestamp: Some(timestamp),
        face: Some(eyes_forward_pose()),
        fault: None,
    }
}

fn write_trace(records: &[TraceRecord]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# recorded session").unwrap();
    for record in records {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
        writeln!(file).unwrap();
    }
    file.flush().unwrap();
    file
}

fn collect(rx: &crossbeam_channel::Receiver<GazeFrame>, count: usize) -> Vec<GazeFrame> {
    (0..count).map(|_| next_frame(rx)).collect()
}

#[test]
fn test_replay_trace_file() {
    let records = vec![
        record(0.0, 1),
        // Inside the 60 FPS interval
        record(0.005, 2),
        record(0.02, 3),
        TraceRecord {
            capture_time: 0.021,
            timestamp: Some(4),
            face: None,
            fault: None,
        },
        TraceRecord {
            capture_time: 0.022,
            timestamp: None,
            face: None,
            fault: Some("camera failure".to_string()),
        },
    ];
    let file = write_trace(&records);

    let sensor = ReplaySensor::from_file(file.path()).unwrap();
    assert_eq!(sensor.len(), 5);

    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::from_config(&Config::default(), Box::new(sensor), Arc::new(tx)).unwrap();
    tracker.start().unwrap();

    let frames = collect(&rx, 4);
    assert_eq!(frames[0].timestamp, 1);
    assert!(frames[0].valid);
    assert_eq!(frames[1].timestamp, 3);
    assert!(frames[1].valid);
    assert_eq!(frames[2].timestamp, 4);
    assert_invalid(&frames[2]);
    assert_invalid(&frames[3]);

    assert!(rx.recv_timeout(SILENCE).is_err());
    tracker.stop().unwrap();
}

#[test]
fn test_replayed_frames_serialize_as_json_lines() {
    let sensor = ReplaySensor::new(vec![record(0.0, 1700000000000)]);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));
    tracker.start().unwrap();

    let json = next_frame(&rx).to_json().unwrap();
    tracker.stop().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["timestamp"], 1700000000000_i64);
    assert_eq!(value["valid"], true);
    assert_eq!(value["confidence"], 0.6);
    assert!(value.get("headPitch").is_some());
}

#[test]
fn test_stop_during_realtime_replay() {
    let records: Vec<_> = (0..100).map(|i| record(f64::from(i) * 0.1, i64::from(i))).collect();
    let sensor = ReplaySensor::new(records).realtime(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));

    tracker.start().unwrap();
    assert_eq!(next_frame(&rx).timestamp, 0);
    tracker.stop().unwrap();

    // Replay spans ten seconds; stopping must not wait it out or leak frames
    let leftover: Vec<_> = rx.try_iter().collect();
    assert!(leftover.len() < 5);
    assert!(rx.recv_timeout(SILENCE).is_err());
}

#[test]
fn test_malformed_trace_reports_line() {
    let err = parse_trace("# header\n{\"capture_time\": 0.0}\nnot json\n").unwrap_err();
    assert!(matches!(err, Error::Trace(_)));
    assert!(err.to_string().contains("line 3"));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{").unwrap();
    assert!(ReplaySensor::from_file(file.path()).is_err());
    assert!(ReplaySensor::from_file("/nonexistent/trace.jsonl").is_err());
}

#[test]
fn test_stop_does_not_wait_out_trace_gap() {
    let sensor = ReplaySensor::new(vec![record(0.0, 1), record(5.0, 2)]).realtime(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));

    tracker.start().unwrap();
    assert_eq!(next_frame(&rx).timestamp, 1);

    let stopping = Instant::now();
    tracker.stop().unwrap();
    assert!(
        stopping.elapsed() < Duration::from_millis(500),
        "stop took {:?}",
        stopping.elapsed()
    );
    assert!(rx.recv_timeout(SILENCE).is_err());
}

#[test]
fn test_stream_ends_after_last_record() {
    let sensor = ReplaySensor::new(vec![record(0.0, 1), record(0.5, 2)]);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));
    assert!(!tracker.stream_ended());

    tracker.start().unwrap();
    let waiting = Instant::now();
    while !tracker.stream_ended() {
        assert!(waiting.elapsed() < RECV_TIMEOUT, "Replay never finished");
        std::thread::sleep(Duration::from_millis(10));
    }

    // Every frame is already in the sink once the stream has ended
    let timestamps: Vec<_> = rx.try_iter().map(|frame| frame.timestamp).collect();
    assert_eq!(timestamps, vec![1, 2]);

    assert!(tracker.is_running());
    tracker.stop().unwrap();
    assert!(!tracker.stream_ended());
}
