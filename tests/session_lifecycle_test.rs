//! Session lifecycle tests driving the tracker through a hand-fed sensor


use crossbeam_channel::unbounded;
use gaze_estimation::{
    gaze::ScreenGeometry,
    projection::{Orientation, Viewport},
    sensor::{RunOptions, SensorEvent},
    session::{GazeTracker, SessionState},
    Error,
};
use std::sync::Arc;
use std::thread;
use test_helpers::*;

#[test]
fn test_frames_flow_while_running() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));

    tracker.start().unwrap();
    assert_eq!(handle.runs(), vec![RunOptions::default()]);

    assert!(handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 100)));
    let frame = next_frame(&rx);
    assert!(frame.valid);
    assert_eq!(frame.timestamp, 100);
    assert_eq!(frame.confidence, 0.6);
    assert!((frame.x - 0.5).abs() < 1e-6);

    tracker.stop().unwrap();
    assert_eq!(handle.pauses(), 1);
}

#[test]
fn test_throttled_frames_are_silent_but_lost_faces_are_reported() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));
    tracker.start().unwrap();

    // 5ms apart is inside the 60 FPS interval
    handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 1));
    handle.send_frame(face_frame(eyes_forward_pose(), 0.005, 2));
    handle.send_frame(empty_frame(0.006, 3));

    let first = next_frame(&rx);
    assert_eq!(first.timestamp, 1);

    let lost = next_frame(&rx);
    assert_eq!(lost.timestamp, 3);
    assert_invalid(&lost);

    assert!(rx.recv_timeout(SILENCE).is_err());
    tracker.stop().unwrap();
}

#[test]
fn test_sensor_fault_emits_invalid_frame_and_keeps_running() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));
    tracker.start().unwrap();

    handle.send(SensorEvent::Failed("camera failure".to_string()));
    assert_invalid(&next_frame(&rx));

    handle.send(SensorEvent::Interrupted);
    assert_invalid(&next_frame(&rx));

    assert_eq!(tracker.state(), SessionState::Running);

    handle.send_frame(face_frame(eyes_forward_pose(), 1.0, 7));
    let frame = next_frame(&rx);
    assert!(frame.valid);
    assert_eq!(frame.timestamp, 7);

    tracker.stop().unwrap();
}

#[test]
fn test_no_frames_after_stop() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));

    tracker.start().unwrap();
    handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 1));
    next_frame(&rx);

    tracker.stop().unwrap();

    assert!(!handle.send_frame(face_frame(eyes_forward_pose(), 1.0, 2)));
    assert!(rx.recv_timeout(SILENCE).is_err());
}

#[test]
fn test_stop_discards_queued_events() {
    let (sensor, handle) = ManualSensor::new(true);
    let (sink, entered, release, rx) = HoldingSink::new();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(sink));
    tracker.start().unwrap();

    // Worker holds the first frame inside the sink
    handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 1));
    entered.recv_timeout(RECV_TIMEOUT).unwrap();

    for i in 2..6 {
        assert!(handle.send_frame(face_frame(eyes_forward_pose(), f64::from(i), i64::from(i))));
    }

    let stopper = thread::spawn(move || {
        let result = tracker.stop();
        (tracker, result)
    });

    // Let `stop` block on the session lock before the worker lets go
    thread::sleep(SILENCE);
    drop(release);

    let (tracker, result) = stopper.join().unwrap();
    result.unwrap();
    assert!(!tracker.is_running());

    assert_eq!(next_frame(&rx).timestamp, 1);
    assert!(rx.recv_timeout(SILENCE).is_err());
}

#[test]
fn test_restart_uses_fresh_rate_limit() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));

    tracker.start().unwrap();
    handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 1));
    assert_eq!(next_frame(&rx).timestamp, 1);
    tracker.stop().unwrap();

    // Would be throttled if the previous session's gate carried over
    tracker.start().unwrap();
    handle.send_frame(face_frame(eyes_forward_pose(), 0.001, 2));
    assert_eq!(next_frame(&rx).timestamp, 2);
    tracker.stop().unwrap();

    assert_eq!(handle.runs().len(), 2);
}

#[test]
fn test_unsupported_sensor_never_runs() {
    let (sensor, handle) = ManualSensor::new(false);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));

    assert!(matches!(tracker.start(), Err(Error::Unsupported)));
    assert!(handle.runs().is_empty());
    assert!(!handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 1)));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_display_change_applies_to_next_frame() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));
    tracker.start().unwrap();

    handle.send_frame(face_frame(look_at_pose(), 0.0, 1));
    assert_eq!(next_frame(&rx).confidence, 0.8);

    // A degenerate viewport rules out the look-at method
    tracker.set_display(Orientation::LandscapeLeft, Viewport::new(0.0, 0.0));
    handle.send_frame(face_frame(look_at_pose(), 1.0, 2));
    assert_eq!(next_frame(&rx).confidence, 0.6);

    tracker.stop().unwrap();
}

#[test]
fn test_custom_rate_and_geometry() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx))
        .with_max_fps(10.0)
        .with_screen_geometry(ScreenGeometry {
            distance: 0.5,
            width: 0.3,
            height: 0.5,
        });
    tracker.start().unwrap();

    handle.send_frame(face_frame(eyes_forward_pose(), 0.0, 1));
    handle.send_frame(face_frame(eyes_forward_pose(), 0.05, 2));
    handle.send_frame(face_frame(eyes_forward_pose(), 0.15, 3));

    assert_eq!(next_frame(&rx).timestamp, 1);
    assert_eq!(next_frame(&rx).timestamp, 3);
    assert!(rx.recv_timeout(SILENCE).is_err());

    tracker.stop().unwrap();
}

#[test]
fn test_drop_stops_running_session() {
    let (sensor, handle) = ManualSensor::new(true);
    let (tx, _rx) = unbounded();
    let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(tx));
    tracker.start().unwrap();

    drop(tracker);
    assert_eq!(handle.pauses(), 1);
}
