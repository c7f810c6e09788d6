//! Presence filter and rate limiter in front of the estimator.

use crate::{constants::DEFAULT_MAX_FPS, pose::FacePose, Error, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// A detection delivered with a sensor frame
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// A tracked face
    Face(FacePose),
    /// Any other anchor kind the sensor reports (planes, images, ...)
    Other,
}

/// One frame of sensor output
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    /// Anchors detected in this frame
    pub anchors: Vec<Anchor>,
    /// Capture time on the sensor's monotonic clock, in seconds
    pub capture_time: f64,
    /// Capture time as epoch milliseconds
    pub timestamp: i64,
}

impl SensorFrame {
    /// Frame stamped with the current wall-clock time
    #[must_use]
    pub fn new(anchors: Vec<Anchor>, capture_time: f64) -> Self {
        Self {
            anchors,
            capture_time,
            timestamp: epoch_millis(),
        }
    }

    /// Frame with an explicit epoch timestamp
    #[must_use]
    pub const fn with_timestamp(anchors: Vec<Anchor>, capture_time: f64, timestamp: i64) -> Self {
        Self {
            anchors,
            capture_time,
            timestamp,
        }
    }

    /// First face anchor in the frame
    #[must_use]
    pub fn face(&self) -> Option<&FacePose> {
        self.anchors.iter().find_map(|anchor| match anchor {
            Anchor::Face(pose) => Some(pose),
            Anchor::Other => None,
        })
    }
}

/// Current wall-clock time in epoch milliseconds
#[must_use]
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Outcome of gating one sensor frame
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision<'a> {
    /// No face in the frame; report an invalid frame
    NoFace,
    /// Face present but the frame arrived too soon; emit nothing
    Throttled,
    /// Forward this pose to the estimator
    Accepted(&'a FacePose),
}

/// Drops faceless frames and caps the accepted frame rate.
///
/// The presence check runs before throttling so a lost face is reported on
/// the very next frame, while tracking updates are limited to `max_fps`.
#[derive(Debug, Clone)]
pub struct FrameGate {
    min_interval: f64,
    last_accepted: Option<f64>,
}

impl FrameGate {
    /// Create a gate limited to `max_fps` accepted frames per second
    ///
    /// # Errors
    ///
    /// Returns an error if `max_fps` is not a positive finite number
    pub fn new(max_fps: f64) -> Result<Self> {
        if !max_fps.is_finite() || max_fps <= 0.0 {
            return Err(Error::InvalidInput(format!("Frame rate ceiling must be positive, got {max_fps}")));
        }
        Ok(Self {
            min_interval: 1.0 / max_fps,
            last_accepted: None,
        })
    }

    /// Minimum spacing between accepted frames, in seconds
    #[must_use]
    pub const fn min_interval(&self) -> f64 {
        self.min_interval
    }

    /// Decide what to do with `frame`
    pub fn admit<'a>(&mut self, frame: &'a SensorFrame) -> GateDecision<'a> {
        let Some(face) = frame.face() else {
            return GateDecision::NoFace;
        };

        if let Some(last) = self.last_accepted {
            if frame.capture_time - last < self.min_interval {
                return GateDecision::Throttled;
            }
        }

        self.last_accepted = Some(frame.capture_time);
        GateDecision::Accepted(face)
    }

    /// Forget the last accepted time
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self {
            min_interval: 1.0 / DEFAULT_MAX_FPS,
            last_accepted: None,
        }
    }
}
