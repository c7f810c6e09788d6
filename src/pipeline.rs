//! Per-frame processing: gate, estimate, assemble the output frame.

use crate::{
    frame::GazeFrame,
    frame_gate::{FrameGate, GateDecision, SensorFrame},
    gaze::GazeEstimator,
    projection::{CameraProjector, Orientation, Viewport},
};
use log::debug;
use std::sync::Arc;

/// Orientation and viewport the host is currently displaying
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayState {
    /// Interface orientation projected points are expressed in
    pub orientation: Orientation,
    /// Viewport the projected pixels are normalized against
    pub viewport: Viewport,
}

impl DisplayState {
    #[must_use]
    pub const fn new(orientation: Orientation, viewport: Viewport) -> Self {
        Self { orientation, viewport }
    }
}

/// Turns sensor frames into gaze frames.
///
/// Returns exactly one frame per accepted sensor frame and nothing for
/// throttled ones.
pub struct FramePipeline {
    gate: FrameGate,
    estimator: GazeEstimator,
    projector: Arc<dyn CameraProjector>,
}

impl FramePipeline {
    #[must_use]
    pub fn new(gate: FrameGate, estimator: GazeEstimator, projector: Arc<dyn CameraProjector>) -> Self {
        Self {
            gate,
            estimator,
            projector,
        }
    }

    /// Process one sensor frame
    pub fn process(&mut self, frame: &SensorFrame, display: DisplayState) -> Option<GazeFrame> {
        match self.gate.admit(frame) {
            GateDecision::NoFace => {
                debug!("No face in frame at {:.3}s", frame.capture_time);
                Some(GazeFrame::invalid(frame.timestamp))
            }
            GateDecision::Throttled => None,
            GateDecision::Accepted(pose) => {
                let estimate =
                    self.estimator
                        .estimate(pose, self.projector.as_ref(), display.orientation, display.viewport);
                Some(match estimate {
                    Some(estimate) => GazeFrame::from_estimate(&estimate, frame.timestamp),
                    None => {
                        debug!("Neither gaze method produced an estimate");
                        GazeFrame::invalid(frame.timestamp)
                    }
                })
            }
        }
    }

    /// Frame reported for a sensor failure or interruption
    #[must_use]
    pub const fn fault(&self, timestamp: i64) -> GazeFrame {
        GazeFrame::invalid(timestamp)
    }

    /// Forget throttling state
    pub fn reset(&mut self) {
        self.gate.reset();
    }
}
