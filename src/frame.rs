//! Gaze frames delivered to the consumer.

use crate::{
    constants::{INVALID_CONFIDENCE, INVALID_COORDINATE},
    gaze::GazeEstimate,
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// One output event, serialized as
/// `{ x, y, confidence, timestamp, valid, headPitch? }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeFrame {
    /// Horizontal screen fraction, meaningful only when `valid`
    pub x: f64,
    /// Vertical screen fraction, meaningful only when `valid`
    pub y: f64,
    /// 0 for invalid frames
    pub confidence: f64,
    /// Capture time in epoch milliseconds
    pub timestamp: i64,
    /// Whether a gaze point was estimated
    pub valid: bool,
    /// Head pitch in radians, present only on valid frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_pitch: Option<f64>,
}

impl GazeFrame {
    /// Placeholder frame for a lost face or failed estimate
    #[must_use]
    pub const fn invalid(timestamp: i64) -> Self {
        Self {
            x: INVALID_COORDINATE,
            y: INVALID_COORDINATE,
            confidence: INVALID_CONFIDENCE,
            timestamp,
            valid: false,
            head_pitch: None,
        }
    }

    /// Valid frame carrying an estimate
    #[must_use]
    pub const fn from_estimate(estimate: &GazeEstimate, timestamp: i64) -> Self {
        Self {
            x: estimate.screen_x,
            y: estimate.screen_y,
            confidence: estimate.confidence,
            timestamp,
            valid: true,
            head_pitch: Some(estimate.head_pitch),
        }
    }

    /// Encode as a single-line JSON event
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidInput(format!("Failed to encode gaze frame: {e}")))
    }
}
