//! Gaze point estimation from a face pose.
//!
//! Two algorithms are tried in strict priority order:
//!
//! 1. **Look-at projection**: the sensor's look-at target is moved into world
//!    space and projected through the camera.
//! 2. **Eye-ray intersection**: the averaged eye forward ray is intersected
//!    with a virtual screen plane in front of the face.
//!
//! Both results are mirrored horizontally (the sensor is a front-facing
//! camera) and clamped to `[0, 1]`.

use crate::{
    constants::{
        DEFAULT_SCREEN_DISTANCE, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, FALLBACK_CONFIDENCE,
        PRIMARY_CONFIDENCE,
    },
    pose::{forward_of, translation_of, FacePose},
    projection::{CameraProjector, Orientation, Viewport},
    Error, Result,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Algorithm that produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeMethod {
    /// Projected look-at target
    LookAt,
    /// Eye-ray / screen-plane intersection
    EyeRay,
}

impl GazeMethod {
    /// Fixed confidence attached to estimates of this method
    #[must_use]
    pub const fn confidence(self) -> f64 {
        match self {
            Self::LookAt => PRIMARY_CONFIDENCE,
            Self::EyeRay => FALLBACK_CONFIDENCE,
        }
    }
}

/// Result of one successful estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeEstimate {
    /// Horizontal screen fraction in `[0, 1]`
    pub screen_x: f64,
    /// Vertical screen fraction in `[0, 1]`, 0 at the top row
    pub screen_y: f64,
    /// Estimate confidence in `[0, 1]`
    pub confidence: f64,
    /// Head pitch in radians
    pub head_pitch: f64,
    /// Algorithm used
    pub method: GazeMethod,
}

/// Physical screen model used by the eye-ray method, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenGeometry {
    /// Distance of the screen plane in front of the eyes
    pub distance: f32,
    /// Screen width
    pub width: f32,
    /// Screen height
    pub height: f32,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            distance: DEFAULT_SCREEN_DISTANCE,
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl ScreenGeometry {
    /// Validate that every dimension is finite and positive
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid dimension
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("distance", self.distance), ("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "Screen {name} must be a positive finite value, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Horizontal flip for the front-facing camera
#[must_use]
pub fn mirror(x: f64) -> f64 {
    1.0 - x
}

/// Gaze estimator combining look-at projection with the eye-ray fallback
#[derive(Debug, Clone, Default)]
pub struct GazeEstimator {
    screen: ScreenGeometry,
}

impl GazeEstimator {
    /// Create an estimator with the given fallback screen geometry
    #[must_use]
    pub const fn new(screen: ScreenGeometry) -> Self {
        Self { screen }
    }

    /// Estimate the gaze point, trying the look-at method before the eye-ray method
    pub fn estimate(
        &self,
        pose: &FacePose,
        projector: &dyn CameraProjector,
        orientation: Orientation,
        viewport: Viewport,
    ) -> Option<GazeEstimate> {
        let (x, y, method) = match self.look_at_point(pose, projector, orientation, viewport) {
            Some((x, y)) => (x, y, GazeMethod::LookAt),
            None => {
                let (x, y) = self.eye_ray_point(pose)?;
                (x, y, GazeMethod::EyeRay)
            }
        };

        let head_pitch = f64::from(pose.head_angles().pitch);
        debug!("Gaze estimate via {:?}: ({:.3}, {:.3}) pitch {:.3}", method, x, y, head_pitch);

        Some(GazeEstimate {
            screen_x: x,
            screen_y: y,
            confidence: method.confidence(),
            head_pitch,
            method,
        })
    }

    /// Normalized screen point from the projected look-at target
    pub fn look_at_point(
        &self,
        pose: &FacePose,
        projector: &dyn CameraProjector,
        orientation: Orientation,
        viewport: Viewport,
    ) -> Option<(f64, f64)> {
        if viewport.is_degenerate() {
            return None;
        }

        let world = pose.look_at_world()?;
        let pixel = projector.project(&world, orientation, viewport)?;

        let x = pixel.x / viewport.width;
        let y = pixel.y / viewport.height;

        Some((mirror(x).clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
    }

    /// Normalized screen point from the averaged eye ray hitting the screen plane
    #[must_use]
    pub fn eye_ray_point(&self, pose: &FacePose) -> Option<(f64, f64)> {
        let left = translation_of(&pose.left_eye_transform);
        let right = translation_of(&pose.right_eye_transform);
        let eye_center = (left + right) / 2.0;

        let forward = (forward_of(&pose.left_eye_transform) + forward_of(&pose.right_eye_transform)) / 2.0;
        let direction = forward.try_normalize(f32::EPSILON)?;

        // Looking away from the screen
        if direction.z >= 0.0 {
            return None;
        }

        let plane_z = -self.screen.distance;
        let t = (plane_z - eye_center.z) / direction.z;
        let hit = eye_center + direction * t;

        let width = self.screen.width;
        let height = self.screen.height;
        let x = f64::from((hit.x + width / 2.0) / width);
        let y = 1.0 - f64::from((hit.y + height / 2.0) / height);

        Some((mirror(x).clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
    }
}
