//! Camera projection capability consumed by the look-at method.
//!
//! The host tracking framework owns the real camera model; the core only sees
//! the [`CameraProjector`] trait. [`PinholeProjector`] is a self-contained
//! implementation used when replaying recorded poses.

use nalgebra::{Matrix4, Point2, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface orientation the projected point is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Home indicator at the bottom
    #[default]
    Portrait,
    /// Device rotated 180 degrees
    PortraitUpsideDown,
    /// Device rotated 90 degrees counter-clockwise
    LandscapeLeft,
    /// Device rotated 90 degrees clockwise
    LandscapeRight,
}

impl FromStr for Orientation {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "portrait-upside-down" | "upside-down" => Ok(Self::PortraitUpsideDown),
            "landscape-left" => Ok(Self::LandscapeLeft),
            "landscape-right" => Ok(Self::LandscapeRight),
            _ => Err(crate::Error::InvalidInput(format!("Unknown orientation: {s}"))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Portrait => "portrait",
            Self::PortraitUpsideDown => "portrait-upside-down",
            Self::LandscapeLeft => "landscape-left",
            Self::LandscapeRight => "landscape-right",
        };
        f.write_str(name)
    }
}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A viewport with zero (or non-finite) extent cannot normalize coordinates
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Maps a world-space point to a pixel coordinate in the given orientation.
pub trait CameraProjector: Send + Sync {
    /// Project `point`, or `None` when the point cannot be seen by the camera
    fn project(&self, point: &Point3<f32>, orientation: Orientation, viewport: Viewport) -> Option<Point2<f64>>;
}

/// Pinhole camera at a fixed world pose, looking down its local -Z axis.
///
/// Without intrinsics the focal length defaults to the longer viewport side,
/// the usual "focal length ≈ image width" approximation.
#[derive(Debug, Clone)]
pub struct PinholeProjector {
    world_to_camera: Matrix4<f32>,
    focal_length: Option<f64>,
}

impl PinholeProjector {
    /// Camera at the world origin
    #[must_use]
    pub fn new() -> Self {
        Self {
            world_to_camera: Matrix4::identity(),
            focal_length: None,
        }
    }

    /// Place the camera with a camera-to-world transform
    ///
    /// # Errors
    ///
    /// Returns an error if the transform is not invertible
    pub fn with_camera_transform(mut self, camera_to_world: Matrix4<f32>) -> crate::Result<Self> {
        self.world_to_camera = camera_to_world
            .try_inverse()
            .ok_or_else(|| crate::Error::InvalidInput("Camera transform is not invertible".to_string()))?;
        Ok(self)
    }

    /// Use a fixed focal length in pixels
    #[must_use]
    pub fn with_focal_length(mut self, focal_length: f64) -> Self {
        self.focal_length = Some(focal_length);
        self
    }
}

impl Default for PinholeProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraProjector for PinholeProjector {
    fn project(&self, point: &Point3<f32>, orientation: Orientation, viewport: Viewport) -> Option<Point2<f64>> {
        let camera_point = self.world_to_camera.transform_point(point);
        let depth = -f64::from(camera_point.z);
        if depth <= 0.0 {
            return None;
        }

        // Image plane coordinates in the sensor's native (portrait) frame, y up
        let u = f64::from(camera_point.x) / depth;
        let v = f64::from(camera_point.y) / depth;

        let (u, v) = match orientation {
            Orientation::Portrait => (u, v),
            Orientation::PortraitUpsideDown => (-u, -v),
            Orientation::LandscapeLeft => (v, -u),
            Orientation::LandscapeRight => (-v, u),
        };

        let focal = self.focal_length.unwrap_or_else(|| viewport.width.max(viewport.height));

        Some(Point2::new(
            viewport.width / 2.0 + focal * u,
            viewport.height / 2.0 - focal * v,
        ))
    }
}
