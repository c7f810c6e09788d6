//! Gaze point estimation from face tracking poses.
//!
//! Given the per-frame face pose of a face tracking sensor (head transform,
//! optional look-at target, eye transforms) this library computes where on
//! the screen the user is looking, as normalized coordinates with a
//! confidence and the head pitch.
//!
//! The pipeline for each sensor frame:
//! 1. The [`frame_gate::FrameGate`] reports frames without a face and caps the
//!    accepted frame rate (60 Hz by default)
//! 2. The [`gaze::GazeEstimator`] projects the look-at target through the
//!    camera, falling back to intersecting the eye rays with a virtual screen
//!    plane
//! 3. A [`frame::GazeFrame`] is emitted, valid or an invalid placeholder
//!
//! # Examples
//!
//! ## Estimating a single pose
//!
//! ```
//! use gaze_estimation::{
//!     gaze::GazeEstimator,
//!     pose::FacePose,
//!     projection::{Orientation, PinholeProjector, Viewport},
//! };
//! use nalgebra::Translation3;
//!
//! let mut pose = FacePose::identity();
//! pose.left_eye_transform = Translation3::new(-0.03, 0.0, 0.0).to_homogeneous();
//! pose.right_eye_transform = Translation3::new(0.03, 0.0, 0.0).to_homogeneous();
//!
//! let estimator = GazeEstimator::default();
//! let estimate = estimator
//!     .estimate(&pose, &PinholeProjector::new(), Orientation::Portrait, Viewport::new(1170.0, 2532.0))
//!     .expect("eyes face the screen");
//!
//! assert!((estimate.screen_x - 0.5).abs() < 1e-6);
//! assert_eq!(estimate.confidence, 0.6);
//! ```
//!
//! ## Running a tracking session
//!
//! ```no_run
//! use gaze_estimation::{sensor::ReplaySensor, session::GazeTracker};
//! use crossbeam_channel::unbounded;
//! use std::sync::Arc;
//!
//! # fn main() -> gaze_estimation::Result<()> {
//! let sensor = ReplaySensor::from_file("trace.jsonl")?;
//! let (frames_tx, frames_rx) = unbounded();
//!
//! let mut tracker = GazeTracker::new(Box::new(sensor), Arc::new(frames_tx));
//! tracker.start()?;
//!
//! for frame in frames_rx.iter().take(10) {
//!     println!("{}", frame.to_json()?);
//! }
//!
//! tracker.stop()?;
//! # Ok(())
//! # }
//! ```

/// Face pose input and head orientation decomposition
pub mod pose;

/// Camera projection capability and pinhole implementation
pub mod projection;

/// Look-at projection and eye-ray gaze estimation
pub mod gaze;

/// Presence filter and frame rate limiter
pub mod frame_gate;

/// Output gaze frames
pub mod frame;

/// Per-frame processing pipeline
pub mod pipeline;

/// Face tracking sensor abstraction and trace replay
pub mod sensor;

/// Tracking session controller
pub mod session;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
