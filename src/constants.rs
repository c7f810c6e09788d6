//! Constants used throughout the library

/// Default frame gate ceiling in frames per second
pub const DEFAULT_MAX_FPS: f64 = 60.0;

/// Confidence assigned to look-at projection estimates
pub const PRIMARY_CONFIDENCE: f64 = 0.8;

/// Confidence assigned to eye-ray intersection estimates
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Placeholder coordinate carried by invalid frames
pub const INVALID_COORDINATE: f64 = 0.5;

/// Confidence carried by invalid frames
pub const INVALID_CONFIDENCE: f64 = 0.0;

/// Assumed eye-to-screen distance for the fallback method (meters)
pub const DEFAULT_SCREEN_DISTANCE: f32 = 0.3;

/// Assumed physical screen width for the fallback method (meters)
pub const DEFAULT_SCREEN_WIDTH: f32 = 0.15;

/// Assumed physical screen height for the fallback method (meters)
pub const DEFAULT_SCREEN_HEIGHT: f32 = 0.25;

/// Below this `sqrt(r00² + r10²)` the Euler decomposition is treated as singular
pub const GIMBAL_LOCK_EPSILON: f32 = 1e-6;

/// Default viewport width (portrait phone, pixels)
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1170;

/// Default viewport height (portrait phone, pixels)
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 2532;

/// Capacity of the inbound sensor event channel
pub const SENSOR_CHANNEL_CAPACITY: usize = 8;
