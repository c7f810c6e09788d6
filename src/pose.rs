//! Face pose input contract and head orientation decomposition.

use crate::constants::GIMBAL_LOCK_EPSILON;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Per-frame face pose delivered by the tracking sensor.
///
/// All transforms are rigid 4x4 matrices mapping local space to world space.
/// A pose is created fresh for every sensor frame and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacePose {
    /// Head-to-world transform
    pub head_transform: Matrix4<f32>,

    /// Point the eyes are aimed at, in head-local space
    #[serde(default)]
    pub look_at_target: Option<Point3<f32>>,

    /// Left eye-to-world transform
    pub left_eye_transform: Matrix4<f32>,

    /// Right eye-to-world transform
    pub right_eye_transform: Matrix4<f32>,
}

impl FacePose {
    /// Pose with identity transforms everywhere and no look-at target
    #[must_use]
    pub fn identity() -> Self {
        Self {
            head_transform: Matrix4::identity(),
            look_at_target: None,
            left_eye_transform: Matrix4::identity(),
            right_eye_transform: Matrix4::identity(),
        }
    }

    /// Look-at target transformed into world space, if present
    #[must_use]
    pub fn look_at_world(&self) -> Option<Point3<f32>> {
        self.look_at_target
            .map(|target| self.head_transform.transform_point(&target))
    }

    /// Head orientation as Euler angles
    #[must_use]
    pub fn head_angles(&self) -> HeadAngles {
        HeadAngles::from_transform(&self.head_transform)
    }
}

/// Head orientation in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadAngles {
    /// Rotation about the x axis
    pub pitch: f32,
    /// Rotation about the y axis
    pub yaw: f32,
    /// Rotation about the z axis
    pub roll: f32,
}

impl HeadAngles {
    /// Decompose the rotation part of a transform into Euler angles.
    ///
    /// Near gimbal lock (`sqrt(r00² + r10²) < 1e-6`) roll is pinned to zero
    /// and pitch is recovered from the second row/column instead.
    #[must_use]
    pub fn from_transform(transform: &Matrix4<f32>) -> Self {
        let r = |row: usize, col: usize| transform[(row, col)];

        let sy = r(0, 0).hypot(r(1, 0));

        if sy < GIMBAL_LOCK_EPSILON {
            Self {
                pitch: (-r(1, 2)).atan2(r(1, 1)),
                yaw: (-r(2, 0)).atan2(sy),
                roll: 0.0,
            }
        } else {
            Self {
                pitch: r(2, 1).atan2(r(2, 2)),
                yaw: (-r(2, 0)).atan2(sy),
                roll: r(1, 0).atan2(r(0, 0)),
            }
        }
    }
}

/// Translation column of a rigid transform
#[must_use]
pub fn translation_of(transform: &Matrix4<f32>) -> Vector3<f32> {
    transform.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Local forward axis of a rigid transform (negated third basis column)
#[must_use]
pub fn forward_of(transform: &Matrix4<f32>) -> Vector3<f32> {
    -transform.fixed_view::<3, 1>(0, 2).into_owned()
}
