//! Axis-system conversion (host space -> engine space)
//!
//! Host space is forward +Y, up +Z. The conversion sends host forward to the
//! configured forward axis and host up to the configured up axis; host right
//! (+X) goes to `forward × up`, so the map is always a proper rotation and
//! handedness is preserved.

use std::fmt;
use std::str::FromStr;

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// One of the six principal directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "Y")]
    Y,
    #[serde(rename = "Z")]
    Z,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "-Z")]
    NegZ,
}

impl Axis {
    pub fn to_vec3(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
            Axis::NegX => Vec3::NEG_X,
            Axis::NegY => Vec3::NEG_Y,
            Axis::NegZ => Vec3::NEG_Z,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "X" | "+X" => Ok(Axis::X),
            "Y" | "+Y" => Ok(Axis::Y),
            "Z" | "+Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            _ => Err(format!("unknown axis '{}' (use X, Y, Z, -X, -Y or -Z)", s)),
        }
    }
}

/// Change of basis from host space to engine space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisConversion {
    matrix: Mat3,
    rotation: Quat,
}

impl AxisConversion {
    /// Conversion that keeps host axes (forward +Y, up +Z)
    pub const IDENTITY: Self = Self {
        matrix: Mat3::IDENTITY,
        rotation: Quat::IDENTITY,
    };

    pub fn new(forward: Axis, up: Axis) -> Result<Self> {
        let f = forward.to_vec3();
        let u = up.to_vec3();
        if f.dot(u) != 0.0 {
            return Err(ExportError::AxisConflict { forward, up });
        }

        let matrix = Mat3::from_cols(f.cross(u), f, u);
        Ok(Self {
            matrix,
            rotation: Quat::from_mat3(&matrix).normalize(),
        })
    }

    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_mat3(self.matrix)
    }

    /// Convert a position or offset
    pub fn convert_vector(&self, v: Vec3) -> Vec3 {
        self.matrix * v
    }

    /// Convert a direction and renormalize it
    pub fn convert_normal(&self, n: Vec3) -> Vec3 {
        (self.matrix * n).normalize_or_zero()
    }

    /// Map an engine-space vector back to host space
    pub fn unconvert_vector(&self, v: Vec3) -> Vec3 {
        self.matrix.transpose() * v
    }

    /// Re-express a rotation in engine space (`C·R·C⁻¹`)
    pub fn convert_rotation(&self, q: Quat) -> Quat {
        (self.rotation * q * self.rotation.conjugate()).normalize()
    }

    /// Re-express an affine transform in engine space (`C·M·C⁻¹`)
    pub fn convert_matrix(&self, m: Mat4) -> Mat4 {
        let c = self.to_mat4();
        c * m * c.transpose()
    }
}

impl Default for AxisConversion {
    fn default() -> Self {
        Self::IDENTITY
    }
}
