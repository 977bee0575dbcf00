use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of `f32` columns in one row of the GPU rigid body buffer.
pub const RIGID_BODY_ROW_WIDTH: usize = 16;

/// Handle to an entity owned by the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Static,
    Kinematic,
    Dynamic,
}

impl BodyType {
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, BodyType::Dynamic)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BodyType::Static => "static",
            BodyType::Kinematic => "kinematic",
            BodyType::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position plus `wxyz` quaternion, laid out as 7 contiguous floats.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RawPose {
    pub p: [f32; 3],
    pub q: [f32; 4],
}

impl RawPose {
    pub const IDENTITY: Self = Self {
        p: [0.0; 3],
        q: [1.0, 0.0, 0.0, 0.0],
    };

    #[must_use]
    pub const fn new(p: [f32; 3], q: [f32; 4]) -> Self {
        Self { p, q }
    }

    #[must_use]
    pub const fn from_p(p: [f32; 3]) -> Self {
        Self {
            p,
            q: Self::IDENTITY.q,
        }
    }

    #[must_use]
    pub fn translation(&self) -> glam::Vec3 {
        glam::Vec3::from_array(self.p)
    }

    #[must_use]
    pub fn rotation(&self) -> glam::Quat {
        let [w, x, y, z] = self.q;
        glam::Quat::from_xyzw(x, y, z, w)
    }

    #[must_use]
    pub fn from_glam(translation: glam::Vec3, rotation: glam::Quat) -> Self {
        Self {
            p: translation.to_array(),
            q: [rotation.w, rotation.x, rotation.y, rotation.z],
        }
    }
}

impl Default for RawPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One row of the engine's GPU rigid body buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RigidBodyRow {
    pub pose: RawPose,
    pub linear_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub _pad: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<RigidBodyRow>() == RIGID_BODY_ROW_WIDTH * 4);

impl RigidBodyRow {
    #[must_use]
    pub fn at_rest(pose: RawPose) -> Self {
        Self {
            pose,
            linear_velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            _pad: [0.0; 3],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: [f32; 3] },
    /// Infinite plane through the entity origin with `+z` as its normal.
    Plane,
}

impl Shape {
    /// Distance from the body origin to the lowest point of the shape.
    #[must_use]
    pub fn half_height(&self) -> f32 {
        match self {
            Shape::Sphere { radius } => *radius,
            Shape::Box { half_extents } => half_extents[2],
            Shape::Plane => 0.0,
        }
    }
}

/// Everything the engine needs to create one entity.
#[derive(Clone, Debug)]
pub struct EntityDesc {
    pub name: String,
    pub body_type: BodyType,
    pub pose: RawPose,
    pub visual: Option<Shape>,
    pub collision: Vec<Shape>,
    pub color: [f32; 4],
}

impl EntityDesc {
    #[must_use]
    pub fn new(name: impl Into<String>, body_type: BodyType) -> Self {
        Self {
            name: name.into(),
            body_type,
            pose: RawPose::IDENTITY,
            visual: None,
            collision: Vec::new(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_columns_follow_gpu_layout() {
        let row = RigidBodyRow {
            pose: RawPose::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 7.0]),
            linear_velocity: [8.0, 9.0, 10.0],
            angular_velocity: [11.0, 12.0, 13.0],
            _pad: [0.0; 3],
        };
        let flat: [f32; RIGID_BODY_ROW_WIDTH] = bytemuck::cast(row);
        assert_eq!(&flat[..7], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(&flat[7..10], &[8.0, 9.0, 10.0]);
        assert_eq!(&flat[10..13], &[11.0, 12.0, 13.0]);
    }

    #[test]
    fn quaternion_is_wxyz() {
        let pose = RawPose::new([0.0; 3], [0.5, 0.5, 0.5, 0.5]);
        let q = pose.rotation();
        assert_eq!((q.w, q.x, q.y, q.z), (0.5, 0.5, 0.5, 0.5));
        let back = RawPose::from_glam(pose.translation(), q);
        assert_eq!(back, pose);
    }

    #[test]
    fn body_type_serializes_lowercase() {
        let json = serde_json::to_string(&BodyType::Kinematic).unwrap();
        assert_eq!(json, "\"kinematic\"");
    }
}
