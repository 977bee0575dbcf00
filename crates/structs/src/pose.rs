//! Batched poses.
//!
//! A [`Pose`] holds one [`RawPose`] per body. A single-row pose is treated as
//! a broadcast value wherever a batch is expected.

use engine::RawPose;

use crate::ActorError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    raw: Vec<RawPose>,
}

impl Pose {
    #[must_use]
    pub fn create(raw: Vec<RawPose>) -> Self {
        Self { raw }
    }

    /// Builds a pose batch from rows of 7 floats (`p` then `wxyz` `q`).
    pub fn from_flat(values: &[f32]) -> Result<Self, ActorError> {
        let rows: &[RawPose] =
            bytemuck::try_cast_slice(values).map_err(|_| ActorError::RaggedPose(values.len()))?;
        Ok(Self { raw: rows.to_vec() })
    }

    /// Positions with identity orientation.
    #[must_use]
    pub fn create_from_p(p: &[[f32; 3]]) -> Self {
        Self {
            raw: p.iter().map(|p| RawPose::from_p(*p)).collect(),
        }
    }

    /// Positions paired with orientations. A single orientation is reused for
    /// every position.
    pub fn create_from_pq(p: &[[f32; 3]], q: &[[f32; 4]]) -> Result<Self, ActorError> {
        let raw = match q.len() {
            1 => p.iter().map(|p| RawPose::new(*p, q[0])).collect(),
            n if n == p.len() => p.iter().zip(q).map(|(p, q)| RawPose::new(*p, *q)).collect(),
            n => {
                return Err(ActorError::CountMismatch {
                    expected: p.len(),
                    got: n,
                })
            }
        };
        Ok(Self { raw })
    }

    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            raw: vec![RawPose::IDENTITY; n],
        }
    }

    /// Stacks the rows of every pose in order.
    #[must_use]
    pub fn vstack(poses: &[&Pose]) -> Self {
        Self {
            raw: poses.iter().flat_map(|pose| pose.raw.iter().copied()).collect(),
        }
    }

    /// Repeats a single-row pose `n` times; other poses are returned as is.
    #[must_use]
    pub fn broadcast(&self, n: usize) -> Self {
        match self.raw.as_slice() {
            [single] => Self {
                raw: vec![*single; n],
            },
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[must_use]
    pub fn raw_pose(&self) -> &[RawPose] {
        &self.raw
    }

    #[must_use]
    pub fn into_raw(self) -> Vec<RawPose> {
        self.raw
    }

    /// All rows as one contiguous `[N * 7]` slice.
    #[must_use]
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.raw)
    }

    #[must_use]
    pub fn p(&self) -> Vec<[f32; 3]> {
        self.raw.iter().map(|pose| pose.p).collect()
    }

    #[must_use]
    pub fn q(&self) -> Vec<[f32; 4]> {
        self.raw.iter().map(|pose| pose.q).collect()
    }
}

impl From<RawPose> for Pose {
    fn from(pose: RawPose) -> Self {
        Self { raw: vec![pose] }
    }
}

impl From<Vec<RawPose>> for Pose {
    fn from(raw: Vec<RawPose>) -> Self {
        Self { raw }
    }
}
