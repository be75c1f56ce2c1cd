//! Integer axis-aligned bounding box over block coordinates

use glam::I64Vec3;

use crate::core::types::{DVec3, IVec3};

/// Axis-aligned box of block cells, inclusive on every bound.
///
/// Corners are normalized on construction, so callers may pass them in any order.
/// A box is never empty: a single cell is `min == max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockAabb {
    pub min: IVec3,
    pub max: IVec3,
}

impl BlockAabb {
    /// Create a box from two opposite corners in any order
    pub fn from_corners(a: IVec3, b: IVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Number of cells along each axis, widened so the full i32 range fits
    pub fn extent(&self) -> I64Vec3 {
        self.max.as_i64vec3() - self.min.as_i64vec3() + I64Vec3::ONE
    }

    /// Total number of cells, saturating at `u64::MAX`
    pub fn volume(&self) -> u64 {
        let e = self.extent();
        (e.x as u64).saturating_mul(e.y as u64).saturating_mul(e.z as u64)
    }

    /// Geometric center of the covered cells
    pub fn center(&self) -> DVec3 {
        (self.min.as_dvec3() + self.max.as_dvec3() + DVec3::ONE) * 0.5
    }

    /// Check if a block position is inside the box
    pub fn contains_block(&self, p: IVec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if a continuous position falls in one of the box cells
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.contains_block(p.floor().as_ivec3())
    }

    /// Iterate every cell, x outermost then y then z
    pub fn cells(&self) -> Cells {
        Cells {
            aabb: *self,
            next: Some(self.min),
        }
    }
}

/// Iterator over the cells of a [`BlockAabb`]
#[derive(Clone, Debug)]
pub struct Cells {
    aabb: BlockAabb,
    next: Option<IVec3>,
}

impl Iterator for Cells {
    type Item = IVec3;

    fn next(&mut self) -> Option<IVec3> {
        let current = self.next?;
        let (min, max) = (self.aabb.min, self.aabb.max);

        self.next = if current.z < max.z {
            Some(IVec3::new(current.x, current.y, current.z + 1))
        } else if current.y < max.y {
            Some(IVec3::new(current.x, current.y + 1, min.z))
        } else if current.x < max.x {
            Some(IVec3::new(current.x + 1, min.y, min.z))
        } else {
            None
        };

        Some(current)
    }
}
