//! Axis-aligned bounds of every sampled vertex position in a bake
//!
//! The bounds are folded over all vertices of all frames (pass 1 of a bake)
//! and then used to map each position into `[0, 1]` per axis (pass 2).
//! Runtime decoders need the same bounds to map texels back.

use serde::{Deserialize, Serialize};

/// Min/max corner enclosing every sampled position of one bake.
///
/// A degenerate axis (`min == max`) encodes as `0.0` and decodes back to
/// `min`, so a static axis never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for BoundsBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundsBox {
    /// An inverted box that any included point replaces.
    pub const fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// True until at least one point has been included.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Finite corners with `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| {
            self.min[axis].is_finite()
                && self.max[axis].is_finite()
                && self.min[axis] <= self.max[axis]
        })
    }

    /// Grow the box to contain `point`.
    #[inline]
    pub fn include(&mut self, point: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    /// Grow the box to contain every point in `points`.
    pub fn include_all(&mut self, points: &[[f32; 3]]) {
        for &point in points {
            self.include(point);
        }
    }

    /// Bounds of a single point set.
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut bounds = Self::empty();
        bounds.include_all(points);
        bounds
    }

    /// Merge two boxes.
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = *self;
        if !other.is_empty() {
            merged.include(other.min);
            merged.include(other.max);
        }
        merged
    }

    pub fn extent(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Whether every sampled position shared one value on `axis`.
    pub fn is_degenerate(&self, axis: usize) -> bool {
        self.min[axis] == self.max[axis]
    }

    /// Map `point` into `[0, 1]` per axis (inverse lerp, clamped).
    #[inline]
    pub fn normalize(&self, point: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (axis, value) in out.iter_mut().enumerate() {
            let range = self.max[axis] - self.min[axis];
            if range > 0.0 {
                *value = ((point[axis] - self.min[axis]) / range).clamp(0.0, 1.0);
            }
        }
        out
    }

    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (axis, value) in out.iter_mut().enumerate() {
            let range = self.max[axis] - self.min[axis];
            *value = self.min[axis] + normalized[axis] * range;
        }
        out
    }
}
