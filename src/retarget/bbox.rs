//! Axis-aligned bounding boxes and box-relative coordinates.

use nalgebra::{Point3, Vector3};

/// Extent at or below which an axis is treated as zero-width.
const DEGENERATE_EXTENT: f64 = 1e-12;

/// Running min/max accumulator over 3D points.
///
/// Relative coordinates map the box onto `[0, 1]^3`. An axis with zero extent
/// has no meaningful relative coordinate; on such an axis both conversions
/// pass the coordinate through unchanged instead of dividing by zero.
///
/// # Example
///
/// ```
/// use metarig::retarget::BoundingBox;
/// use nalgebra::Point3;
///
/// let mut bbox = BoundingBox::new();
/// bbox.add(&Point3::new(0.0, 0.0, 0.0));
/// bbox.add(&Point3::new(2.0, 4.0, 0.0));
/// bbox.pad(1.0);
///
/// let rel = bbox.to_relative(&Point3::new(1.0, 2.0, 0.0));
/// assert_eq!(rel, Point3::new(0.5, 0.5, 0.5));
/// assert_eq!(bbox.from_relative(&rel), Point3::new(1.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// An empty box (min at +inf, max at -inf).
    pub fn new() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.add(p);
        }
        bbox
    }

    /// Grow the box to include `p`.
    pub fn add(&mut self, p: &Point3<f64>) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Whether no point has been added.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Shrink min and grow max by `amount` on every axis.
    pub fn pad(&mut self, amount: f64) {
        self.min -= Vector3::repeat(amount);
        self.max += Vector3::repeat(amount);
    }

    /// Size along each axis.
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Whether an axis has (near) zero extent.
    pub fn is_degenerate_axis(&self, axis: usize) -> bool {
        !(self.max[axis] - self.min[axis] > DEGENERATE_EXTENT)
    }

    /// Degenerate flag for each axis.
    pub fn degenerate_axes(&self) -> [bool; 3] {
        [0, 1, 2].map(|axis| self.is_degenerate_axis(axis))
    }

    /// World point to box-relative coordinates.
    pub fn to_relative(&self, p: &Point3<f64>) -> Point3<f64> {
        let mut rel = *p;
        for axis in 0..3 {
            if !self.is_degenerate_axis(axis) {
                rel[axis] = (p[axis] - self.min[axis]) / (self.max[axis] - self.min[axis]);
            }
        }
        rel
    }

    /// Box-relative coordinates back to a world point.
    pub fn from_relative(&self, rel: &Point3<f64>) -> Point3<f64> {
        let mut p = *rel;
        for axis in 0..3 {
            if !self.is_degenerate_axis(axis) {
                p[axis] = self.min[axis] + rel[axis] * (self.max[axis] - self.min[axis]);
            }
        }
        p
    }
}
