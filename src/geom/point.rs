use crate::Vector;
use crate::geom::nearly_equal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0., 0., 0.)
    }

    /// Coordinate-wise equality within the relative geometric precision.
    pub fn is_close(&self, other: &Self) -> bool {
        nearly_equal(self.x, other.x)
            && nearly_equal(self.y, other.y)
            && nearly_equal(self.z, other.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Spherical radius measured from the origin.
    pub fn radius(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Cylindrical radius measured from the z axis.
    pub fn cylindrical_radius(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Coordinate `axis` (0 = x, 1 = y, 2 = z).
    pub fn coordinate(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        write!(f, "({:.prec$e}, {:.prec$e}, {:.prec$e})", self.x, self.y, self.z)
    }
}

/// Displacement of a point. The difference of two points is
/// [`Vector::from_points`].
impl Add<Vector> for Point {
    type Output = Self;
    fn add(self, step: Vector) -> Self {
        Self::new(self.x + step.dx, self.y + step.dy, self.z + step.dz)
    }
}
