use crate::Point;
use crate::geom::{EPS, nearly_equal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    pub fn zero() -> Self {
        Self::new(0., 0., 0.)
    }

    pub fn from_points(beg: Point, end: Point) -> Self {
        Self {
            dx: end.x - beg.x,
            dy: end.y - beg.y,
            dz: end.z - beg.z,
        }
    }

    /// Direction cosines for an observer at inclination `inclination` (radians,
    /// measured from the +z axis) and azimuth `phi` (radians).
    pub fn from_angles(inclination: f64, phi: f64) -> Self {
        let (sin_i, cos_i) = inclination.sin_cos();
        Self {
            dx: sin_i * phi.cos(),
            dy: sin_i * phi.sin(),
            dz: cos_i,
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy + self.dz * other.dz
    }

    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite() && self.dz.is_finite()
    }

    pub fn is_close(&self, other: &Self) -> bool {
        nearly_equal(self.dx, other.dx)
            && nearly_equal(self.dy, other.dy)
            && nearly_equal(self.dz, other.dz)
    }

    /// Unit vector with the same direction, or `None` if the length is zero
    /// or not finite.
    pub fn normalize(&self) -> Option<Self> {
        let len = self.length();
        (len.is_finite() && len >= EPS)
            .then(|| Self::new(self.dx / len, self.dy / len, self.dz / len))
    }

    /// Component `axis` (0 = x, 1 = y, 2 = z).
    pub fn component(&self, axis: usize) -> f64 {
        match axis {
            0 => self.dx,
            1 => self.dy,
            _ => self.dz,
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(4);
        write!(f, "[{:.prec$}, {:.prec$}, {:.prec$}]", self.dx, self.dy, self.dz)
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy, self.dz + rhs.dz)
    }
}

impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, scale: f64) -> Self {
        Self::new(self.dx * scale, self.dy * scale, self.dz * scale)
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        self * -1.
    }
}
