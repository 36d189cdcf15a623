//! Quaternion value type used as the escape-time iteration variable
//!
//! Components are stored as `(x, y, z, w)` with `x` the real part and
//! `y`, `z`, `w` the `i`, `j`, `k` parts. All operations are total; the
//! magnitude of the zero quaternion is zero.

use nalgebra::RealField;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A quaternion `x + y·i + z·j + w·k`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quaternion<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

/// Single precision quaternion
pub type Quaternionf = Quaternion<f32>;

/// Double precision quaternion, used for deep zoom
pub type Quaterniond = Quaternion<f64>;

impl<T: RealField + Copy> Quaternion<T> {
    /// Create a quaternion from its four components
    pub fn new(x: T, y: T, z: T, w: T) -> Self {
        Self { x, y, z, w }
    }

    /// The zero quaternion
    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::zero())
    }

    /// A quaternion with only a real part
    pub fn from_real(x: T) -> Self {
        Self::new(x, T::zero(), T::zero(), T::zero())
    }

    /// `|q|² = x² + y² + z² + w²`
    #[inline]
    pub fn magnitude_squared(&self) -> T {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// `|q|`
    #[inline]
    pub fn magnitude(&self) -> T {
        self.magnitude_squared().sqrt()
    }

    /// Hamilton product `self * rhs`
    #[inline]
    pub fn hamilton(self, rhs: Self) -> Self {
        Self {
            x: self.x * rhs.x - self.y * rhs.y - self.z * rhs.z - self.w * rhs.w,
            y: self.x * rhs.y + self.y * rhs.x + self.z * rhs.w - self.w * rhs.z,
            z: self.x * rhs.z - self.y * rhs.w + self.z * rhs.x + self.w * rhs.y,
            w: self.x * rhs.w + self.y * rhs.z - self.z * rhs.y + self.w * rhs.x,
        }
    }

    /// `q²`, expanded. The imaginary cross terms cancel when squaring.
    #[inline]
    pub fn square(self) -> Self {
        let two = T::one() + T::one();
        Self {
            x: self.x * self.x - self.y * self.y - self.z * self.z - self.w * self.w,
            y: two * self.x * self.y,
            z: two * self.x * self.z,
            w: two * self.x * self.w,
        }
    }

    /// `q³ = q * q²`
    #[inline]
    pub fn cube(self) -> Self {
        self.hamilton(self.square())
    }

    /// Multiply every component by a scalar
    #[inline]
    pub fn scale(self, s: T) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl From<Quaternion<f32>> for Quaternion<f64> {
    fn from(q: Quaternion<f32>) -> Self {
        Quaternion::new(q.x as f64, q.y as f64, q.z as f64, q.w as f64)
    }
}

impl<T: RealField + Copy> Add for Quaternion<T> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl<T: RealField + Copy> Sub for Quaternion<T> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl<T: RealField + Copy> Mul for Quaternion<T> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.hamilton(rhs)
    }
}
