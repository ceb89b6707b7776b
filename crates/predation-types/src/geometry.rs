//! Two-dimensional vector geometry for positions and headings.
//!
//! Headings are unit vectors; positions live in the torus
//! `[0, width) x [0, height)`. All operations that divide by a length guard
//! against zero-length vectors and report the degenerate case through
//! `Option` instead of producing `NaN`.

use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero.
pub const EPSILON: f64 = 1e-12;

/// A 2D real-valued vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector pointing "north" (positive y), the default heading.
    pub const NORTH: Self = Self { x: 0.0, y: 1.0 };

    /// Create a vector from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `degrees` measured counter-clockwise from the x-axis.
    pub fn from_angle_degrees(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        Self::new(radians.cos(), radians.sin())
    }

    /// Component-wise sum.
    pub const fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Scale both components by `factor`.
    pub const fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// The opposite vector.
    pub const fn negate(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Whether the vector is too short to carry a direction.
    pub fn is_degenerate(self) -> bool {
        !self.x.is_finite() || !self.y.is_finite() || self.length() < EPSILON
    }

    /// Unit vector in the same direction, or `None` for a degenerate vector.
    pub fn normalize(self) -> Option<Self> {
        if self.is_degenerate() {
            return None;
        }
        let len = self.length();
        Some(Self::new(self.x / len, self.y / len))
    }

    /// Rotate counter-clockwise by `degrees`.
    pub fn rotate_degrees(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            self.x.mul_add(cos, -(self.y * sin)),
            self.x.mul_add(sin, self.y * cos),
        )
    }

    /// Unsigned angle between two vectors in degrees (`0..=180`), computed
    /// as `acos(a.b / |a||b|)`.
    ///
    /// Returns `None` if either vector is degenerate.
    pub fn angle_between_degrees(self, other: Self) -> Option<f64> {
        if self.is_degenerate() || other.is_degenerate() {
            return None;
        }
        let cos = self.dot(other) / (self.length() * other.length());
        // Rounding can push |cos| marginally past 1.
        Some(cos.clamp(-1.0, 1.0).acos().to_degrees())
    }

    /// Signed 2D cross product (z component of the 3D cross product).
    ///
    /// Positive when `other` lies counter-clockwise of `self`.
    pub fn cross(self, other: Self) -> f64 {
        self.x.mul_add(other.y, -(self.y * other.x))
    }

    /// Turn `self` toward `target` by at most `max_degrees`.
    ///
    /// Falls back to `self` when either vector is degenerate.
    pub fn turn_toward(self, target: Self, max_degrees: f64) -> Self {
        let Some(angle) = self.angle_between_degrees(target) else {
            return self;
        };
        if angle <= max_degrees {
            return target.normalize().unwrap_or(self);
        }
        let sign = if self.cross(target) >= 0.0 { 1.0 } else { -1.0 };
        self.rotate_degrees(sign * max_degrees)
    }
}
