// math.rs — 3-component vector and plane math.
//
// Compiled levels store single-precision floats; all reconstruction math
// stays in f32 to avoid inventing precision the inputs never had.

use std::ops::{Add, Div, Mul, Neg, Sub};

pub const EQUALITY_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

pub const fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3 { x, y, z }
}

impl Vec3 {
    pub const ZERO: Vec3 = vec3(0.0, 0.0, 0.0);

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        vec3(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Unit vector in the same direction, or zero if the vector has no
    /// meaningful length.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len < EQUALITY_EPSILON {
            Vec3::ZERO
        } else {
            self / len
        }
    }

    pub fn approx_eq(self, other: Vec3) -> bool {
        (self - other).length() < EQUALITY_EPSILON
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        vec3(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        vec3(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        vec3(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: f32) -> Vec3 {
        vec3(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        vec3(-self.x, -self.y, -self.z)
    }
}

/// A half-space boundary: `normal · p = dist` for points on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f32) -> Plane {
        Plane { normal, dist }
    }

    /// Plane through three points wound clockwise when viewed from the
    /// front (the convention every supported map dialect uses).
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Plane {
        let normal = (c - a).cross(b - a).normalized();
        Plane {
            normal,
            dist: normal.dot(a),
        }
    }

    pub fn distance_to(self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.dist
    }

    /// Synthesize three non-collinear points on the plane. Used when a side
    /// has no surviving vertices; the points are derived from the plane
    /// equation alone, so any consistent basis will do.
    pub fn three_points(self) -> [Vec3; 3] {
        let origin = self.normal * self.dist;
        let (s, t) = self.basis();
        // Wound so that from_points() recovers the same normal.
        [origin + s * 64.0, origin, origin + t * 64.0]
    }

    /// A deterministic in-plane basis derived from the normal.
    pub fn basis(self) -> (Vec3, Vec3) {
        let up = if self.normal.z.abs() > 0.99 {
            vec3(1.0, 0.0, 0.0)
        } else {
            vec3(0.0, 0.0, 1.0)
        };
        let s = up.cross(self.normal).normalized();
        let t = self.normal.cross(s).normalized();
        (s, t)
    }
}

/// Twice the area of the triangle (a, b, c), squared. Cheap degeneracy test
/// that avoids the square root.
pub fn triangle_area_squared(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b - a).cross(c - a).length_squared()
}
