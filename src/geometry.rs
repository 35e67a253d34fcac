// Grid geometry for the 3D arena
//
// Cells and directions share one integer vector type. Everything here is pure
// and total: no panics, no division by zero.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Integer 3D vector used both as a cell position and as a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Vec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Vec3 { x, y, z }
    }

    /// The six axis-aligned unit steps, in neighbor enumeration order
    pub const UNIT_STEPS: [Vec3; 6] = [
        Vec3::new(1, 0, 0),
        Vec3::new(-1, 0, 0),
        Vec3::new(0, 1, 0),
        Vec3::new(0, -1, 0),
        Vec3::new(0, 0, 1),
        Vec3::new(0, 0, -1),
    ];

    /// Returns the six 6-connected neighbors (+x, -x, +y, -y, +z, -z)
    pub fn neighbors(&self) -> [Vec3; 6] {
        Self::UNIT_STEPS.map(|step| *self + step)
    }

    pub fn manhattan(&self, other: Vec3) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    pub fn length(&self) -> f64 {
        let (x, y, z) = (self.x as f64, self.y as f64, self.z as f64);
        (x * x + y * y + z * z).sqrt()
    }

    pub fn distance(&self, other: Vec3) -> f64 {
        (*self - other).length()
    }

    pub fn dot(&self, other: Vec3) -> i64 {
        self.x as i64 * other.x as i64 + self.y as i64 * other.y as i64 + self.z as i64 * other.z as i64
    }

    /// Unit float vector pointing the same way; the zero vector maps to zero
    pub fn normalize(&self) -> Vec3f {
        let len = self.length();
        if len == 0.0 {
            return Vec3f::ZERO;
        }
        Vec3f {
            x: self.x as f64 / len,
            y: self.y as f64 / len,
            z: self.z as f64 / len,
        }
    }

    pub fn is_unit_step(&self) -> bool {
        self.x.abs() + self.y.abs() + self.z.abs() == 1
    }
}

impl From<[i32; 3]> for Vec3 {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Vec3 { x, y, z }
    }
}

impl From<Vec3> for [i32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<i32> for Vec3 {
    type Output = Vec3;

    fn mul(self, k: i32) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }
}

/// Integer division per axis, truncating toward zero. Dividing by zero yields zero.
impl Div<i32> for Vec3 {
    type Output = Vec3;

    fn div(self, k: i32) -> Vec3 {
        if k == 0 {
            return Vec3::ZERO;
        }
        Vec3::new(self.x / k, self.y / k, self.z / k)
    }
}

/// Float companion of `Vec3`, produced by normalization and scaled waypoints
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3f {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3f {
    pub const ZERO: Vec3f = Vec3f { x: 0.0, y: 0.0, z: 0.0 };

    /// Rounds each component to the nearest integer (halves away from zero)
    pub fn round(&self) -> Vec3 {
        Vec3::new(self.x.round() as i32, self.y.round() as i32, self.z.round() as i32)
    }
}

impl Mul<f64> for Vec3f {
    type Output = Vec3f;

    fn mul(self, k: f64) -> Vec3f {
        Vec3f {
            x: self.x * k,
            y: self.y * k,
            z: self.z * k,
        }
    }
}

/// Cosine of the angle between two vectors, in [-1, 1]
///
/// Used to order neighbors by how well a step lines up with a preferred
/// heading. Returns 0 when either vector is zero.
pub fn cosine_similarity(a: Vec3, b: Vec3) -> f64 {
    let denom = a.length() * b.length();
    if denom == 0.0 {
        return 0.0;
    }
    a.dot(b) as f64 / denom
}

/// World extent: every axis spans [0, bound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounds(pub Vec3);

impl Bounds {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Bounds(Vec3::new(x, y, z))
    }

    pub fn contains(&self, cell: Vec3) -> bool {
        (0..self.0.x).contains(&cell.x) && (0..self.0.y).contains(&cell.y) && (0..self.0.z).contains(&cell.z)
    }

    /// True when some axis has no cells at all
    pub fn is_degenerate(&self) -> bool {
        self.0.x <= 0 || self.0.y <= 0 || self.0.z <= 0
    }

    pub fn center(&self) -> Vec3 {
        self.0 / 2
    }

    pub fn diagonal(&self) -> f64 {
        self.0.length()
    }

    /// Nearest in-bounds cell; only meaningful for non-degenerate bounds
    pub fn clamp(&self, cell: Vec3) -> Vec3 {
        Vec3::new(
            cell.x.clamp(0, (self.0.x - 1).max(0)),
            cell.y.clamp(0, (self.0.y - 1).max(0)),
            cell.z.clamp(0, (self.0.z - 1).max(0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_are_six_unit_steps() {
        let origin = Vec3::new(4, 4, 4);
        let neighbors = origin.neighbors();
        assert_eq!(neighbors.len(), 6);
        for n in neighbors {
            assert_eq!(origin.manhattan(n), 1);
            assert!((n - origin).is_unit_step());
        }
        assert_eq!(neighbors[0], Vec3::new(5, 4, 4));
        assert_eq!(neighbors[5], Vec3::new(4, 4, 3));
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3f::ZERO);
        assert_eq!(Vec3::ZERO.normalize().round(), Vec3::ZERO);
    }

    #[test]
    fn test_normalize_and_scale_rounds_to_grid() {
        let v = Vec3::new(10, 0, 0);
        assert_eq!((v.normalize() * 3.0).round(), Vec3::new(3, 0, 0));

        let diagonal = Vec3::new(4, 4, 0);
        assert_eq!((diagonal.normalize() * 4.0).round(), Vec3::new(3, 3, 0));
    }

    #[test]
    fn test_distances() {
        let a = Vec3::new(0, 0, 0);
        let b = Vec3::new(3, 4, 0);
        assert_eq!(a.manhattan(b), 7);
        assert!((a.distance(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_orders_by_alignment() {
        let heading = Vec3::new(1, 1, 0);
        let along = cosine_similarity(Vec3::new(1, 0, 0), heading);
        let across = cosine_similarity(Vec3::new(0, 0, 1), heading);
        let against = cosine_similarity(Vec3::new(-1, 0, 0), heading);
        assert!(along > across);
        assert!(across > against);
        assert_eq!(cosine_similarity(Vec3::ZERO, heading), 0.0);
    }

    #[test]
    fn test_bounds_contains_and_clamp() {
        let bounds = Bounds::new(10, 10, 1);
        assert!(bounds.contains(Vec3::new(0, 9, 0)));
        assert!(!bounds.contains(Vec3::new(10, 0, 0)));
        assert!(!bounds.contains(Vec3::new(0, 0, 1)));
        assert!(!bounds.contains(Vec3::new(-1, 0, 0)));
        assert_eq!(bounds.clamp(Vec3::new(-3, 12, 5)), Vec3::new(0, 9, 0));
        assert_eq!(bounds.center(), Vec3::new(5, 5, 0));
        assert!(Bounds::new(3, 0, 1).is_degenerate());
    }

    #[test]
    fn test_vec3_serializes_as_array() {
        let v: Vec3 = serde_json::from_str("[1, -2, 3]").unwrap();
        assert_eq!(v, Vec3::new(1, -2, 3));
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1,-2,3]");
    }
}
