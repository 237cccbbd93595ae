//! Math kernel
//!
//! Planar and spatial vectors, degree-based rotation helpers, arc queries and
//! axis-aligned bounding boxes. All angles are in degrees, positive
//! counter-clockwise.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Linear tolerance used for coincidence tests.
pub const PRECISION: f64 = 1e-5;

/// Angular tolerance in degrees.
pub const ANGULAR_PRECISION: f64 = 1e-3;

/// A 2D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` degrees from +X.
    pub fn from_angle(angle: f64) -> Self {
        let (s, c) = angle.to_radians().sin_cos();
        Self::new(c, s)
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(&self, other: &Vec2) -> f64 {
        (*other - *self).length()
    }

    pub fn dot(&self, other: &Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(&self, other: &Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn approx_eq(&self, other: &Vec2) -> bool {
        self.distance_to(other) < PRECISION
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// A 3D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn lerp(&self, other: &Vec3, t: f64) -> Vec3 {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
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

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Rotate `v` about the origin by `angle` degrees.
///
/// Vectors shorter than [`PRECISION`] are returned unchanged so that a point
/// sitting on the pivot never picks up rounding noise.
pub fn rotate2d(v: Vec2, angle: f64) -> Vec2 {
    if v.length() < PRECISION {
        return v;
    }
    let (s, c) = angle.to_radians().sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Rotate `p` about `datum` by `angle` degrees.
pub fn rotate_about(p: Vec2, datum: Vec2, angle: f64) -> Vec2 {
    rotate2d(p - datum, angle) + datum
}

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Whether `test` lies on the arc that starts at `start` and sweeps `sweep`
/// degrees (negative = clockwise), with [`ANGULAR_PRECISION`] slack.
pub fn angle_within_arc(start: f64, sweep: f64, test: f64) -> bool {
    let (begin, end) = if sweep < 0.0 {
        (start + sweep, start)
    } else {
        (start, start + sweep)
    };
    let within = |a: f64| a >= begin - ANGULAR_PRECISION && a <= end + ANGULAR_PRECISION;

    within(test) || within(test + 360.0) || within(test - 360.0)
}

/// Angle of `point` as seen from `center`, in `[0, 360)`.
///
/// Returns `0.0` when the two coincide.
pub fn xy_to_angle(center: Vec2, point: Vec2) -> f64 {
    let d = point - center;
    if d.length() < PRECISION {
        return 0.0;
    }
    wrap_degrees(d.y.atan2(d.x).to_degrees())
}

/// Center of an arc given its start point, radius and start angle.
pub fn arc_center(start: Vec2, radius: f64, start_angle: f64) -> Vec2 {
    start - Vec2::from_angle(start_angle) * radius
}

/// End point of an arc given its start point, radius, start angle and sweep.
pub fn arc_end(start: Vec2, radius: f64, start_angle: f64, sweep: f64) -> Vec2 {
    arc_center(start, radius, start_angle) + Vec2::from_angle(start_angle + sweep) * radius
}

/// Axis-aligned bounding box in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// The inverted box; any `include` makes it valid.
    pub const EMPTY: Aabb = Aabb {
        min: Vec2 {
            x: f64::INFINITY,
            y: f64::INFINITY,
        },
        max: Vec2 {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        },
    };

    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Self {
        let mut aabb = Aabb::EMPTY;
        for p in points {
            aabb.include(p);
        }
        aabb
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn include(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        if !other.is_valid() {
            return *self;
        }
        if !self.is_valid() {
            return *other;
        }
        let mut out = *self;
        out.include(other.min);
        out.include(other.max);
        out
    }

    /// Extents of an arc including any cardinal points it passes through.
    pub fn of_arc(center: Vec2, radius: f64, start_angle: f64, sweep: f64) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        aabb.include(center + Vec2::from_angle(start_angle) * radius);
        aabb.include(center + Vec2::from_angle(start_angle + sweep) * radius);
        for cardinal in [0.0, 90.0, 180.0, 270.0] {
            if angle_within_arc(start_angle, sweep, cardinal) {
                aabb.include(center + Vec2::from_angle(cardinal) * radius);
            }
        }
        aabb
    }

    pub fn width(&self) -> f64 {
        if self.is_valid() {
            self.max.x - self.min.x
        } else {
            0.0
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_valid() {
            self.max.y - self.min.y
        } else {
            0.0
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_angle_within_arc_ccw() {
        assert!(angle_within_arc(0.0, 90.0, 45.0));
        assert!(!angle_within_arc(0.0, 90.0, 135.0));
        assert!(angle_within_arc(350.0, 20.0, 5.0));
    }

    #[test]
    fn test_angle_within_arc_cw() {
        assert!(angle_within_arc(10.0, -20.0, 355.0));
        assert!(angle_within_arc(90.0, -90.0, 0.0));
        assert!(!angle_within_arc(90.0, -90.0, 180.0));
    }

    #[test]
    fn test_angle_within_arc_tolerance() {
        assert!(angle_within_arc(0.0, 90.0, 90.0 + ANGULAR_PRECISION / 2.0));
        assert!(!angle_within_arc(0.0, 90.0, 90.1));
    }

    #[test]
    fn test_xy_to_angle() {
        let c = Vec2::new(1.0, 1.0);
        assert!(close(xy_to_angle(c, Vec2::new(2.0, 1.0)), 0.0));
        assert!(close(xy_to_angle(c, Vec2::new(1.0, 2.0)), 90.0));
        assert!(close(xy_to_angle(c, Vec2::new(1.0, 0.0)), 270.0));
        assert_eq!(xy_to_angle(c, c), 0.0);
    }

    #[test]
    fn test_rotate2d_degenerate() {
        let tiny = Vec2::new(1e-7, 0.0);
        assert_eq!(rotate2d(tiny, 90.0), tiny);
        let r = rotate2d(Vec2::new(1.0, 0.0), 90.0);
        assert!(close(r.x, 0.0) && close(r.y, 1.0));
    }

    #[test]
    fn test_wrap_degrees() {
        assert!(close(wrap_degrees(370.0), 10.0));
        assert!(close(wrap_degrees(-90.0), 270.0));
        assert_eq!(wrap_degrees(360.0), 0.0);
        let w = wrap_degrees(-1e-17);
        assert!((0.0..360.0).contains(&w));
    }

    #[test]
    fn test_arc_end_quarter() {
        let end = arc_end(Vec2::new(1.0, 0.0), 1.0, 0.0, 90.0);
        assert!(end.approx_eq(&Vec2::new(0.0, 1.0)));
        assert!(arc_center(Vec2::new(1.0, 0.0), 1.0, 0.0).approx_eq(&Vec2::ZERO));
    }

    #[test]
    fn test_aabb_empty_is_inverted() {
        let aabb = Aabb::EMPTY;
        assert!(!aabb.is_valid());
        assert_eq!(aabb.min.x, f64::INFINITY);
        assert_eq!(aabb.max.y, f64::NEG_INFINITY);
        assert_eq!(aabb.width(), 0.0);
    }

    #[test]
    fn test_aabb_of_arc_cardinals() {
        let aabb = Aabb::of_arc(Vec2::ZERO, 2.0, 0.0, 180.0);
        assert!(close(aabb.max.y, 2.0));
        assert!(close(aabb.min.x, -2.0));
        assert!(close(aabb.min.y, 0.0));
    }

    #[test]
    fn test_aabb_union_with_empty() {
        let a = Aabb::from_points([Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]);
        assert_eq!(a.union(&Aabb::EMPTY), a);
        assert_eq!(Aabb::EMPTY.union(&a), a);
    }
}
