//! 2D geometry kernel: point/vector aliases plus the few predicates the
//! engine relies on.
//!
//! The seed search and the region tests require exact sign agreement between
//! the in-circle predicate and the orientation tests, so everything
//! sign-sensitive lives here rather than being scattered over the engine.

use cgmath::{InnerSpace, Point2, Vector2};


pub type Point = Point2<f64>;
pub type Vec2 = Vector2<f64>;

pub fn pt(x: f64, y: f64) -> Point {
    Point2::new(x, y)
}

/// Extension methods on 2D vectors.
pub trait VecExt {
    /// Rotate by +90° (counter-clockwise): `(x, y) -> (-y, x)`.
    fn xy_perp(self) -> Vec2;
    fn cross(self, other: Vec2) -> f64;
    fn norm(self) -> f64;
    fn norm_sq(self) -> f64;
}

impl VecExt for Vec2 {
    fn xy_perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn norm(self) -> f64 {
        self.magnitude()
    }

    fn norm_sq(self) -> f64 {
        self.magnitude2()
    }
}

/// Extension methods on 2D points.
pub trait PointExt {
    /// Is this point strictly right of the directed line `p1 -> p2`?
    fn is_right(&self, p1: Point, p2: Point) -> bool;
    fn norm(&self) -> f64;
    fn dist(&self, other: Point) -> f64;
}

impl PointExt for Point {
    fn is_right(&self, p1: Point, p2: Point) -> bool {
        (p2 - p1).cross(*self - p1) < 0.0
    }

    fn norm(&self) -> f64 {
        Vec2::new(self.x, self.y).norm()
    }

    fn dist(&self, other: Point) -> f64 {
        (*self - other).norm()
    }
}


// ===========================================================================
// ===== Diangle: a monotone surrogate for the polar angle
// ===========================================================================

// The diangle maps a direction to [0, 4): 0 along +x, 1 along +y, 2 along
// -x, 3 along -y, increasing counter-clockwise. Cheaper to compare than
// atan2 and exact for axis directions.

pub fn diangle(x: f64, y: f64) -> f64 {
    if y >= 0.0 {
        if x >= 0.0 {
            y / (x + y)
        } else {
            1.0 - x / (-x + y)
        }
    } else if x < 0.0 {
        2.0 - y / (-x - y)
    } else {
        3.0 + x / (x - y)
    }
}

pub fn diangle_of(dir: Vec2) -> f64 {
    diangle(dir.x, dir.y)
}

/// A (non-normalized) direction whose diangle is `a`.
pub fn diangle_dir(a: f64) -> Vec2 {
    let x = if a < 2.0 { 1.0 - a } else { a - 3.0 };
    let y = if a < 3.0 {
        if a > 1.0 { 2.0 - a } else { a }
    } else {
        a - 4.0
    };
    Vec2::new(x, y)
}

/// Is `a` strictly between `less` and `more`, walking counter-clockwise
/// from `less` (wrapping at 4)?
pub fn diangle_bracket(less: f64, a: f64, more: f64) -> bool {
    if less == more {
        false
    } else if less <= more {
        less < a && a < more
    } else {
        // the bracket crosses the 4 -> 0 seam
        (less < a && a <= 4.0) || (0.0 <= a && a < more)
    }
}

/// Midpoint of the counter-clockwise walk from `alfa1` to `alfa2`.
pub fn diangle_mid(alfa1: f64, alfa2: f64) -> f64 {
    if alfa2 >= alfa1 {
        0.5 * (alfa1 + alfa2)
    } else {
        let mut mid = 0.5 * (alfa1 + alfa2) + 2.0;
        if mid >= 4.0 {
            mid -= 4.0;
        }
        mid
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn diangle_axes() {
        assert_relative_eq!(diangle(1.0, 0.0), 0.0);
        assert_relative_eq!(diangle(0.0, 1.0), 1.0);
        assert_relative_eq!(diangle(-1.0, 0.0), 2.0);
        assert_relative_eq!(diangle(0.0, -1.0), 3.0);
    }

    #[test]
    fn diangle_monotone_ccw() {
        let dirs = [
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (-1.0, 1.0),
            (-1.0, 0.0),
            (-1.0, -1.0),
            (0.0, -1.0),
            (1.0, -1.0),
        ];
        for w in dirs.windows(2) {
            assert!(diangle(w[0].0, w[0].1) < diangle(w[1].0, w[1].1));
        }
    }

    #[test]
    fn diangle_dir_roundtrip() {
        for &a in &[0.0, 0.3, 1.0, 1.7, 2.0, 2.5, 3.0, 3.9] {
            let d = diangle_dir(a);
            assert_relative_eq!(diangle_of(d), a, epsilon = 1e-12);
        }
    }

    #[test]
    fn bracket_plain_and_wrapping() {
        assert!(diangle_bracket(0.5, 1.0, 2.0));
        assert!(!diangle_bracket(0.5, 2.5, 2.0));
        assert!(!diangle_bracket(1.0, 1.0, 2.0));
        // wrap across the seam
        assert!(diangle_bracket(3.5, 3.9, 0.5));
        assert!(diangle_bracket(3.5, 0.2, 0.5));
        assert!(!diangle_bracket(3.5, 2.0, 0.5));
        assert!(!diangle_bracket(1.0, 1.5, 1.0));
    }

    #[test]
    fn mid_plain_and_wrapping() {
        assert_relative_eq!(diangle_mid(1.0, 2.0), 1.5);
        assert_relative_eq!(diangle_mid(3.5, 0.5), 0.0);
        assert_relative_eq!(diangle_mid(3.0, 1.0), 0.0);
    }

    #[test]
    fn is_right_orientation() {
        let a = pt(0.0, 0.0);
        let b = pt(1.0, 0.0);
        assert!(pt(0.5, -1.0).is_right(a, b));
        assert!(!pt(0.5, 1.0).is_right(a, b));
    }
}
