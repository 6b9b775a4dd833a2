//! Sites: the generators that own Voronoi cells.
//!
//! A site is either an isolated point or one offset-side of a line segment.
//! A segment always contributes *two* line sites (one per side, labelled by
//! `k = ±1`), each owning its own face.

use cgmath::InnerSpace;

use crate::geo::{Point, PointExt, VecExt};


/// A point site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSite {
    pub position: Point,
}

/// One offset-side of a directed line segment `start -> end`.
///
/// The line coefficients describe `a·x + b·y + c = 0` with `(a, b)` the unit
/// normal pointing right of the travel direction, so the covered side (the
/// cell of this site) has negative signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSite {
    pub start: Point,
    pub end: Point,
    /// Offset-side label, ±1.
    pub k: i8,
    a: f64,
    b: f64,
    c: f64,
}

impl LineSite {
    pub fn new(start: Point, end: Point, k: i8) -> Self {
        debug_assert!(k == 1 || k == -1);
        let d = (end - start).norm();
        debug_assert!(d > 0.0);
        let a = (end.y - start.y) / d;
        let b = (start.x - end.x) / d;
        let c = -(a * start.x + b * start.y);
        LineSite { start, end, k, a, b, c }
    }
}

/// A tagged site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Site {
    Point(PointSite),
    Line(LineSite),
}

impl Site {
    pub fn point(position: Point) -> Self {
        Site::Point(PointSite { position })
    }

    pub fn line(start: Point, end: Point, k: i8) -> Self {
        Site::Line(LineSite::new(start, end, k))
    }

    pub fn is_point(&self) -> bool {
        match self {
            Site::Point(_) => true,
            Site::Line(_) => false,
        }
    }

    pub fn is_line(&self) -> bool {
        !self.is_point()
    }

    /// Position of a point site. Panics for line sites.
    pub fn position(&self) -> Point {
        match self {
            Site::Point(s) => s.position,
            Site::Line(_) => panic!("position() called on a line site"),
        }
    }

    pub fn start(&self) -> Point {
        match self {
            Site::Point(s) => s.position,
            Site::Line(s) => s.start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Site::Point(s) => s.position,
            Site::Line(s) => s.end,
        }
    }

    /// The point on the site closest to `q` (for a point site: the site
    /// itself; for a line site: the projection of `q`, clamped to the
    /// segment).
    pub fn apex_point(&self, q: Point) -> Point {
        match self {
            Site::Point(s) => s.position,
            Site::Line(s) => {
                let se = s.end - s.start;
                let t = (q - s.start).dot(se) / se.norm_sq();
                if t < 0.0 {
                    s.start
                } else if t > 1.0 {
                    s.end
                } else {
                    s.start + se * t
                }
            }
        }
    }

    /// Does `q` project onto the site? Always true for point sites; for a
    /// line site, true iff the perpendicular foot lies within the segment.
    pub fn in_region(&self, q: Point) -> bool {
        match self {
            Site::Point(_) => true,
            Site::Line(s) => {
                let se = s.end - s.start;
                let t = (q - s.start).dot(se) / se.norm_sq();
                (0.0..=1.0).contains(&t)
            }
        }
    }

    /// Coefficient `a` of the line equation. Zero for point sites.
    pub fn a(&self) -> f64 {
        match self {
            Site::Point(_) => 0.0,
            Site::Line(s) => s.a,
        }
    }

    pub fn b(&self) -> f64 {
        match self {
            Site::Point(_) => 0.0,
            Site::Line(s) => s.b,
        }
    }

    pub fn c(&self) -> f64 {
        match self {
            Site::Point(_) => 0.0,
            Site::Line(s) => s.c,
        }
    }

    /// Signed distance of `q` from a line site's supporting line (negative
    /// on the covered side).
    pub fn signed_distance(&self, q: Point) -> f64 {
        self.a() * q.x + self.b() * q.y + self.c()
    }

    /// Euclidean distance from `q` to the site.
    pub fn distance(&self, q: Point) -> f64 {
        q.dist(self.apex_point(q))
    }

    pub fn k(&self) -> i8 {
        match self {
            Site::Point(_) => 1,
            Site::Line(s) => s.k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::pt;
    use approx::assert_relative_eq;

    #[test]
    fn line_coefficients_normalized() {
        let s = Site::line(pt(0.0, 0.0), pt(2.0, 0.0), 1);
        assert_relative_eq!(s.a() * s.a() + s.b() * s.b(), 1.0);
        // points on the line satisfy the equation
        assert_relative_eq!(s.signed_distance(pt(1.0, 0.0)), 0.0);
        // (a, b) points right of travel: below the segment is positive
        assert!(s.signed_distance(pt(1.0, -1.0)) > 0.0);
        assert!(s.signed_distance(pt(1.0, 1.0)) < 0.0);
    }

    #[test]
    fn apex_point_projects_and_clamps() {
        let s = Site::line(pt(0.0, 0.0), pt(2.0, 0.0), 1);
        assert_relative_eq!(s.apex_point(pt(1.0, 1.0)).x, 1.0);
        assert_relative_eq!(s.apex_point(pt(1.0, 1.0)).y, 0.0);
        assert_eq!(s.apex_point(pt(-1.0, 1.0)), pt(0.0, 0.0));
        assert_eq!(s.apex_point(pt(3.0, 1.0)), pt(2.0, 0.0));
    }

    #[test]
    fn in_region_bounds() {
        let s = Site::line(pt(0.0, 0.0), pt(2.0, 0.0), 1);
        assert!(s.in_region(pt(0.0, 5.0)));
        assert!(s.in_region(pt(2.0, -5.0)));
        assert!(!s.in_region(pt(2.1, 0.0)));
        assert!(!s.in_region(pt(-0.1, 0.0)));

        let p = Site::point(pt(0.5, 0.5));
        assert!(p.in_region(pt(100.0, 100.0)));
        assert_eq!(p.apex_point(pt(3.0, 3.0)), pt(0.5, 0.5));
    }
}
