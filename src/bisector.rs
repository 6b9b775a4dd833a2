//! Analytic bisector curves attached to half-edges.
//!
//! Every non-null half-edge traces the bisector of the two sites whose faces
//! it separates. All bisector families fit one 8-parameter description,
//! parameterised by the clearance distance `t` (the common distance from the
//! curve point to both sites):
//!
//! ```text
//! x(t) = x0 - x1 - x2·t + σ·x3·√((x4 + x5·t)² - (x6 + x7·t)²)
//! y(t) = y0 - y1 - y2·t + σ·y3·√((y4 + y5·t)² - (y6 + y7·t)²)
//! ```
//!
//! where `σ = +1` when `sign` is true and `-1` otherwise. The `sign` selects
//! which of the two symmetric branches the half-edge follows; the convention
//! is `sign == true` ⇔ the branch left of the chord/axis from the first site
//! toward the second.

use crate::geo::{pt, Point, PointExt};
use crate::site::Site;


/// The 8-parameter bisector description of one half-edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    x: [f64; 8],
    y: [f64; 8],
    pub sign: bool,
}

/// Which curve family a parameter set describes. Point/point and line/line
/// bisectors are straight, point/line bisectors are parabolic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveFamily {
    Line,
    Parabola,
}

impl Curve {
    /// Placeholder for edges that carry no bisector (null edges, outer
    /// edges before parameterisation).
    pub fn unset() -> Self {
        Curve {
            x: [0.0; 8],
            y: [0.0; 8],
            sign: true,
        }
    }

    /// Bisector parameters for the ordered site pair `(s1, s2)`.
    ///
    /// `s1` is the site of the face this half-edge bounds. Dispatches on the
    /// site tags; the line/point case reuses the point/line parameters with
    /// the branch flipped, since the curve is the same parabola.
    pub fn from_sites(s1: &Site, s2: &Site, sign: bool) -> (Self, CurveFamily) {
        match (s1.is_point(), s2.is_point()) {
            (true, true) => (Self::point_point(s1, s2, sign), CurveFamily::Line),
            (true, false) => (Self::point_line(s1, s2, sign), CurveFamily::Parabola),
            (false, true) => (Self::point_line(s2, s1, !sign), CurveFamily::Parabola),
            (false, false) => (Self::line_line(s1, s2, sign), CurveFamily::Line),
        }
    }

    /// Perpendicular bisector of two point sites, parameterised by the
    /// distance `t ≥ d/2` to both points.
    fn point_point(s1: &Site, s2: &Site, sign: bool) -> Self {
        let p1 = s1.position();
        let p2 = s2.position();
        let d = p1.dist(p2);
        let alfa1 = (p2.x - p1.x) / d;
        let alfa2 = (p2.y - p1.y) / d;
        let alfa3 = -d / 2.0;
        Curve {
            x: [p1.x, alfa1 * alfa3, 0.0, -alfa2, 0.0, 1.0, alfa3, 0.0],
            y: [p1.y, alfa2 * alfa3, 0.0, alfa1, 0.0, 1.0, alfa3, 0.0],
            sign,
        }
    }

    /// Parabolic bisector of a point site (focus) and a line site
    /// (directrix). Points at clearance `t` satisfy `|q - p| = t` and lie at
    /// signed distance `-t` from the line (the covered side).
    fn point_line(s1: &Site, s2: &Site, sign: bool) -> Self {
        let p = s1.position();
        let (a, b) = (s2.a(), s2.b());
        let alfa3 = s2.signed_distance(p);
        Curve {
            x: [p.x, a * alfa3, a, -b, 0.0, 1.0, alfa3, 1.0],
            y: [p.y, b * alfa3, b, a, 0.0, 1.0, alfa3, 1.0],
            sign,
        }
    }

    /// Straight bisector of two line sites: the solution of
    /// `a1·x + b1·y + c1 = -t`, `a2·x + b2·y + c2 = -t`.
    fn line_line(s1: &Site, s2: &Site, sign: bool) -> Self {
        let det = s1.a() * s2.b() - s2.a() * s1.b();
        debug_assert!(det.abs() > 1e-15, "parallel line sites have no point bisector");
        let x0 = (s2.c() * s1.b() - s1.c() * s2.b()) / det;
        let y0 = (s2.a() * s1.c() - s1.a() * s2.c()) / det;
        let x2 = (s2.b() - s1.b()) / det;
        let y2 = (s1.a() - s2.a()) / det;
        Curve {
            x: [x0, 0.0, x2, 0.0, 0.0, 0.0, 0.0, 0.0],
            y: [y0, 0.0, y2, 0.0, 0.0, 0.0, 0.0, 0.0],
            sign,
        }
    }

    /// Separator ray from an endpoint toward a target vertex; `t` is the
    /// distance travelled from the endpoint.
    pub fn separator(endpoint: Point, target: Point) -> Self {
        let d = endpoint.dist(target);
        let dx = (target.x - endpoint.x) / d;
        let dy = (target.y - endpoint.y) / d;
        Curve {
            x: [endpoint.x, 0.0, -dx, 0.0, 0.0, 0.0, 0.0, 0.0],
            y: [endpoint.y, 0.0, -dy, 0.0, 0.0, 0.0, 0.0, 0.0],
            sign: true,
        }
    }

    /// The curve point at clearance `t`.
    ///
    /// Slightly negative discriminants (roundoff at the apex) are chopped to
    /// zero; genuinely negative ones fall back to the sqrt-free part.
    pub fn point(&self, t: f64) -> Point {
        let discr_x = chop(sq(self.x[4] + self.x[5] * t) - sq(self.x[6] + self.x[7] * t));
        let discr_y = chop(sq(self.y[4] + self.y[5] * t) - sq(self.y[6] + self.y[7] * t));
        if discr_x >= 0.0 && discr_y >= 0.0 {
            let sigma = if self.sign { 1.0 } else { -1.0 };
            let xc = self.x[0] - self.x[1] - self.x[2] * t + sigma * self.x[3] * discr_x.sqrt();
            let yc = self.y[0] - self.y[1] - self.y[2] * t + sigma * self.y[3] * discr_y.sqrt();
            if xc.is_nan() || yc.is_nan() {
                return pt(self.x[0] - self.x[1] - self.x[2] * t, self.y[0] - self.y[1] - self.y[2] * t);
            }
            pt(xc, yc)
        } else {
            pt(self.x[0] - self.x[1] - self.x[2] * t, self.y[0] - self.y[1] - self.y[2] * t)
        }
    }

    /// The smallest admissible clearance on this curve: half the generator
    /// distance for a point/point bisector, the parabola apex for a
    /// point/line bisector, zero for the linear families.
    pub fn minimum_t(&self, s1: &Site, s2: &Site) -> f64 {
        match (s1.is_point(), s2.is_point()) {
            (true, true) => s1.position().dist(s2.position()) / 2.0,
            (true, false) | (false, true) => -self.x[6] / (2.0 * self.x[7]),
            (false, false) => 0.0,
        }
    }
}

fn sq(a: f64) -> f64 {
    a * a
}

fn chop(a: f64) -> f64 {
    if a.abs() < 1e-12 {
        0.0
    } else {
        a
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{pt, PointExt};
    use approx::assert_relative_eq;

    #[test]
    fn point_point_midpoint_and_perpendicularity() {
        let s1 = Site::point(pt(-1.0, 0.0));
        let s2 = Site::point(pt(1.0, 0.0));
        let (c, fam) = Curve::from_sites(&s1, &s2, true);
        assert_eq!(fam, CurveFamily::Line);

        // at minimum t the curve passes through the midpoint
        let tmin = c.minimum_t(&s1, &s2);
        assert_relative_eq!(tmin, 1.0);
        let mid = c.point(tmin);
        assert_relative_eq!(mid.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(mid.y, 0.0, epsilon = 1e-12);

        // any point is equidistant from the two sites, at distance t
        for &t in &[1.0, 1.5, 2.0, 5.0] {
            let q = c.point(t);
            assert_relative_eq!(q.dist(s1.position()), t, epsilon = 1e-9);
            assert_relative_eq!(q.dist(s2.position()), t, epsilon = 1e-9);
        }

        // sign = true is the branch left of the chord s1 -> s2 (positive y)
        assert!(c.point(2.0).y > 0.0);
        let (c2, _) = Curve::from_sites(&s1, &s2, false);
        assert!(c2.point(2.0).y < 0.0);
    }

    #[test]
    fn parabola_equidistant_from_focus_and_directrix() {
        let focus = Site::point(pt(0.0, 1.0));
        // covered side of this line site is y > 0 (left of travel)
        let line = Site::line(pt(-5.0, 0.0), pt(5.0, 0.0), 1);
        let (c, fam) = Curve::from_sites(&focus, &line, true);
        assert_eq!(fam, CurveFamily::Parabola);

        let tmin = c.minimum_t(&focus, &line);
        assert_relative_eq!(tmin, 0.5);
        let apex = c.point(tmin);
        assert_relative_eq!(apex.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(apex.y, 0.5, epsilon = 1e-9);

        for &t in &[0.5, 0.75, 1.0, 2.0] {
            let q = c.point(t);
            assert_relative_eq!(q.dist(focus.position()), t, epsilon = 1e-9);
            assert_relative_eq!(line.signed_distance(q), -t, epsilon = 1e-9);
        }
    }

    #[test]
    fn parabola_flipped_pair_is_same_curve() {
        let focus = Site::point(pt(0.25, 0.5));
        let line = Site::line(pt(-1.0, 0.0), pt(1.0, 0.0), 1);
        let (c1, _) = Curve::from_sites(&focus, &line, true);
        let (c2, _) = Curve::from_sites(&line, &focus, false);
        for &t in &[0.5, 0.9, 1.3] {
            assert_relative_eq!(c1.point(t).x, c2.point(t).x, epsilon = 1e-12);
            assert_relative_eq!(c1.point(t).y, c2.point(t).y, epsilon = 1e-12);
        }
    }

    #[test]
    fn line_line_bisector() {
        // two perpendicular lines through the origin; both cover the
        // quadrant between them
        let l1 = Site::line(pt(0.0, 0.0), pt(1.0, 0.0), 1); // covers y > 0
        let l2 = Site::line(pt(0.0, 1.0), pt(0.0, 0.0), 1); // covers x > 0
        let (c, fam) = Curve::from_sites(&l1, &l2, true);
        assert_eq!(fam, CurveFamily::Line);
        for &t in &[0.5, 1.0, 2.0] {
            let q = c.point(t);
            assert_relative_eq!(l1.signed_distance(q), -t, epsilon = 1e-9);
            assert_relative_eq!(l2.signed_distance(q), -t, epsilon = 1e-9);
        }
    }

    #[test]
    fn separator_ray() {
        let c = Curve::separator(pt(1.0, 1.0), pt(4.0, 5.0));
        let q = c.point(5.0);
        assert_relative_eq!(q.x, 4.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 5.0, epsilon = 1e-12);
        assert_relative_eq!(c.point(0.0).dist(pt(1.0, 1.0)), 0.0, epsilon = 1e-12);
    }
}
