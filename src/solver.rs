//! Positioning of new vertices on existing bisector edges.
//!
//! When the delete-tree boundary crosses an edge, the new Voronoi vertex
//! lies where the clearance along that edge equals the distance to the
//! incoming site. Both endpoint clearance radii bracket the solution, and
//! the residual changes sign across the bracket, so a bisection on the
//! edge's curve parameter converges without any algebraic case analysis.

use log::warn;

use crate::geo::Point;
use crate::graph::HalfEdgeGraph;
use crate::handle::HalfEdgeHandle;
use crate::site::Site;

/// Result of positioning a new vertex on an edge.
#[derive(Debug, Clone, Copy)]
pub struct Solution {
    /// The new vertex position.
    pub p: Point,
    /// Clearance distance at `p` (the curve parameter).
    pub t: f64,
    /// Which offset-side of an incoming line site `p` lies on; +1 for point
    /// sites.
    pub k3: i8,
}

const MAX_ITER: usize = 120;

/// Position the new vertex on `edge` for the incoming `new_site`.
///
/// `edge` must run from the delete-tree into the kept region; the bracket
/// endpoints are the clearance radii of its two vertices.
pub fn position(g: &HalfEdgeGraph, edge: HalfEdgeHandle, new_site: &Site) -> Solution {
    let src = g.vertex(g.source(edge));
    let trg = g.vertex(g.target(edge));
    let curve = g.edge(edge).curve;

    let t_src = src.dist();
    let t_trg = trg.dist();
    let (mut lo, mut hi) = if t_src <= t_trg {
        (t_src, t_trg)
    } else {
        (t_trg, t_src)
    };

    let residual = |t: f64| new_site.distance(curve.point(t)) - t;

    let f_lo = residual(lo);
    let f_hi = residual(hi);
    if f_lo * f_hi > 0.0 {
        // no sign change; this means the predicates and the curve disagree
        // about where the boundary crosses. Take the midpoint and let the
        // caller log the residual.
        warn!(
            "position: residual does not change sign on {:?} ({:e} / {:e})",
            edge, f_lo, f_hi
        );
        let t = 0.5 * (lo + hi);
        return solution_at(curve.point(t), t, new_site);
    }

    let lo_negative = f_lo < 0.0;
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        if (residual(mid) < 0.0) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= ::std::f64::EPSILON * hi.max(1.0) {
            break;
        }
    }
    let t = 0.5 * (lo + hi);
    solution_at(curve.point(t), t, new_site)
}

fn solution_at(p: Point, t: f64, new_site: &Site) -> Solution {
    let k3 = match new_site {
        Site::Point(_) => 1,
        Site::Line(_) => {
            // covered side of the site's own equation carries its label
            if new_site.signed_distance(p) < 0.0 {
                1
            } else {
                -1
            }
        }
    };
    let k3 = k3 * new_site.k();
    Solution { p, t, k3 }
}

/// Residual of a solution: how far `p` is from being exactly at clearance
/// `t` from the sites meeting at `edge`, and from the incoming site.
pub fn dist_error(
    g: &HalfEdgeGraph,
    edge: HalfEdgeHandle,
    sol: &Solution,
    new_site: &Site,
) -> f64 {
    let mut err: f64 = (new_site.distance(sol.p) - sol.t).abs();
    let mut sites = Vec::with_capacity(2);
    if let Some(f) = g.edge(edge).face.into_option() {
        if let Some(site) = g.face(f).site {
            sites.push(site);
        }
    }
    if let Some(tw) = g.twin(edge) {
        if let Some(f) = g.edge(tw).face.into_option() {
            if let Some(site) = g.face(f).site {
                sites.push(site);
            }
        }
    }
    for site in sites {
        err = err.max((site.distance(sol.p) - sol.t).abs());
    }
    err
}

/// Bisect `f` for a root in `[lo, hi]`. Returns `None` when the endpoints do
/// not bracket a root.
pub fn bracket_root(mut lo: f64, mut hi: f64, f: impl Fn(f64) -> f64) -> Option<f64> {
    let f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo * f_hi >= 0.0 {
        return None;
    }
    let lo_negative = f_lo < 0.0;
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        if (f(mid) < 0.0) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= ::std::f64::EPSILON * hi.abs().max(1.0) {
            break;
        }
    }
    Some(0.5 * (lo + hi))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisector::Curve;
    use crate::geo::{pt, PointExt};
    use crate::graph::{EdgeKind, HalfEdgeGraph, VertexKind, VertexStatus};
    use approx::assert_relative_eq;

    #[test]
    fn positions_midpoint_between_symmetric_sites() {
        // bisector of (-1,0)/(1,0) is the y-axis; a new site at (0,2)
        // cuts it where |q - (0,2)| = |q - (±1,0)|, i.e. y = 3/4.
        let s1 = Site::point(pt(-1.0, 0.0));
        let s2 = Site::point(pt(1.0, 0.0));
        let new_site = Site::point(pt(0.0, 2.0));

        let mut g = HalfEdgeGraph::new();
        // edge from an inside vertex (low clearance) to a far one
        let (c, _) = Curve::from_sites(&s1, &s2, true);
        let a = g.add_vertex_with_generator(c.point(1.0), VertexStatus::In, VertexKind::Normal, pt(-1.0, 0.0));
        let b = g.add_vertex_with_generator(c.point(10.0), VertexStatus::Out, VertexKind::Normal, pt(-1.0, 0.0));
        let (e, _) = g.add_twin_edges(a, b);
        g.edge_mut(e).kind = EdgeKind::Line;
        g.edge_mut(e).curve = c;

        let sol = position(&g, e, &new_site);
        assert_relative_eq!(sol.p.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(sol.p.y, 0.75, epsilon = 1e-9);
        assert_relative_eq!(sol.t, sol.p.dist(pt(1.0, 0.0)), epsilon = 1e-9);
        assert_eq!(sol.k3, 1);
        assert!(dist_error(&g, e, &sol, &new_site) < 1e-9);
    }

    #[test]
    fn bracket_root_finds_crossing() {
        let root = bracket_root(0.0, 4.0, |t| t * t - 2.0).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-9);
        assert!(bracket_root(2.0, 4.0, |t| t * t - 2.0).is_none());
    }
}
