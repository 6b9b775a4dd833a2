//! Post-condition validation of the half-edge graph.
//!
//! Run after every public mutation. All checks are pure: repeated calls on
//! an unchanged graph give the same answer.

use log::error;

use crate::geo::PointExt;
use crate::graph::{FaceStatus, HalfEdgeGraph, VertexKind, VertexStatus};
use crate::handle::{FaceHandle, HalfEdgeHandle};


/// Full validation: every quantified invariant that must hold between
/// public operations.
pub fn is_valid(g: &HalfEdgeGraph, far_radius: f64) -> bool {
    all_twins_ok(g)
        && all_faces_ok(g)
        && vertex_statuses_quiescent(g)
        && face_statuses_quiescent(g)
        && vertex_degrees_ok(g)
        && far_radius_ok(g, far_radius)
        && face_sites_ok(g)
}

/// Twin reciprocity: `e.twin.twin == e` wherever a twin exists, and twins
/// connect the same vertex pair in opposite directions.
pub fn all_twins_ok(g: &HalfEdgeGraph) -> bool {
    for e in g.half_edges() {
        if !check_edge(g, e) {
            return false;
        }
    }
    true
}

/// Structural check of one half-edge.
pub fn check_edge(g: &HalfEdgeGraph, e: HalfEdgeHandle) -> bool {
    let src = g.source(e);
    let trg = g.target(e);
    if !g.contains_vertex(src) || !g.contains_vertex(trg) {
        error!("{:?} refers to a removed vertex", e);
        return false;
    }
    if let Some(tw) = g.twin(e) {
        if g.twin(tw) != Some(e) {
            error!("{:?}: twin pointers are not reciprocal", e);
            return false;
        }
        if g.source(tw) != trg || g.target(tw) != src {
            error!("{:?}: twin does not connect the same vertices", e);
            return false;
        }
    }
    true
}

/// Every face ring closes, stays on the face, and starts at `face.edge`.
pub fn all_faces_ok(g: &HalfEdgeGraph) -> bool {
    g.faces().all(|f| face_ok(g, f))
}

/// Ring check of one face: `face.edge.face == face`, following `next`
/// returns to the entry edge in a bounded number of steps, and every edge
/// on the walk belongs to the face.
pub fn face_ok(g: &HalfEdgeGraph, f: FaceHandle) -> bool {
    let start = match g.face(f).edge.into_option() {
        Some(e) => e,
        None => {
            error!("{:?} has no boundary edge", f);
            return false;
        }
    };
    let limit = g.num_half_edges() as usize + 1;
    let mut current = start;
    for _ in 0..limit {
        if g.edge(current).face.into_option() != Some(f) {
            error!("{:?}: ring edge {:?} belongs to another face", f, current);
            return false;
        }
        current = match g.edge(current).next.into_option() {
            Some(n) => n,
            None => {
                error!("{:?}: ring edge {:?} has no next", f, current);
                return false;
            }
        };
        if current == start {
            return true;
        }
    }
    error!("{:?}: ring does not close", f);
    false
}

/// Between insertions no vertex is `In` or `New`; `Out` is reserved for the
/// permanently-out kinds (frame corners, site markers, and null-face
/// endpoint/separator vertices, which sit on their site at clearance zero).
pub fn vertex_statuses_quiescent(g: &HalfEdgeGraph) -> bool {
    for v in g.vertices() {
        let vert = g.vertex(v);
        let ok = match vert.status {
            VertexStatus::Undecided => true,
            VertexStatus::Out => match vert.kind {
                VertexKind::Outer
                | VertexKind::Pointsite
                | VertexKind::Endpoint
                | VertexKind::Seppoint => true,
                _ => false,
            },
            VertexStatus::In | VertexStatus::New => false,
        };
        if !ok {
            error!("{:?} has status {:?} after the operation", v, vert.status);
            return false;
        }
    }
    true
}

pub fn face_statuses_quiescent(g: &HalfEdgeGraph) -> bool {
    for f in g.faces() {
        if g.face(f).status != FaceStatus::Nonincident {
            error!("{:?} is still flagged incident", f);
            return false;
        }
    }
    true
}

/// Degree bounds per vertex kind. `Normal` vertices have three incident
/// faces in the finished diagram; `Apex` and the null-face point kinds have
/// two; `Split` vertices must not survive an insertion at all.
pub fn vertex_degrees_ok(g: &HalfEdgeGraph) -> bool {
    for v in g.vertices() {
        let vert = g.vertex(v);
        let degree = vert.degree();
        let faces = g.adjacent_faces(v).len();
        let ok = match vert.kind {
            VertexKind::Split => false,
            VertexKind::Pointsite => degree == 0,
            // a normal vertex spliced into a null face (it carries an alfa
            // coordinate) only separates two faces
            VertexKind::Normal if !vert.alfa.is_nan() => degree >= 2,
            VertexKind::Normal => faces == 3 && degree == 3,
            VertexKind::Apex => faces == 2 && degree == 2,
            // endpoint vertices accumulate separators and line sites as
            // more segments share the endpoint
            VertexKind::Endpoint | VertexKind::Seppoint => degree >= 2,
            // the three frame corners have degree 2 (one edge is twin-less)
            VertexKind::Outer => degree >= 2,
        };
        if !ok {
            error!(
                "{:?} ({:?}) has degree {} with {} adjacent faces",
                v, vert.kind, degree, faces
            );
            return false;
        }
    }
    true
}

/// Every vertex on a site-owning face's ring is equidistant from that site
/// and its own clearance radius, up to numeric tolerance. Null faces carry
/// no site and are skipped.
pub fn face_sites_ok(g: &HalfEdgeGraph) -> bool {
    for f in g.faces() {
        let site = match g.face(f).site {
            Some(site) => site,
            None => continue,
        };
        for v in g.face_vertices(f) {
            let vert = g.vertex(v);
            let r = vert.dist();
            let err = (site.distance(vert.position) - r).abs();
            if err > 1e-6 * (1.0 + r) {
                error!(
                    "{:?} on ring of {:?} is off its bisector by {:e}",
                    v, f, err
                );
                return false;
            }
        }
    }
    true
}

/// Every outer vertex lies at or beyond the far radius; every site marker
/// lies strictly inside.
pub fn far_radius_ok(g: &HalfEdgeGraph, far_radius: f64) -> bool {
    for v in g.vertices() {
        let vert = g.vertex(v);
        match vert.kind {
            VertexKind::Outer => {
                if vert.position.norm() < far_radius {
                    error!("outer {:?} lies inside the far radius", v);
                    return false;
                }
            }
            VertexKind::Pointsite => {
                // user sites lie strictly inside; the three frame
                // generators sit at radius 3·far
                let n = vert.position.norm();
                if n >= far_radius && n < 3.0 * far_radius - 1e-9 {
                    error!("site marker {:?} lies outside the far radius", v);
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::pt;
    use crate::graph::HalfEdgeGraph;

    #[test]
    fn empty_graph_is_valid() {
        let g = HalfEdgeGraph::new();
        assert!(is_valid(&g, 1.0));
    }

    #[test]
    fn foreign_edge_in_ring_is_rejected() {
        let mut g = HalfEdgeGraph::new();
        let a = g.add_vertex(pt(0.0, 0.0), VertexStatus::Undecided, VertexKind::Normal);
        let b = g.add_vertex(pt(1.0, 0.0), VertexStatus::Undecided, VertexKind::Normal);
        let (e, t) = g.add_twin_edges(a, b);
        let f = g.add_face();
        g.set_next_cycle(&[e, t], f, 1);
        assert!(face_ok(&g, f));

        // reassign t to another face without rewiring the ring
        let f2 = g.add_face();
        g.edge_mut(t).face = optional::Optioned::some(f2);
        assert!(!face_ok(&g, f));
    }

    #[test]
    fn leftover_in_status_is_rejected() {
        let mut g = HalfEdgeGraph::new();
        g.add_vertex(pt(0.0, 0.0), VertexStatus::In, VertexKind::Normal);
        assert!(!vertex_statuses_quiescent(&g));
    }
}
