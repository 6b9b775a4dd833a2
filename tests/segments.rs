//! End-to-end tests for line-segment insertion.

use voron::geo::PointExt;
use voron::{pt, EdgeKind, FaceHandle, VertexKind, VoronoiDiagram};

/// Faces without a site are null faces.
fn null_faces(vd: &VoronoiDiagram) -> Vec<FaceHandle> {
    let g = vd.graph();
    g.faces().filter(|&f| g.face(f).site.is_none()).collect()
}

fn line_site_faces(vd: &VoronoiDiagram) -> Vec<FaceHandle> {
    let g = vd.graph();
    g.faces()
        .filter(|&f| g.face(f).site.map(|s| s.is_line()).unwrap_or(false))
        .collect()
}

#[test]
fn segment_between_two_points() {
    let mut vd = VoronoiDiagram::new(1.0, 10);
    let a = vd.insert_point_site(pt(-0.3, 0.0)).unwrap();
    let b = vd.insert_point_site(pt(0.3, 0.0)).unwrap();
    vd.insert_line_site(a, b).unwrap();

    assert_eq!(vd.num_line_sites(), 1);
    assert_eq!(vd.num_point_sites(), 5);
    assert!(vd.check());

    // one face per offset-side of the segment
    assert_eq!(line_site_faces(&vd).len(), 2);

    // a zero-area null face at each endpoint, bounded by three null edges
    let nulls = null_faces(&vd);
    assert_eq!(nulls.len(), 2);
    let g = vd.graph();
    for f in nulls {
        let ring = g.face_edges(f);
        assert_eq!(ring.len(), 3);
        for e in ring {
            assert_eq!(g.edge(e).kind, EdgeKind::Nulledge);
        }
    }
}

#[test]
fn unknown_or_degenerate_indices_are_rejected() {
    let mut vd = VoronoiDiagram::new(1.0, 10);
    let a = vd.insert_point_site(pt(-0.3, 0.0)).unwrap();
    assert!(vd.insert_line_site(a, 999).is_err());
    assert!(vd.insert_line_site(999, a).is_err());
    assert!(vd.insert_line_site(a, a).is_err());
    // frame generators have no registry entry either
    assert!(vd.insert_line_site(a, 1).is_err());
}

#[test]
fn segment_through_a_third_cell_leaves_no_split_vertices() {
    let mut vd = VoronoiDiagram::new(1.0, 10);
    let a = vd.insert_point_site(pt(-0.5, 0.0)).unwrap();
    let b = vd.insert_point_site(pt(0.5, 0.0)).unwrap();
    let _c = vd.insert_point_site(pt(0.0, 0.01)).unwrap();

    // the segment runs right under the third site; its sliver of a cell
    // survives, cut by transient split vertices
    vd.insert_line_site(a, b).unwrap();

    assert_eq!(vd.num_line_sites(), 1);
    assert_eq!(vd.num_split_vertices(), 0);
    assert!(vd.check());

    // the third site's cell still exists
    let g = vd.graph();
    let third_cell = g.faces().find(|&f| {
        g.face(f)
            .site
            .map(|s| s.is_point() && s.position() == pt(0.0, 0.01))
            .unwrap_or(false)
    });
    assert!(third_cell.is_some());
}

#[test]
fn two_segments_sharing_an_endpoint() {
    let mut vd = VoronoiDiagram::new(1.0, 10);
    let p1 = vd.insert_point_site(pt(0.0, 0.0)).unwrap();
    let p2 = vd.insert_point_site(pt(0.6, 0.0)).unwrap();
    let deg60 = 60f64.to_radians();
    let p3 = vd
        .insert_point_site(pt(0.6 * deg60.cos(), 0.6 * deg60.sin()))
        .unwrap();

    vd.insert_line_site(p1, p2).unwrap();
    vd.insert_line_site(p1, p3).unwrap();

    assert_eq!(vd.num_line_sites(), 2);
    assert!(vd.check());

    // the null face at the shared endpoint carries both segment ends; the
    // angular bracket rules must not have produced duplicate separators
    let g = vd.graph();
    let shared = null_faces(&vd)
        .into_iter()
        .filter(|&f| {
            g.face_vertices(f)
                .iter()
                .filter(|&&v| g.vertex(v).kind == VertexKind::Endpoint)
                .count()
                == 2
        })
        .collect::<Vec<_>>();
    assert_eq!(shared.len(), 1, "exactly one null face holds both segment ends");

    let ring = g.face_vertices(shared[0]);
    // every ring vertex sits exactly at the shared endpoint
    for &v in &ring {
        assert!(g.vertex(v).position.dist(pt(0.0, 0.0)) < 1e-12);
    }
    let mut sep_alfas: Vec<f64> = ring
        .iter()
        .filter(|&&v| g.vertex(v).kind == VertexKind::Seppoint)
        .map(|&v| g.vertex(v).alfa)
        .collect();
    assert!(sep_alfas.len() <= 4);
    sep_alfas.sort_by(|x, y| x.partial_cmp(y).unwrap());
    for w in sep_alfas.windows(2) {
        assert!(w[1] - w[0] > 1e-12, "duplicate separator at alfa {}", w[0]);
    }
}

#[test]
fn step_mode_line_insertion() {
    // every early stop leaves twin pointers reciprocal
    for step in 1..=11 {
        let mut vd = VoronoiDiagram::new(1.0, 10);
        let a = vd.insert_point_site(pt(-0.3, 0.0)).unwrap();
        let b = vd.insert_point_site(pt(0.3, 0.0)).unwrap();
        let done = vd.insert_line_site_stepped(a, b, Some(step)).unwrap();
        assert!(!done, "step {} must stop early", step);
        assert!(voron::check::all_twins_ok(vd.graph()), "twins broken at step {}", step);
    }
}

#[test]
fn point_site_after_a_segment() {
    let mut vd = VoronoiDiagram::new(1.0, 10);
    let a = vd.insert_point_site(pt(-0.4, -0.2)).unwrap();
    let b = vd.insert_point_site(pt(0.4, -0.2)).unwrap();
    vd.insert_line_site(a, b).unwrap();
    assert!(vd.check());

    // a later point site must stitch against the segment's parabolic
    // bisector without disturbing the endpoint machinery
    vd.insert_point_site(pt(0.0, 0.35)).unwrap();
    assert_eq!(vd.num_point_sites(), 6);
    assert_eq!(vd.num_line_sites(), 1);
    assert!(vd.check());
}

#[test]
fn cell_rings_stay_equidistant() {
    let mut vd = VoronoiDiagram::new(1.0, 10);
    let a = vd.insert_point_site(pt(-0.3, 0.1)).unwrap();
    let b = vd.insert_point_site(pt(0.2, -0.25)).unwrap();
    vd.insert_line_site(a, b).unwrap();

    // every vertex on a cell ring is equidistant from the cell's site and
    // its own clearance radius (the checker enforces the same bound)
    let g = vd.graph();
    for f in g.faces() {
        let site = match g.face(f).site {
            Some(s) => s,
            None => continue,
        };
        for v in g.face_vertices(f) {
            let vert = g.vertex(v);
            let err = (site.distance(vert.position) - vert.dist()).abs();
            assert!(err < 1e-6 * (1.0 + vert.dist()), "{:?} off by {:e}", v, err);
        }
    }
}
