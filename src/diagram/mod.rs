//! The incremental insertion engine.
//!
//! Inserting a site follows the classic incremental scheme: find a seed
//! vertex whose clearance disk the new site violates, grow the delete-tree
//! of doomed vertices outward by a weighted breadth-first expansion,
//! materialise new vertices on every tree-boundary edge, stitch the new
//! cell together by splitting each incident face, then remove the tree
//! interior and reset all transient flags.
//!
//! Line-segment insertion reuses the same skeleton and adds the endpoint
//! machinery (null faces, separators, split vertices); see [`segment`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use failure::Fail;
use log::{debug, trace, warn};
use optional::Optioned as Opt;
use ordered_float::NotNan;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::check;
use crate::geo::{pt, Point, PointExt};
use crate::graph::{
    EdgeKind, FaceStatus, HalfEdgeGraph, VertexKind, VertexStatus,
};
use crate::grid::FaceGrid;
use crate::handle::{FaceHandle, HalfEdgeHandle, VertexHandle};
use crate::site::Site;
use crate::solver;

mod segment;


/// Errors for calls that violate an engine precondition. Topological and
/// numeric troubles inside an insertion never surface here; they are
/// handled locally.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "point ({}, {}) does not lie inside the far radius", x, y)]
    OutsideFarRadius { x: f64, y: f64 },
    #[fail(display = "unknown point-site index {}", idx)]
    UnknownSiteIndex { idx: u32 },
    #[fail(display = "site indices {} and {} cannot form a segment", idx1, idx2)]
    DegenerateSegment { idx1: u32, idx2: u32 },
    /// The post-insertion topology check failed. The diagram is in an
    /// undefined state and must not be mutated further.
    #[fail(display = "topology check rejected the diagram: {}", detail)]
    InvariantViolation { detail: String },
}


// ===========================================================================
// ===== Per-insertion context
// ===========================================================================

/// Entry of the expansion queue, ordered by |in_circle| so the most
/// confidently classified vertex is processed first.
struct QueueEntry {
    v: VertexHandle,
    h: f64,
    rank: NotNan<f64>,
}

impl QueueEntry {
    fn new(v: VertexHandle, h: f64) -> Self {
        let rank = NotNan::new(h.abs()).unwrap_or_else(|_| NotNan::new(0.0).unwrap());
        QueueEntry { v, h, rank }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.v == other.v
    }
}
impl Eq for QueueEntry {}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank).then(self.v.cmp(&other.v))
    }
}

/// All state that lives for exactly one insertion. Created at the top of
/// each `insert_*` call and dropped before it returns, so the engine itself
/// carries nothing transient between calls.
struct InsertionCtx {
    queue: BinaryHeap<QueueEntry>,
    /// The delete-tree: vertices marked `In`, destroyed at the end.
    v0: Vec<VertexHandle>,
    /// Every vertex whose status or flags were touched.
    modified: FxHashSet<VertexHandle>,
    incident_faces: Vec<FaceHandle>,
    segment_start: Option<VertexHandle>,
    segment_end: Option<VertexHandle>,
    zero_point_face: Option<FaceHandle>,
    null_face1: Option<FaceHandle>,
    null_face2: Option<FaceHandle>,
}

impl InsertionCtx {
    fn new() -> Self {
        InsertionCtx {
            queue: BinaryHeap::new(),
            v0: Vec::new(),
            modified: FxHashSet::default(),
            incident_faces: Vec::new(),
            segment_start: None,
            segment_end: None,
            zero_point_face: None,
            null_face1: None,
            null_face2: None,
        }
    }
}

/// The NEW-NEW stitch location found on one incident face: the boundary
/// pattern `..-OUT-NEW(v1)-IN-..-IN-NEW(v2)-OUT-..` with the ring edges
/// around both NEW vertices.
#[derive(Clone, Copy)]
struct EdgeData {
    f: FaceHandle,
    v1: VertexHandle,
    v1_prv: HalfEdgeHandle,
    v1_nxt: HalfEdgeHandle,
    v2: VertexHandle,
    v2_prv: HalfEdgeHandle,
    v2_nxt: HalfEdgeHandle,
}


// ===========================================================================
// ===== The engine
// ===========================================================================

/// An incremental Voronoi diagram of point and line-segment sites.
pub struct VoronoiDiagram {
    g: HalfEdgeGraph,
    grid: FaceGrid,
    far_radius: f64,
    num_psites: usize,
    num_lsites: usize,
    /// Stable site index -> its `Pointsite` marker vertex.
    registry: FxHashMap<u32, VertexHandle>,
}

impl VoronoiDiagram {
    /// Create a diagram able to hold sites with `‖p‖ < far_radius`, with an
    /// `n_bins × n_bins` spatial index.
    pub fn new(far_radius: f64, n_bins: usize) -> Self {
        assert!(far_radius > 0.0, "far radius must be positive");
        let mut vd = VoronoiDiagram {
            g: HalfEdgeGraph::new(),
            grid: FaceGrid::new(far_radius, n_bins),
            far_radius,
            num_psites: 3,
            num_lsites: 0,
            registry: FxHashMap::default(),
        };
        vd.initialize();
        vd
    }

    /// Build the regular-triangle bounding frame: three generators at
    /// radius `3·far`, three outer vertices at `3·6·far`, the origin vertex
    /// and one apex per generator pair. Everything inserted later lands
    /// strictly inside this frame, so unbounded faces never arise.
    fn initialize(&mut self) {
        let far = self.far_radius;
        let far_multiplier = 6.0;
        let sqrt3 = 3f64.sqrt();

        let gen1 = pt(0.0, 3.0 * far);
        let gen2 = pt(-3.0 * sqrt3 * far / 2.0, -3.0 * far / 2.0);
        let gen3 = pt(3.0 * sqrt3 * far / 2.0, -3.0 * far / 2.0);

        let vd1 = pt(0.0, -3.0 * far * far_multiplier);
        let vd2 = pt(
            3.0 * sqrt3 * far * far_multiplier / 2.0,
            3.0 * far * far_multiplier / 2.0,
        );
        let vd3 = pt(
            -3.0 * sqrt3 * far * far_multiplier / 2.0,
            3.0 * far * far_multiplier / 2.0,
        );

        let g = &mut self.g;
        let v00 = g.add_vertex_with_generator(
            pt(0.0, 0.0), VertexStatus::Undecided, VertexKind::Normal, gen1,
        );
        let v01 = g.add_vertex_with_generator(vd1, VertexStatus::Out, VertexKind::Outer, gen3);
        let v02 = g.add_vertex_with_generator(vd2, VertexStatus::Out, VertexKind::Outer, gen1);
        let v03 = g.add_vertex_with_generator(vd3, VertexStatus::Out, VertexKind::Outer, gen2);

        // site markers for the three frame generators; these are not in the
        // registry, so they can never become segment endpoints
        g.add_vertex(gen1, VertexStatus::Out, VertexKind::Pointsite);
        g.add_vertex(gen2, VertexStatus::Out, VertexKind::Pointsite);
        g.add_vertex(gen3, VertexStatus::Out, VertexKind::Pointsite);

        let mid = |a: Point, b: Point| pt(0.5 * (a.x + b.x), 0.5 * (a.y + b.y));
        let a1 = g.add_vertex_with_generator(
            mid(gen2, gen3), VertexStatus::Undecided, VertexKind::Apex, gen2,
        );
        let a2 = g.add_vertex_with_generator(
            mid(gen1, gen3), VertexStatus::Undecided, VertexKind::Apex, gen3,
        );
        let a3 = g.add_vertex_with_generator(
            mid(gen1, gen2), VertexStatus::Undecided, VertexKind::Apex, gen1,
        );

        let s1 = Site::point(gen1);
        let s2 = Site::point(gen2);
        let s3 = Site::point(gen3);

        // face 1: v00-a1-v01-v02-a2, encloses gen3
        let e1_1 = g.add_edge(v00, a1);
        let e1_2 = g.add_edge(a1, v01);
        let e2 = g.add_edge(v01, v02);
        let e3_1 = g.add_edge(v02, a2);
        let e3_2 = g.add_edge(a2, v00);
        let f1 = g.add_face();
        g.face_mut(f1).site = Some(s3);
        g.set_next_cycle(&[e1_1, e1_2, e2, e3_1, e3_2], f1, 1);

        // face 2: v00-a2-v02-v03-a3, encloses gen1
        let e4_1 = g.add_edge(v00, a2);
        let e4_2 = g.add_edge(a2, v02);
        let e5 = g.add_edge(v02, v03);
        let e6_1 = g.add_edge(v03, a3);
        let e6_2 = g.add_edge(a3, v00);
        let f2 = g.add_face();
        g.face_mut(f2).site = Some(s1);
        g.set_next_cycle(&[e4_1, e4_2, e5, e6_1, e6_2], f2, 1);

        // face 3: v00-a3-v03-v01-a1, encloses gen2
        let e7_1 = g.add_edge(v00, a3);
        let e7_2 = g.add_edge(a3, v03);
        let e8 = g.add_edge(v03, v01);
        let e9_1 = g.add_edge(v01, a1);
        let e9_2 = g.add_edge(a1, v00);
        let f3 = g.add_face();
        g.face_mut(f3).site = Some(s2);
        g.set_next_cycle(&[e7_1, e7_2, e8, e9_1, e9_2], f3, 1);

        g.set_edge_parameters(e1_1, &s3, &s2, false);
        g.set_edge_parameters(e1_2, &s3, &s2, true);
        g.edge_mut(e2).kind = EdgeKind::Outedge;
        g.set_edge_parameters(e3_1, &s1, &s3, true);
        g.set_edge_parameters(e3_2, &s1, &s3, false);
        g.set_edge_parameters(e4_1, &s1, &s3, false);
        g.set_edge_parameters(e4_2, &s1, &s3, true);
        g.edge_mut(e5).kind = EdgeKind::Outedge;
        g.set_edge_parameters(e6_1, &s1, &s2, false);
        g.set_edge_parameters(e6_2, &s1, &s2, true);
        g.set_edge_parameters(e7_1, &s1, &s2, true);
        g.set_edge_parameters(e7_2, &s1, &s2, false);
        g.edge_mut(e8).kind = EdgeKind::Outedge;
        g.set_edge_parameters(e9_1, &s3, &s2, true);
        g.set_edge_parameters(e9_2, &s3, &s2, false);

        // the three outermost edges keep no twin
        g.twin_edges(e1_1, e9_2);
        g.twin_edges(e1_2, e9_1);
        g.twin_edges(e3_1, e4_2);
        g.twin_edges(e3_2, e4_1);
        g.twin_edges(e6_1, e7_2);
        g.twin_edges(e6_2, e7_1);

        self.grid.add_face(gen3, f1);
        self.grid.add_face(gen1, f2);
        self.grid.add_face(gen2, f3);

        debug_assert!(check::is_valid(&self.g, self.far_radius));
    }

    // ===== Public queries ==================================================

    /// Number of point sites, the three frame generators included.
    pub fn num_point_sites(&self) -> usize {
        self.num_psites
    }

    /// Number of inserted line-segment sites.
    pub fn num_line_sites(&self) -> usize {
        self.num_lsites
    }

    /// Read access to the half-edge graph for downstream consumers.
    pub fn graph(&self) -> &HalfEdgeGraph {
        &self.g
    }

    pub fn far_radius(&self) -> f64 {
        self.far_radius
    }

    /// Run the topology checker over the whole graph. Pure and idempotent.
    pub fn check(&self) -> bool {
        check::is_valid(&self.g, self.far_radius)
    }

    /// Total number of split vertices in the graph. Zero between public
    /// operations.
    pub fn num_split_vertices(&self) -> usize {
        self.g
            .vertices()
            .filter(|&v| self.g.vertex(v).kind == VertexKind::Split)
            .count()
    }

    /// Short textual summary.
    pub fn print(&self) -> String {
        format!(
            "VoronoiDiagram\n num_vertices    = {}\n num_half_edges  = {}\n \
             num_faces       = {}\n num_point_sites = {}\n num_line_sites  = {}\n",
            self.g.num_vertices(),
            self.g.num_half_edges(),
            self.g.num_faces(),
            self.num_psites,
            self.num_lsites,
        )
    }

    // ===== Point-site insertion ============================================

    /// Insert a point site, returning its stable index for later use as a
    /// segment endpoint.
    pub fn insert_point_site(&mut self, p: Point) -> Result<u32, Error> {
        self.insert_point_site_stepped(p, None)
            .map(|idx| idx.expect("full insertion returns an index"))
    }

    /// Insert a point site, optionally stopping after phase `step` (1..=6:
    /// seed, augment, materialise, stitch, demolish, reset). On an early
    /// stop the graph is mid-surgery and `Ok(None)` is returned.
    pub fn insert_point_site_stepped(
        &mut self,
        p: Point,
        step: Option<u32>,
    ) -> Result<Option<u32>, Error> {
        if !(p.norm() < self.far_radius) {
            return Err(Error::OutsideFarRadius { x: p.x, y: p.y });
        }
        self.num_psites += 1;
        let mut ctx = InsertionCtx::new();

        let new_vert = self.g.add_vertex(p, VertexStatus::Out, VertexKind::Pointsite);
        let index = self.g.vertex(new_vert).index;
        self.registry.insert(index, new_vert);
        let new_site = Site::point(p);
        debug!("insert_point_site({:?}) -> index {}", p, index);

        // phase 1: seed
        let seed_face = self.grid.find_closest_face(p);
        let v_seed = self.find_seed_vertex(seed_face, &new_site);
        self.mark_vertex(&mut ctx, v_seed, &new_site);
        if step == Some(1) {
            return Ok(None);
        }

        // phase 2: augment
        self.augment_vertex_set(&mut ctx, &new_site);
        if step == Some(2) {
            return Ok(None);
        }

        // phase 3: materialise
        self.add_boundary_vertices(&mut ctx, &new_site);
        if step == Some(3) {
            return Ok(None);
        }

        // phase 4: stitch
        let newface = self.add_face_with_site(new_site);
        self.g.vertex_mut(new_vert).face = Opt::some(newface);
        for f in ctx.incident_faces.clone() {
            self.add_edges(&mut ctx, newface, f, None);
        }
        if step == Some(4) {
            return Ok(None);
        }

        // phase 5: demolish
        self.repair_face(&ctx, newface);
        self.remove_vertex_set(&mut ctx);
        if step == Some(5) {
            return Ok(None);
        }

        // phase 6: reset
        self.reset_status(&mut ctx);
        self.validate_post_state(&[newface])?;
        if step == Some(6) {
            return Ok(None);
        }
        Ok(Some(index))
    }

    /// Post-insertion validation: the touched face rings must close on
    /// themselves, and (in debug builds) the whole graph must pass the
    /// checker. A rejection is fatal for the diagram.
    fn validate_post_state(&self, faces: &[FaceHandle]) -> Result<(), Error> {
        for &f in faces {
            if !check::face_ok(&self.g, f) {
                return Err(Error::InvariantViolation {
                    detail: format!("ring of {:?} is inconsistent", f),
                });
            }
        }
        if cfg!(debug_assertions) && !check::is_valid(&self.g, self.far_radius) {
            return Err(Error::InvariantViolation {
                detail: "graph-wide invariants do not hold".to_string(),
            });
        }
        Ok(())
    }

    // ===== Seed search =====================================================

    /// On the candidate face, the normal vertex whose clearance disk the
    /// new site violates most. Panics when no vertex qualifies; with sites
    /// inside the far radius the frame guarantees a seed exists.
    fn find_seed_vertex(&self, f: FaceHandle, site: &Site) -> VertexHandle {
        let mut min_pred = 0.0;
        let mut minimal: Option<VertexHandle> = None;
        for e in self.g.face_edges(f) {
            let q = self.g.target(e);
            let vert = self.g.vertex(q);
            if vert.status != VertexStatus::Out && vert.kind == VertexKind::Normal {
                let h = vert.in_circle(site.apex_point(vert.position));
                if minimal.is_none() || (h < min_pred && site.in_region(vert.position)) {
                    min_pred = h;
                    minimal = Some(q);
                }
            }
        }
        let v = minimal.expect("seed search: no normal vertex on candidate face");
        assert!(min_pred < 0.0, "seed search: no clearance violation on candidate face");
        trace!("seed vertex {:?} (h = {:e})", v, min_pred);
        v
    }

    // ===== Delete-tree growth ==============================================

    /// Mark `v` as part of the delete-tree, flag its faces incident and
    /// queue its undecided neighbours.
    fn mark_vertex(&mut self, ctx: &mut InsertionCtx, v: VertexHandle, site: &Site) {
        self.g.vertex_mut(v).status = VertexStatus::In;
        ctx.v0.push(v);
        ctx.modified.insert(v);

        if site.is_point() {
            self.mark_adjacent_faces_point(ctx, v);
        } else {
            self.mark_adjacent_faces_line(ctx, v, site);
        }

        for e in self.g.out_edges(v) {
            let w = self.g.target(e);
            let wv = self.g.vertex(w);
            if wv.status == VertexStatus::Undecided && !wv.in_queue {
                let h = wv.in_circle(site.apex_point(wv.position));
                ctx.queue.push(QueueEntry::new(w, h));
                self.g.vertex_mut(w).in_queue = true;
                trace!("queued {:?} (h = {:e})", w, h);
            }
        }
    }

    fn mark_adjacent_faces_point(&mut self, ctx: &mut InsertionCtx, v: VertexHandle) {
        for e in self.g.out_edges(v) {
            if let Some(f) = self.g.edge(e).face.into_option() {
                if self.g.face(f).status != FaceStatus::Incident {
                    self.g.face_mut(f).status = FaceStatus::Incident;
                    ctx.incident_faces.push(f);
                }
            }
        }
    }

    /// Line-site variant: newly incident point-site faces the segment runs
    /// through get split vertices before being flagged, so the delete-tree
    /// cannot close a loop around them.
    fn mark_adjacent_faces_line(&mut self, ctx: &mut InsertionCtx, v: VertexHandle, site: &Site) {
        let faces = self.g.adjacent_faces(v);
        debug_assert!({
            let kind = self.g.vertex(v).kind;
            match kind {
                VertexKind::Apex | VertexKind::Split => faces.len() == 2,
                _ => faces.len() == 3,
            }
        });
        for f in faces {
            if self.g.face(f).status != FaceStatus::Incident {
                self.add_split_vertex(f, site);
                self.g.face_mut(f).status = FaceStatus::Incident;
                ctx.incident_faces.push(f);
            }
        }
    }

    /// Weighted breadth-first growth of the delete-tree. A popped vertex
    /// joins the tree iff its clearance is violated, doing so closes no
    /// cycle (C4), keeps the tree connected on every incident face (C5),
    /// and the vertex projects onto the new site.
    fn augment_vertex_set(&mut self, ctx: &mut InsertionCtx, site: &Site) {
        while let Some(entry) = ctx.queue.pop() {
            let v = entry.v;
            if self.g.vertex(v).status != VertexStatus::Undecided {
                continue; // stale entry
            }
            if entry.h < 0.0 {
                let c4 = self.predicate_c4(v);
                let c5 = self.predicate_c5(v);
                let in_region = site.in_region(self.g.vertex(v).position);
                if c4 || !c5 || !in_region {
                    self.g.vertex_mut(v).status = VertexStatus::Out;
                    trace!(
                        "{:?} marked OUT (topology: c4={} c5={} in_region={})",
                        v, c4, c5, in_region
                    );
                } else {
                    self.mark_vertex(ctx, v, site);
                    trace!("{:?} marked IN (h = {:e})", v, entry.h);
                }
            } else {
                self.g.vertex_mut(v).status = VertexStatus::Out;
                trace!("{:?} marked OUT (h = {:e})", v, entry.h);
            }
            ctx.modified.insert(v);
        }
    }

    /// C4, the adjacency count: would marking `v` give it two or more
    /// delete-tree neighbours (and so close a cycle)?
    fn predicate_c4(&self, v: VertexHandle) -> bool {
        let mut in_count = 0;
        for e in self.g.out_edges(v) {
            if self.g.vertex(self.g.target(e)).status == VertexStatus::In {
                in_count += 1;
                if in_count >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// C5, connectedness: on every incident face around `v`, the vertex
    /// must neighbour the tree (or sit next to an endpoint/apex/split
    /// vertex, which cannot disconnect it).
    fn predicate_c5(&self, v: VertexHandle) -> bool {
        let kind = self.g.vertex(v).kind;
        if kind == VertexKind::Apex || kind == VertexKind::Split {
            return true;
        }
        let mut all_found = true;
        for e in self.g.out_edges(v) {
            let f = match self.g.edge(e).face.into_option() {
                Some(f) => f,
                None => continue,
            };
            if self.g.face(f).status != FaceStatus::Incident {
                continue;
            }
            let mut face_ok = false;
            for w in self.g.face_vertices(f) {
                if w == v {
                    continue;
                }
                let wv = self.g.vertex(w);
                if wv.status == VertexStatus::In && self.g.has_edge(w, v) {
                    face_ok = true;
                } else if wv.kind == VertexKind::Endpoint
                    || wv.kind == VertexKind::Apex
                    || wv.kind == VertexKind::Split
                {
                    face_ok = true;
                }
            }
            if !face_ok {
                all_found = false;
            }
        }
        all_found
    }

    // ===== Materialise =====================================================

    /// The delete-tree boundary: every half-edge from an `In` vertex to an
    /// `Out` vertex.
    fn find_in_out_edges(&self, ctx: &InsertionCtx) -> Vec<HalfEdgeHandle> {
        debug_assert!(!ctx.v0.is_empty());
        let mut out = Vec::new();
        for &v in &ctx.v0 {
            debug_assert_eq!(self.g.vertex(v).status, VertexStatus::In);
            for e in self.g.out_edges(v) {
                if self.g.vertex(self.g.target(e)).status == VertexStatus::Out {
                    out.push(e);
                }
            }
        }
        debug_assert!(!out.is_empty());
        out
    }

    /// Generate a new vertex on every tree-boundary edge via the
    /// positioning solver.
    fn add_boundary_vertices(&mut self, ctx: &mut InsertionCtx, new_site: &Site) {
        for e in self.find_in_out_edges(ctx) {
            let sol = solver::position(&self.g, e, new_site);
            let err = solver::dist_error(&self.g, e, &sol, new_site);
            if err > 1e-9 {
                warn!(
                    "positioning on {:?} ({:?} - {:?}) has residual {:e}",
                    e,
                    self.g.source(e),
                    self.g.target(e),
                    err
                );
            }
            let q = self.g.add_vertex_with_generator(
                sol.p,
                VertexStatus::New,
                VertexKind::Normal,
                new_site.apex_point(sol.p),
            );
            self.g.vertex_mut(q).k3 = sol.k3;
            ctx.modified.insert(q);
            self.g.add_vertex_in_edge(q, e);
            trace!("new vertex {:?} at {:?} (t = {:e})", q, sol.p, sol.t);
        }
    }

    // ===== Stitch ==========================================================

    fn add_face_with_site(&mut self, site: Site) -> FaceHandle {
        let f = self.g.add_face();
        self.g.face_mut(f).site = Some(site);
        if site.is_point() {
            self.grid.add_face(site.position(), f);
        }
        f
    }

    /// Number of NEW vertices (separator endpoints excluded) on the ring
    /// of `f`.
    fn num_new_vertices(&self, f: FaceHandle) -> usize {
        self.g
            .face_vertices(f)
            .into_iter()
            .filter(|&v| {
                let vert = self.g.vertex(v);
                vert.status == VertexStatus::New && vert.kind != VertexKind::Seppoint
            })
            .count()
    }

    /// Split the incident face `f` off against the new cell: one NEW-NEW
    /// edge per pair of NEW vertices on its ring. For a segment insertion
    /// `newface2` is the negative offset-side face.
    fn add_edges(
        &mut self,
        ctx: &mut InsertionCtx,
        newface: FaceHandle,
        f: FaceHandle,
        newface2: Option<FaceHandle>,
    ) {
        let new_count = self.num_new_vertices(f);
        debug!("add_edges on {:?} with {} NEW vertices", f, new_count);
        debug_assert!(new_count > 0 && new_count % 2 == 0);
        // NEW vertices are assumed to be visited in ring order here; exact
        // co-circularity can break that assumption (tolerance-sensitive)
        let mut startverts: Vec<VertexHandle> = Vec::new();
        for _ in 0..new_count / 2 {
            let ed = self.find_edge_data(ctx, f, &startverts);
            self.add_edge(ctx, ed, newface, newface2);
            startverts.push(ed.v1);
        }
    }

    /// Locate the `OUT-NEW(v1)-IN … IN-NEW(v2)-OUT` boundary pattern on the
    /// ring of `f`.
    fn find_edge_data(
        &self,
        ctx: &InsertionCtx,
        f: FaceHandle,
        startverts: &[VertexHandle],
    ) -> EdgeData {
        let start_edge = self.g.face(f).edge.into_option().expect("face without edge");

        // v1: a NEW vertex entered from outside the tree (or preceded by a
        // fresh segment endpoint)
        let mut current_edge = start_edge;
        let mut v1 = None;
        loop {
            let next_edge = self.g.next(current_edge);
            let previous_vertex = self.g.source(current_edge);
            let current_vertex = self.g.target(current_edge);
            let next_vertex = self.g.target(next_edge);

            let cv = self.g.vertex(current_vertex);
            let pv = self.g.vertex(previous_vertex);
            let nv = self.g.vertex(next_vertex);
            let prev_outside = (pv.status == VertexStatus::Out
                || pv.status == VertexStatus::Undecided)
                && Some(previous_vertex) != ctx.segment_start
                && Some(previous_vertex) != ctx.segment_end;
            let next_is_segment_end = nv.kind == VertexKind::Endpoint
                && (Some(next_vertex) == ctx.segment_start
                    || Some(next_vertex) == ctx.segment_end);

            if cv.status == VertexStatus::New
                && cv.kind != VertexKind::Seppoint
                && (prev_outside || next_is_segment_end)
                && !startverts.contains(&current_vertex)
            {
                v1 = Some((current_vertex, current_edge, next_edge));
            }
            current_edge = next_edge;
            if v1.is_some() || current_edge == start_edge {
                break;
            }
        }
        let (v1, v1_prv, v1_nxt) =
            v1.unwrap_or_else(|| panic!("no OUT-NEW-IN vertex on ring of {:?}", f));

        // v2: the next NEW vertex (other than v1) continuing around the ring
        let v2_start = current_edge;
        let mut v2 = None;
        loop {
            let current_vertex = self.g.target(current_edge);
            let cv = self.g.vertex(current_vertex);
            if cv.status == VertexStatus::New
                && cv.kind != VertexKind::Seppoint
                && current_vertex != v1
            {
                v2 = Some((current_vertex, current_edge, self.g.next(current_edge)));
            }
            current_edge = self.g.next(current_edge);
            if v2.is_some() || current_edge == v2_start {
                break;
            }
        }
        let (v2, v2_prv, v2_nxt) =
            v2.unwrap_or_else(|| panic!("no IN-NEW-OUT vertex on ring of {:?}", f));

        trace!("find_edge_data on {:?}: {:?} - {:?}", f, v1, v2);
        EdgeData { f, v1, v1_prv, v1_nxt, v2, v2_prv, v2_nxt }
    }

    /// Add the NEW-NEW edge pair described by `ed`, splitting `ed.f`
    /// against the proper new face. Interposes an apex vertex when the two
    /// NEW endpoints lie on opposite sides of the generator chord, so a
    /// later parabolic bend stays piecewise monotone.
    fn add_edge(
        &mut self,
        ctx: &mut InsertionCtx,
        ed: EdgeData,
        newface: FaceHandle,
        newface2: Option<FaceHandle>,
    ) {
        let f = ed.f;
        let f_site = self.g.face(f).site.expect("stitched face has no site");
        let new_source = ed.v1;
        let new_target = ed.v2;

        let src_k3 = self.g.vertex(new_source).k3;
        debug_assert_eq!(self.g.vertex(new_target).k3, src_k3);
        let new_face = if src_k3 == 1 {
            newface
        } else {
            newface2.expect("negative offset-side without a second face")
        };
        let new_site = self.g.face(new_face).site.expect("new face has no site");

        // apex test: are the two NEW vertices on the same side of the
        // chord/axis between the sites?
        let src_pos = self.g.vertex(new_source).position;
        let trg_pos = self.g.vertex(new_target).position;
        let (src_sign, trg_sign) = match (f_site.is_point(), new_site.is_point()) {
            (true, true) => {
                let (p1, p2) = (f_site.position(), new_site.position());
                (src_pos.is_right(p1, p2), trg_pos.is_right(p1, p2))
            }
            (true, false) => {
                let p1 = f_site.position();
                let p2 = new_site.apex_point(p1);
                (src_pos.is_right(p1, p2), trg_pos.is_right(p1, p2))
            }
            // a point site stitched against a line-site face: the bisector
            // is the same parabola as the point/line case, so the bend test
            // uses the same axis (the point and its foot on the line)
            (false, true) => {
                let p1 = new_site.position();
                let p2 = f_site.apex_point(p1);
                (src_pos.is_right(p1, p2), trg_pos.is_right(p1, p2))
            }
            // line/line bisectors are straight; no apex needed
            (false, false) => (true, true),
        };

        if src_sign == trg_sign {
            let (e_new, e_twin) = self.g.add_twin_edges(new_source, new_target);
            self.g.set_next(e_new, ed.v2_nxt);
            debug_assert_eq!(self.g.edge(ed.v2_nxt).k, self.g.edge(ed.v1_prv).k);
            let k = self.g.edge(ed.v2_nxt).k;
            self.g.edge_mut(e_new).k = k;
            self.g.edge_mut(e_new).face = Opt::some(f);
            self.g.set_next(ed.v1_prv, e_new);
            self.g.face_mut(f).edge = Opt::some(e_new);
            self.g.set_edge_parameters(e_new, &f_site, &new_site, !src_sign);

            self.g.set_next(ed.v2_prv, e_twin);
            self.g.set_next(e_twin, ed.v1_nxt);
            self.g.edge_mut(e_twin).k = src_k3;
            self.g.set_edge_parameters(e_twin, &new_site, &f_site, src_sign);
            self.g.edge_mut(e_twin).face = Opt::some(new_face);
            self.g.face_mut(new_face).edge = Opt::some(e_twin);

            debug_assert!(check::check_edge(&self.g, e_new));
            debug_assert!(check::check_edge(&self.g, e_twin));
        } else {
            // apex split:
            //   v1_prv -> NEW --e1--> APEX --e2--> NEW -> v2_nxt      (on f)
            //   v1_nxt <- NEW <-e1t-- APEX <-e2t-- NEW <- v2_prv  (new face)
            let apex = self.g.add_vertex(pt(0.0, 0.0), VertexStatus::New, VertexKind::Apex);
            let (e1, e1_tw) = self.g.add_twin_edges(new_source, apex);
            let (e2, e2_tw) = self.g.add_twin_edges(apex, new_target);
            self.g.set_edge_parameters(e1, &f_site, &new_site, !src_sign);
            self.g.set_edge_parameters(e2, &f_site, &new_site, !trg_sign);

            debug_assert_eq!(self.g.edge(ed.v1_prv).face.into_option(), Some(f));
            debug_assert_eq!(self.g.edge(ed.v2_nxt).face.into_option(), Some(f));
            let k = self.g.edge(ed.v2_nxt).k;
            self.g.set_next_chain_face(&[ed.v1_prv, e1, e2, ed.v2_nxt], f, k);

            self.g.set_edge_parameters(e1_tw, &new_site, &f_site, src_sign);
            self.g.set_edge_parameters(e2_tw, &new_site, &f_site, trg_sign);
            self.g.set_next_chain(&[ed.v2_prv, e2_tw, e1_tw, ed.v1_nxt]);
            self.g.edge_mut(e1_tw).k = src_k3;
            self.g.edge_mut(e2_tw).k = src_k3;
            self.g.face_mut(new_face).edge = Opt::some(e1_tw);
            self.g.edge_mut(e1_tw).face = Opt::some(new_face);
            self.g.edge_mut(e2_tw).face = Opt::some(new_face);

            // position the apex at the bend of the bisector
            let min_t = self.g.edge(e1).curve.minimum_t(&f_site, &new_site);
            let apex_pos = self.g.edge(e1).curve.point(min_t);
            {
                let vert = self.g.vertex_mut(apex);
                vert.position = apex_pos;
            }
            let generator = f_site.apex_point(apex_pos);
            self.g.vertex_mut(apex).init_dist(generator);
            ctx.modified.insert(apex);

            debug_assert!(check::check_edge(&self.g, e1));
            debug_assert!(check::check_edge(&self.g, e2));
        }
    }

    // ===== Repair, demolish, reset =========================================

    /// Re-thread the `next` pointers around `f` after stitching. From each
    /// ring edge's target, the successor is the out-edge on the same face
    /// whose target is NEW or an endpoint/separator vertex; null-edges are
    /// only eligible (and get their face force-reassigned) under the
    /// endpoint patterns, as do edges of a swallowed zero-point face.
    fn repair_face(&mut self, ctx: &InsertionCtx, f: FaceHandle) {
        debug!("repair_face({:?})", f);
        let start_edge = self.g.face(f).edge.into_option().expect("face without edge");
        let mut current_edge = start_edge;
        let limit = self.g.num_half_edges() as usize + 1;
        let mut steps = 0;
        loop {
            debug_assert!(check::check_edge(&self.g, current_edge));
            let current_target = self.g.target(current_edge);
            let current_source = self.g.source(current_edge);
            let mut found_next = false;

            for e in self.g.out_edges(current_target) {
                let out_target = self.g.target(e);
                if out_target == current_source {
                    continue;
                }
                let tv = self.g.vertex(out_target);
                if !(tv.status == VertexStatus::New
                    || tv.kind == VertexKind::Endpoint
                    || tv.kind == VertexKind::Seppoint)
                {
                    continue;
                }

                let e_face = self.g.edge(e).face.into_option();
                let null_edge_pattern = self.g.edge(e).kind == EdgeKind::Nulledge
                    && self.g.edge(current_edge).kind != EdgeKind::Nulledge
                    && (
                        // separator -> endpoint
                        (self.g.vertex(current_target).kind == VertexKind::Seppoint
                            && tv.kind == VertexKind::Endpoint)
                        // endpoint -> endpoint -> separator
                        || (self.g.vertex(current_source).kind == VertexKind::Endpoint
                            && self.g.vertex(current_target).kind == VertexKind::Endpoint)
                        || Some(out_target) == ctx.segment_start
                        || Some(out_target) == ctx.segment_end
                    )
                    && e_face != ctx.null_face1
                    && e_face != ctx.null_face2;
                let on_zero_point_face =
                    e_face.is_some() && e_face == ctx.zero_point_face;

                if null_edge_pattern || on_zero_point_face {
                    // brute-force reassignment onto the repaired face
                    self.g.edge_mut(e).face = Opt::some(f);
                    let k = self.g.edge(current_edge).k;
                    self.g.edge_mut(e).k = k;
                }

                if self.g.edge(e).face.into_option() == Some(f) {
                    self.g.set_next(current_edge, e);
                    found_next = true;
                    debug_assert_eq!(self.g.edge(current_edge).k, self.g.edge(e).k);
                }
            }
            assert!(
                found_next,
                "repair_face({:?}): no next edge from {:?}",
                f, current_target
            );

            current_edge = self.g.next(current_edge);
            if current_edge == start_edge {
                break;
            }
            steps += 1;
            assert!(steps < limit, "repair_face({:?}): ring does not close", f);
        }
        trace!("  repaired: {}", self.g.pretty_face(f));
    }

    /// Destroy the delete-tree: every `In` vertex goes, incident half-edges
    /// with it.
    fn remove_vertex_set(&mut self, ctx: &mut InsertionCtx) {
        for v in ctx.v0.clone() {
            debug_assert_eq!(self.g.vertex(v).status, VertexStatus::In);
            self.g.delete_vertex(v);
            ctx.modified.remove(&v);
        }
    }

    /// Reset all transient marks so the next insertion starts clean.
    fn reset_status(&mut self, ctx: &mut InsertionCtx) {
        for v in ctx.modified.drain() {
            if self.g.contains_vertex(v) {
                self.g.vertex_mut(v).reset();
            }
        }
        for f in ctx.incident_faces.drain(..) {
            self.g.face_mut(f).status = FaceStatus::Nonincident;
        }
        ctx.v0.clear();
    }
}
