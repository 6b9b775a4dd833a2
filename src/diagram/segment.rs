//! Line-segment insertion.
//!
//! A segment between two previously inserted point sites follows the point
//! insertion skeleton, with four additions around the endpoints:
//!
//! * a zero-area *null face* pinned at each endpoint absorbs the original
//!   point-site cell there and keeps the embedding planar when several
//!   segments share an endpoint;
//! * *separator* edges partition each endpoint's remaining point-site cell
//!   between the two offset-sides of the segment;
//! * *split vertices* break would-be cycles on point-site cells the segment
//!   runs through transversely;
//! * the segment itself becomes a twinned pair of line-site edges carrying
//!   one new face per offset-side.

use log::{debug, trace};
use optional::Optioned as Opt;

use crate::check;
use crate::geo::{
    self, diangle_bracket, diangle_mid, Point, PointExt, Vec2, VecExt,
};
use crate::graph::{EdgeKind, FaceStatus, VertexKind, VertexStatus};
use crate::handle::{FaceHandle, HalfEdgeHandle, VertexHandle};
use crate::site::Site;
use crate::solver;

use super::{Error, InsertionCtx, VoronoiDiagram};


/// Reseat the swallowed zero-point face's entry edge onto the start
/// null-edge after seeding. At splice time the entry edge must stay
/// untouched (reseating there interferes with the seed search); doing it
/// after the seed keeps the face walkable for repair.
const RESEAT_ZERO_POINT_FACE_EDGE: bool = true;

/// Where a separator must attach on the endpoint's point-site face: the
/// boundary triple around the matching NEW vertex.
#[derive(Clone, Copy)]
struct SepTarget {
    v_previous: HalfEdgeHandle,
    v_target: VertexHandle,
    v_next: HalfEdgeHandle,
    /// True when found as OUT-NEW-IN, false when found as IN-NEW-OUT.
    out_new_in: bool,
}

impl VoronoiDiagram {
    /// Insert the line segment between the point sites `idx1` and `idx2`
    /// (indices previously returned by
    /// [`insert_point_site`][VoronoiDiagram::insert_point_site]).
    pub fn insert_line_site(&mut self, idx1: u32, idx2: u32) -> Result<(), Error> {
        self.insert_line_site_stepped(idx1, idx2, None).map(|_| ())
    }

    /// Step-mode variant: stops after phase `step` (1..=11) and returns
    /// `Ok(false)`, leaving the graph mid-surgery. `Ok(true)` means the
    /// insertion ran to completion.
    pub fn insert_line_site_stepped(
        &mut self,
        idx1: u32,
        idx2: u32,
        step: Option<u32>,
    ) -> Result<bool, Error> {
        let (start, end) = self.find_endpoints(idx1, idx2)?;
        if start == end {
            return Err(Error::DegenerateSegment { idx1, idx2 });
        }
        self.num_lsites += 1;
        let mut ctx = InsertionCtx::new();
        debug!(
            "insert_line_site({} - {})",
            self.g.vertex(start).index,
            self.g.vertex(end).index
        );

        let src_se = self.g.vertex(start).position;
        let trg_se = self.g.vertex(end).position;
        // a probe point left of start -> end decides which offset-side the
        // positive line site covers
        let left = Point::new(
            0.5 * (src_se.x + trg_se.x),
            0.5 * (src_se.y + trg_se.y),
        ) + (trg_se - src_se).xy_perp();
        let linesite_k_sign = left.is_right(src_se, trg_se);

        self.g.vertex_mut(start).status = VertexStatus::Out;
        self.g.vertex_mut(end).status = VertexStatus::Out;
        self.g.vertex_mut(start).zero_dist();
        self.g.vertex_mut(end).zero_dist();

        // phase 1: endpoint preparation
        let (seg_start, start_null_face, pos_sep_start, neg_sep_start) =
            self.find_null_face(&mut ctx, start, end, left);
        let (seg_end, end_null_face, pos_sep_end, neg_sep_end) =
            self.find_null_face(&mut ctx, end, start, left);

        ctx.null_face1 = Some(start_null_face);
        ctx.null_face2 = Some(end_null_face);
        ctx.segment_start = Some(seg_start);
        ctx.segment_end = Some(seg_end);

        let start_null_edge = self.g.face(start_null_face).edge.into_option().unwrap();
        let end_null_edge = self.g.face(end_null_face).edge.into_option().unwrap();
        if step == Some(1) {
            return Ok(false);
        }

        // phase 2: the line-site edge pair and its two faces
        let (pos_face, neg_face) =
            self.add_linesite_edges(seg_start, seg_end, linesite_k_sign);
        let start_face = self.find_pointsite_face(start_null_edge);
        let end_face = self.find_pointsite_face(end_null_edge);
        if step == Some(2) {
            return Ok(false);
        }

        // phase 3: seed on the start endpoint's point-site face
        let pos_site = self.g.face(pos_face).site.expect("line face has no site");
        let v_seed = self.find_seed_vertex(start_face, &pos_site);
        trace!("segment seed vertex {:?}", v_seed);
        self.mark_vertex(&mut ctx, v_seed, &pos_site);

        // with the seed marked it is safe to reseat the zero-point face
        if RESEAT_ZERO_POINT_FACE_EDGE {
            if let Some(zf) = ctx.zero_point_face {
                self.g.face_mut(zf).edge = Opt::some(start_null_edge);
            }
        }
        if step == Some(3) {
            return Ok(false);
        }

        // phase 4: augment (either offset-side gives the same tree)
        self.augment_vertex_set(&mut ctx, &pos_site);
        if step == Some(4) {
            return Ok(false);
        }

        // phase 5: materialise
        self.add_boundary_vertices(&mut ctx, &pos_site);
        if step == Some(5) {
            return Ok(false);
        }

        // phase 6 & 7: separators at the start endpoint. Both targets are
        // located before the first separator rewires the face.
        let pos_start_target = self.find_separator_target(start_face, pos_sep_start);
        let neg_start_target = self.find_separator_target(start_face, neg_sep_start);
        self.add_separator(
            start_face, start_null_face, pos_start_target, pos_sep_start, pos_face, neg_face,
        );
        if step == Some(6) {
            return Ok(false);
        }
        self.add_separator(
            start_face, start_null_face, neg_start_target, neg_sep_start, pos_face, neg_face,
        );
        self.g.face_mut(start_face).status = FaceStatus::Nonincident;
        debug_assert!(check::face_ok(&self.g, start_face));
        if step == Some(7) {
            return Ok(false);
        }

        // phase 8 & 9: separators at the end endpoint
        let pos_end_target = self.find_separator_target(end_face, pos_sep_end);
        let neg_end_target = self.find_separator_target(end_face, neg_sep_end);
        self.add_separator(
            end_face, end_null_face, pos_end_target, pos_sep_end, pos_face, neg_face,
        );
        if step == Some(8) {
            return Ok(false);
        }
        self.add_separator(
            end_face, end_null_face, neg_end_target, neg_sep_end, pos_face, neg_face,
        );
        self.g.face_mut(end_face).status = FaceStatus::Nonincident;
        debug_assert!(check::face_ok(&self.g, end_face));
        if step == Some(9) {
            return Ok(false);
        }

        // phase 10: stitch the remaining incident faces; each may split
        // into positive side, negative side and the old face
        for f in ctx.incident_faces.clone() {
            if self.g.face(f).status == FaceStatus::Incident {
                self.add_edges(&mut ctx, pos_face, f, Some(neg_face));
            }
        }
        if step == Some(10) {
            return Ok(false);
        }

        // phase 11: demolish and re-thread the two new rings
        self.remove_vertex_set(&mut ctx);
        self.repair_face(&ctx, pos_face);
        debug_assert!(check::face_ok(&self.g, pos_face));
        self.repair_face(&ctx, neg_face);
        debug_assert!(check::face_ok(&self.g, neg_face));
        if step == Some(11) {
            return Ok(false);
        }

        // cleanup: drop leftover split vertices, then reset
        for f in ctx.incident_faces.clone() {
            self.remove_split_vertex(&mut ctx, f);
        }
        self.reset_status(&mut ctx);

        self.validate_post_state(&[
            start_face,
            start_null_face,
            end_face,
            end_null_face,
            pos_face,
            neg_face,
        ])?;
        Ok(true)
    }

    /// Resolve two site indices to their marker vertices.
    fn find_endpoints(
        &self,
        idx1: u32,
        idx2: u32,
    ) -> Result<(VertexHandle, VertexHandle), Error> {
        let start = *self
            .registry
            .get(&idx1)
            .ok_or(Error::UnknownSiteIndex { idx: idx1 })?;
        let end = *self
            .registry
            .get(&idx2)
            .ok_or(Error::UnknownSiteIndex { idx: idx2 })?;
        Ok((start, end))
    }

    /// Create the twinned line-site edge pair between the two new endpoint
    /// vertices and one face per offset-side. Returns `(positive, negative)`.
    fn add_linesite_edges(
        &mut self,
        seg_start: VertexHandle,
        seg_end: VertexHandle,
        linesite_k_sign: bool,
    ) -> (FaceHandle, FaceHandle) {
        let sp = self.g.vertex(seg_start).position;
        let ep = self.g.vertex(seg_end).position;
        let (pos_site, neg_site, pos_edge, neg_edge) = if linesite_k_sign {
            let (p, n) = self.g.add_twin_edges(seg_start, seg_end);
            (Site::line(sp, ep, 1), Site::line(ep, sp, -1), p, n)
        } else {
            let (p, n) = self.g.add_twin_edges(seg_end, seg_start);
            (Site::line(ep, sp, 1), Site::line(sp, ep, -1), p, n)
        };
        self.g.edge_mut(pos_edge).kind = EdgeKind::Linesite;
        self.g.edge_mut(neg_edge).kind = EdgeKind::Linesite;
        self.g.edge_mut(pos_edge).k = 1;
        self.g.edge_mut(neg_edge).k = -1;
        debug_assert!(check::check_edge(&self.g, pos_edge));
        debug_assert!(check::check_edge(&self.g, neg_edge));

        let pos_face = self.add_face_with_site(pos_site);
        let neg_face = self.add_face_with_site(neg_site);
        self.g.face_mut(pos_face).edge = Opt::some(pos_edge);
        self.g.face_mut(neg_face).edge = Opt::some(neg_edge);
        self.g.edge_mut(pos_edge).face = Opt::some(pos_face);
        self.g.edge_mut(neg_edge).face = Opt::some(neg_face);
        (pos_face, neg_face)
    }

    /// Walk a null face's ring and return the point-site face seen across
    /// its edges; that is where the endpoint's separators attach.
    fn find_pointsite_face(&self, start_edge: HalfEdgeHandle) -> FaceHandle {
        let first_twin = self.g.twin(start_edge).expect("null edge without twin");
        let mut result = self
            .g
            .edge(first_twin)
            .face
            .into_option()
            .expect("null edge twin without face");
        let mut current = start_edge;
        loop {
            let twin = self.g.twin(current).expect("null edge without twin");
            if let Some(twin_f) = self.g.edge(twin).face.into_option() {
                if let Some(site) = self.g.face(twin_f).site {
                    if site.is_point() {
                        result = twin_f;
                    }
                }
            }
            current = self.g.next(current);
            if current == start_edge {
                break;
            }
        }
        result
    }

    // ===== Null faces ======================================================

    /// Prepare the null face at `start` for a segment running toward
    /// `other`: either build a fresh three-vertex null face, or splice a
    /// new endpoint vertex into the existing one following the angular
    /// bracket rules. Returns the new segment-end vertex, the null face and
    /// the separator endpoints to wire up later (absent when an existing
    /// separator was reused or a neighbour blocked the bracket).
    fn find_null_face(
        &mut self,
        ctx: &mut InsertionCtx,
        start: VertexHandle,
        other: VertexHandle,
        left: Point,
    ) -> (VertexHandle, FaceHandle, Option<VertexHandle>, Option<VertexHandle>) {
        let start_pos = self.g.vertex(start).position;
        let other_pos = self.g.vertex(other).position;
        let dir = other_pos - start_pos;
        let alfa = geo::diangle_of(dir);
        let k3_sign = left.is_right(start_pos, other_pos);

        if let Some(null_face) = self.g.vertex(start).null_face.into_option() {
            debug!(
                "find_null_face: endpoint {} reuses {:?}",
                self.g.vertex(start).index,
                null_face
            );
            let seg_start =
                self.g.add_vertex(start_pos, VertexStatus::Out, VertexKind::Endpoint);
            self.g.vertex_mut(seg_start).zero_dist();
            self.g.vertex_mut(seg_start).set_alfa(dir);

            // the ring edge whose angular bracket admits the new endpoint
            let mut insert_edge = None;
            for e in self.g.face_edges(null_face) {
                let src_alfa = self.g.vertex(self.g.source(e)).alfa;
                let trg_alfa = self.g.vertex(self.g.target(e)).alfa;
                if diangle_bracket(src_alfa, alfa, trg_alfa) {
                    insert_edge = Some(e);
                    break;
                }
            }
            let insert_edge = insert_edge.expect("no angular bracket admits the new endpoint");
            self.g.add_vertex_in_edge(seg_start, insert_edge);

            let (next_edge, prev_edge) = self.find_next_prev(null_face, seg_start);
            debug_assert_eq!(self.g.next(prev_edge), next_edge);
            trace!("  null face after splice: {}", self.g.pretty_face(null_face));
            let neg_sep = self.process_next_null(ctx, dir, next_edge, k3_sign);
            let pos_sep = self.process_prev_null(ctx, dir, prev_edge, k3_sign);
            (seg_start, null_face, pos_sep, neg_sep)
        } else {
            // fresh null face: neg_sep -> seg_endpoint -> pos_sep
            let null_face = self.g.add_face();
            debug!(
                "find_null_face: endpoint {} gets new {:?}",
                self.g.vertex(start).index,
                null_face
            );
            let seg_start =
                self.g.add_vertex(start_pos, VertexStatus::Out, VertexKind::Endpoint);
            {
                let v = self.g.vertex_mut(seg_start);
                v.zero_dist();
                v.k3 = 0;
            }
            self.g.vertex_mut(seg_start).set_alfa(dir);
            let pos_sep =
                self.g.add_vertex(start_pos, VertexStatus::Out, VertexKind::Seppoint);
            let neg_sep =
                self.g.add_vertex(start_pos, VertexStatus::Out, VertexKind::Seppoint);
            self.g.vertex_mut(pos_sep).zero_dist();
            self.g.vertex_mut(neg_sep).zero_dist();
            if k3_sign {
                self.g.vertex_mut(pos_sep).k3 = 1;
                self.g.vertex_mut(neg_sep).k3 = -1;
            } else {
                self.g.vertex_mut(pos_sep).k3 = -1;
                self.g.vertex_mut(neg_sep).k3 = 1;
            }
            self.g.vertex_mut(pos_sep).set_alfa(dir.xy_perp());
            self.g.vertex_mut(neg_sep).set_alfa(-dir.xy_perp());

            let (e1, e1_tw) = self.g.add_twin_edges(seg_start, pos_sep);
            let (e2, e2_tw) = self.g.add_twin_edges(pos_sep, neg_sep);
            let (e3, e3_tw) = self.g.add_twin_edges(neg_sep, seg_start);

            // e1 -> e2 -> e3 bounds the null face; the twins form an inner
            // ring of the surrounding point-site face, whose entry edge
            // must stay on its outer ring
            self.g.set_next_cycle(&[e1, e2, e3], null_face, 1);
            let start_face = self.g.vertex(start).face.into_option()
                .expect("endpoint's point site has no face");
            let start_face_edge = self.g.face(start_face).edge;
            self.g.set_next_cycle(&[e3_tw, e2_tw, e1_tw], start_face, 1);
            self.g.face_mut(null_face).edge = Opt::some(e1);
            self.g.face_mut(start_face).edge = start_face_edge;

            for &e in &[e1, e2, e3, e1_tw, e2_tw, e3_tw] {
                self.g.edge_mut(e).kind = EdgeKind::Nulledge;
            }
            self.g.vertex_mut(start).null_face = Opt::some(null_face);
            (seg_start, null_face, Some(pos_sep), Some(neg_sep))
        }
    }

    /// On a (null) face ring, the edges leaving and entering `endp`.
    fn find_next_prev(
        &self,
        null_face: FaceHandle,
        endp: VertexHandle,
    ) -> (HalfEdgeHandle, HalfEdgeHandle) {
        let mut next_edge = None;
        let mut prev_edge = None;
        for e in self.g.face_edges(null_face) {
            if self.g.source(e) == endp {
                next_edge = Some(e);
            }
            if self.g.target(e) == endp {
                prev_edge = Some(e);
            }
        }
        (
            next_edge.expect("vertex not on null-face ring"),
            prev_edge.expect("vertex not on null-face ring"),
        )
    }

    /// Handle the null-face neighbour counter-clockwise of a freshly
    /// spliced endpoint. Returns the separator endpoint for this side, if
    /// one is to be wired.
    fn process_next_null(
        &mut self,
        ctx: &mut InsertionCtx,
        dir: Vec2,
        next_edge: HalfEdgeHandle,
        k3_sign: bool,
    ) -> Option<VertexHandle> {
        let trg = self.g.target(next_edge);
        let src = self.g.source(next_edge);
        debug_assert_eq!(self.g.vertex(src).kind, VertexKind::Endpoint);
        let neg_sep_dir = dir.xy_perp();
        let neg_sep_alfa = geo::diangle_of(neg_sep_dir);
        let src_alfa = self.g.vertex(src).alfa;
        let trg_alfa = self.g.vertex(trg).alfa;

        if self.g.vertex(trg).kind == VertexKind::Endpoint {
            // two endpoints with no room for a separator between them: a
            // plain vertex at mid-angle keeps the ring walkable
            assert!(
                !diangle_bracket(src_alfa, neg_sep_alfa, trg_alfa),
                "bracket between adjacent endpoints admits a separator"
            );
            let src_pos = self.g.vertex(src).position;
            let new_v = self.g.add_vertex_with_generator(
                src_pos, VertexStatus::New, VertexKind::Normal, src_pos,
            );
            self.g.vertex_mut(new_v).alfa = diangle_mid(src_alfa, trg_alfa);
            ctx.modified.insert(new_v);
            self.g.add_vertex_in_edge(new_v, next_edge);
            self.g.vertex_mut(new_v).k3 = if k3_sign { 1 } else { -1 };
            trace!("next-null: plain vertex {:?} between endpoints", new_v);
            None
        } else if neg_sep_alfa == trg_alfa && self.g.vertex(trg).kind == VertexKind::Seppoint {
            // exactly coinciding separator: merge with it
            self.merge_coincident_separator(ctx, trg);
            None
        } else {
            let next_face = self
                .g
                .edge(self.g.twin(next_edge).expect("null edge without twin"))
                .face
                .into_option()
                .expect("null edge twin without face");
            let across_is_point = self
                .g
                .face(next_face)
                .site
                .map(|s| s.is_point())
                .unwrap_or(false);
            if diangle_bracket(src_alfa, neg_sep_alfa, trg_alfa) && across_is_point {
                let sep = self.add_sep_point(src, next_edge, neg_sep_dir);
                self.g.vertex_mut(sep).k3 = if k3_sign { 1 } else { -1 };
                Some(sep)
            } else {
                // no room: push the blocking neighbour to the mid-angle of
                // the widened bracket
                let next_next = self.g.next(next_edge);
                let next_trg = self.g.target(next_next);
                let mid = diangle_mid(src_alfa, self.g.vertex(next_trg).alfa);
                let result;
                if diangle_bracket(neg_sep_alfa, mid, self.g.vertex(next_trg).alfa) {
                    // pushed past the separator angle: it becomes the
                    // separator endpoint itself
                    let v = self.g.vertex_mut(trg);
                    v.alfa = neg_sep_alfa;
                    v.kind = VertexKind::Seppoint;
                    v.status = VertexStatus::New;
                    result = Some(trg);
                    trace!("next-null: pushed {:?} into a separator", trg);
                } else {
                    let v = self.g.vertex_mut(trg);
                    v.alfa = mid;
                    v.kind = VertexKind::Normal;
                    v.status = VertexStatus::New;
                    result = None;
                    trace!("next-null: pushed {:?} to mid-angle", trg);
                }
                self.g.vertex_mut(trg).k3 = if k3_sign { 1 } else { -1 };
                ctx.modified.insert(trg);
                result
            }
        }
    }

    /// Mirror of [`process_next_null`] for the clockwise neighbour.
    fn process_prev_null(
        &mut self,
        ctx: &mut InsertionCtx,
        dir: Vec2,
        prev_edge: HalfEdgeHandle,
        k3_sign: bool,
    ) -> Option<VertexHandle> {
        let trg = self.g.target(prev_edge);
        let src = self.g.source(prev_edge);
        debug_assert_eq!(self.g.vertex(trg).kind, VertexKind::Endpoint);
        let pos_sep_dir = -dir.xy_perp();
        let pos_sep_alfa = geo::diangle_of(pos_sep_dir);
        let src_alfa = self.g.vertex(src).alfa;
        let trg_alfa = self.g.vertex(trg).alfa;

        if self.g.vertex(src).kind == VertexKind::Endpoint {
            assert!(
                !diangle_bracket(src_alfa, pos_sep_alfa, trg_alfa),
                "bracket between adjacent endpoints admits a separator"
            );
            let src_pos = self.g.vertex(src).position;
            let new_v = self.g.add_vertex_with_generator(
                src_pos, VertexStatus::New, VertexKind::Normal, src_pos,
            );
            self.g.vertex_mut(new_v).alfa = diangle_mid(src_alfa, trg_alfa);
            ctx.modified.insert(new_v);
            self.g.add_vertex_in_edge(new_v, prev_edge);
            self.g.vertex_mut(new_v).k3 = if k3_sign { -1 } else { 1 };
            trace!("prev-null: plain vertex {:?} between endpoints", new_v);
            None
        } else if pos_sep_alfa == src_alfa && self.g.vertex(src).kind == VertexKind::Seppoint {
            self.merge_coincident_separator(ctx, src);
            None
        } else if diangle_bracket(src_alfa, pos_sep_alfa, trg_alfa) {
            let sep = self.add_sep_point(src, prev_edge, pos_sep_dir);
            self.g.vertex_mut(sep).k3 = if k3_sign { -1 } else { 1 };
            Some(sep)
        } else {
            let prev_prev = self.g.previous_edge(prev_edge);
            let prev_src = self.g.source(prev_prev);
            let mid = diangle_mid(self.g.vertex(prev_src).alfa, trg_alfa);
            let result;
            if diangle_bracket(mid, pos_sep_alfa, trg_alfa) {
                let v = self.g.vertex_mut(src);
                v.alfa = pos_sep_alfa;
                v.kind = VertexKind::Seppoint;
                v.status = VertexStatus::New;
                result = Some(src);
                trace!("prev-null: pushed {:?} into a separator", src);
            } else {
                let v = self.g.vertex_mut(src);
                v.alfa = mid;
                v.kind = VertexKind::Normal;
                v.status = VertexStatus::New;
                result = None;
                trace!("prev-null: pushed {:?} to mid-angle", src);
            }
            self.g.vertex_mut(src).k3 = if k3_sign { -1 } else { 1 };
            ctx.modified.insert(src);
            result
        }
    }

    /// A new separator lands exactly on an existing separator point: reuse
    /// it. The point-site face behind the existing separator is about to be
    /// swallowed entirely; remember it as the zero-point face and mark the
    /// separator's far end NEW so stitching picks it up.
    fn merge_coincident_separator(&mut self, ctx: &mut InsertionCtx, sep_vertex: VertexHandle) {
        let mut sep_edge = None;
        for e in self.g.out_edges(sep_vertex) {
            debug_assert_eq!(self.g.source(e), sep_vertex);
            if self.g.edge(e).kind == EdgeKind::Separator {
                sep_edge = Some(e);
            }
        }
        let sep_edge = sep_edge.expect("separator point without separator edge");
        let sep_twin = self.g.twin(sep_edge).expect("separator without twin");

        let mut pointsite_edge = None;
        for &e in &[sep_edge, sep_twin] {
            if let Some(f) = self.g.edge(e).face.into_option() {
                if self.g.face(f).site.map(|s| s.is_point()).unwrap_or(false) {
                    pointsite_edge = Some(e);
                }
            }
        }
        let pointsite_edge = pointsite_edge.expect("separator without a point-site side");
        ctx.zero_point_face = self.g.edge(pointsite_edge).face.into_option();
        debug!(
            "coincident separator at {:?}; zero-point face {:?}",
            sep_vertex, ctx.zero_point_face
        );

        let sep_target = self.g.target(sep_edge);
        self.g.vertex_mut(sep_target).status = VertexStatus::New;
        ctx.modified.insert(sep_target);
    }

    /// Insert a separator endpoint into a null-face ring edge.
    fn add_sep_point(
        &mut self,
        endp: VertexHandle,
        edge: HalfEdgeHandle,
        sep_dir: Vec2,
    ) -> VertexHandle {
        let pos = self.g.vertex(endp).position;
        let sep = self.g.add_vertex(pos, VertexStatus::Out, VertexKind::Seppoint);
        self.g.vertex_mut(sep).zero_dist();
        self.g.vertex_mut(sep).set_alfa(sep_dir);
        self.g.add_vertex_in_edge(sep, edge);
        trace!("separator point {:?} spliced into {:?}", sep, edge);
        sep
    }

    // ===== Separators ======================================================

    /// On the endpoint's point-site face, the NEW vertex a separator from
    /// `endp` must connect to: the OUT-NEW-IN (or IN-NEW-OUT) ring triple
    /// whose middle vertex carries the separator's side label.
    fn find_separator_target(
        &self,
        f: FaceHandle,
        endp: Option<VertexHandle>,
    ) -> Option<SepTarget> {
        let endp = endp?;
        let endp_k3 = self.g.vertex(endp).k3;
        let start_edge = self.g.face(f).edge.into_option().expect("face without edge");
        let mut current_edge = start_edge;
        loop {
            let next_edge = self.g.next(current_edge);
            let previous_vertex = self.g.source(current_edge);
            let current_vertex = self.g.target(current_edge);
            let next_vertex = self.g.target(next_edge);

            let ps = self.g.vertex(previous_vertex).status;
            let cs = self.g.vertex(current_vertex).status;
            let ns = self.g.vertex(next_vertex).status;
            let out_new_in =
                ps == VertexStatus::Out && cs == VertexStatus::New && ns == VertexStatus::In;
            let in_new_out =
                ps == VertexStatus::In && cs == VertexStatus::New && ns == VertexStatus::Out;
            if (out_new_in || in_new_out)
                && self.g.vertex(current_vertex).k3 == endp_k3
                && current_vertex != endp
            {
                return Some(SepTarget {
                    v_previous: current_edge,
                    v_target: current_vertex,
                    v_next: next_edge,
                    out_new_in,
                });
            }
            current_edge = next_edge;
            if current_edge == start_edge {
                panic!("no separator target for {:?} on {:?}", endp, f);
            }
        }
    }

    /// Wire a separator edge pair from `sep_endp` (on the null face) to its
    /// target vertex on the point-site face `f`, splitting the endpoint
    /// region between `f` and the matching line-site face.
    fn add_separator(
        &mut self,
        f: FaceHandle,
        null_face: FaceHandle,
        target: Option<SepTarget>,
        sep_endp: Option<VertexHandle>,
        pos_face: FaceHandle,
        neg_face: FaceHandle,
    ) {
        let sep_endp = match sep_endp {
            Some(v) => v,
            None => return,
        };
        let target = target.expect("separator endpoint without target");
        debug!("add_separator on {:?} from {:?}", f, sep_endp);
        debug_assert!(self.g.vertex(sep_endp).k3 == 1 || self.g.vertex(sep_endp).k3 == -1);

        let (endp_next_tw, endp_prev_tw) = self.find_next_prev(null_face, sep_endp);
        let endp_prev = self.g.twin(endp_next_tw).expect("null edge without twin");
        let endp_next = self.g.twin(endp_prev_tw).expect("null edge without twin");

        let v_target = target.v_target;
        debug_assert_eq!(self.g.vertex(sep_endp).k3, self.g.vertex(v_target).k3);
        debug_assert!({
            let p = self.g.vertex(v_target).position;
            let pos_site = self.g.face(pos_face).site.unwrap();
            let neg_site = self.g.face(neg_face).site.unwrap();
            pos_site.in_region(p) && neg_site.in_region(p)
        });

        let (e2, e2_tw) = self.g.add_twin_edges(sep_endp, v_target);

        // two wiring patterns, depending on how the target was found:
        //   OUT-NEW-IN:  e2 bounds the line-site face, its twin bounds f
        //   IN-NEW-OUT:  the other way around
        if target.out_new_in {
            let k3 = self.g.vertex(v_target).k3;
            self.g.edge_mut(e2).k = k3;
            self.g.edge_mut(e2_tw).k = 1;
            self.g.edge_mut(e2_tw).face = Opt::some(f);
            self.g.face_mut(f).edge = Opt::some(e2_tw);
            self.g.edge_mut(endp_prev).k = k3;

            let line_face = if k3 == -1 { neg_face } else { pos_face };
            self.g.edge_mut(e2).face = Opt::some(line_face);
            self.g.face_mut(line_face).edge = Opt::some(e2);
            self.g.edge_mut(endp_prev).face = Opt::some(line_face);

            self.g.set_next(target.v_previous, e2_tw);
            self.g.set_next(e2_tw, endp_next);
            self.g.edge_mut(endp_next).face = Opt::some(f);
            self.g.edge_mut(endp_next).k = 1;
            // endp_prev's next is threaded by the repair pass
            self.g.set_next(e2, target.v_next);
        } else {
            let k3 = self.g.vertex(v_target).k3;
            self.g.edge_mut(e2).k = 1;
            self.g.edge_mut(e2_tw).k = k3;
            self.g.edge_mut(e2).face = Opt::some(f);
            self.g.face_mut(f).edge = Opt::some(e2);
            self.g.edge_mut(endp_next).k = k3;

            let line_face = if k3 == -1 { neg_face } else { pos_face };
            self.g.edge_mut(e2_tw).face = Opt::some(line_face);
            self.g.face_mut(line_face).edge = Opt::some(e2_tw);
            self.g.edge_mut(endp_next).face = Opt::some(line_face);

            self.g.set_next(target.v_previous, e2_tw);
            self.g.edge_mut(endp_prev).face = Opt::some(f);
            self.g.edge_mut(endp_prev).k = 1;
            self.g.set_next(endp_prev, e2);
            self.g.set_next(e2, target.v_next);
        }

        let endp_pos = self.g.vertex(sep_endp).position;
        let target_pos = self.g.vertex(v_target).position;
        self.g.set_separator_parameters(e2, endp_pos, target_pos);
        self.g.set_separator_parameters(e2_tw, endp_pos, target_pos);

        debug_assert!(check::check_edge(&self.g, e2));
        debug_assert!(check::check_edge(&self.g, e2_tw));
    }

    // ===== Split vertices ==================================================

    /// Insert split vertices on a point-site face the new segment passes
    /// through, so the delete-tree cannot wrap around the cell. The split
    /// point sits where the face's boundary crosses the line through the
    /// point site along the segment normal.
    pub(super) fn add_split_vertex(&mut self, f: FaceHandle, s: &Site) {
        if s.is_point() {
            return;
        }
        let fs = match self.g.face(f).site {
            Some(site) => site,
            None => return,
        };
        if !fs.is_point() {
            return;
        }
        if fs.position() == s.start() || fs.position() == s.end() {
            return;
        }
        if !s.in_region(fs.position()) {
            return;
        }

        let pt1 = fs.position();
        let pt2 = pt1 - Vec2::new(s.a(), s.b());
        debug_assert!((pt1 - pt2).norm() > 0.0);

        for split_edge in self.find_split_edges(f, pt1, pt2) {
            let kind = self.g.edge(split_edge).kind;
            if kind == EdgeKind::Separator || kind == EdgeKind::Linesite {
                return;
            }

            let src = self.g.source(split_edge);
            let trg = self.g.target(split_edge);
            let t_src = self.g.vertex(src).dist();
            let t_trg = self.g.vertex(trg).dist();
            let (min_t, max_t) = if t_src <= t_trg { (t_src, t_trg) } else { (t_trg, t_src) };

            // the split point is the root of the signed distance from the
            // edge curve to the normal line
            let curve = self.g.edge(split_edge).curve;
            let axis = pt2 - pt1;
            let axis_norm = axis.norm();
            let err = |t: f64| axis.cross(curve.point(t) - pt1) / axis_norm;
            let root = match solver::bracket_root(min_t, max_t, err) {
                Some(r) => r,
                None => continue, // endpoints do not bracket; skip this split
            };
            let split_pos = curve.point(root);
            let v = self.g.add_vertex_with_generator(
                split_pos,
                VertexStatus::Undecided,
                VertexKind::Split,
                fs.position(),
            );
            debug_assert!(check::check_edge(&self.g, split_edge));
            self.g.add_vertex_in_edge(v, split_edge);
            debug!("split vertex {:?} on {:?} of {:?}", v, split_edge, f);
        }
    }

    /// Ring edges of `f` whose endpoints lie on opposite sides of the line
    /// `pt1 -> pt2`.
    fn find_split_edges(
        &self,
        f: FaceHandle,
        pt1: Point,
        pt2: Point,
    ) -> Vec<HalfEdgeHandle> {
        let mut out = Vec::new();
        for e in self.g.face_edges(f) {
            let src = self.g.source(e);
            let trg = self.g.target(e);
            match self.g.vertex(src).kind {
                VertexKind::Normal | VertexKind::Apex | VertexKind::Split => {}
                _ => continue,
            }
            let src_right = self.g.vertex(src).position.is_right(pt1, pt2);
            let trg_right = self.g.vertex(trg).position.is_right(pt1, pt2);
            if src_right != trg_right {
                out.push(e);
            }
        }
        out
    }

    fn find_split_vertex(&self, f: FaceHandle) -> Option<VertexHandle> {
        self.g
            .face_vertices(f)
            .into_iter()
            .find(|&v| self.g.vertex(v).kind == VertexKind::Split)
    }

    /// Remove every leftover (degree-2) split vertex from the ring of `f`.
    pub(super) fn remove_split_vertex(&mut self, ctx: &mut InsertionCtx, f: FaceHandle) {
        debug_assert!(check::face_ok(&self.g, f));
        while let Some(v) = self.find_split_vertex(f) {
            trace!("removing split vertex {:?}", v);
            self.g.remove_deg2_vertex(v);
            ctx.modified.remove(&v);
            debug_assert!(check::face_ok(&self.g, f));
        }
    }
}
