//! The half-edge graph: planar embedding of the diagram.
//!
//! Vertices, directed half-edges and faces live in handle-indexed arenas.
//! Every undirected edge is a pair of oppositely directed half-edges linked
//! through `twin` (the three outermost frame edges have no twin). Every face
//! ring is closed through `next`.
//!
//! This module only provides *structural* edits; the insertion engine in
//! [`crate::diagram`] is responsible for calling them in an order that keeps
//! the diagram meaningful.

use optional::Optioned as Opt;
use smallvec::SmallVec;

use crate::bisector::Curve;
use crate::geo::{Point, PointExt};
use crate::handle::{hsize, FaceHandle, HalfEdgeHandle, VertexHandle};
use crate::map::VecMap;
use crate::site::Site;


// ===========================================================================
// ===== Element records
// ===========================================================================

/// What role a vertex plays in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Degree-3 Voronoi vertex.
    Normal,
    /// Bend point of a (potentially) parabolic edge, closest point to the
    /// focus. Degree 2.
    Apex,
    /// Transient loop-breaker on a cell a segment passes through. Degree 2,
    /// removed before the inserting call returns.
    Split,
    /// Segment endpoint vertex on a null face.
    Endpoint,
    /// Separator endpoint on a null face.
    Seppoint,
    /// Vertex of the initial far-field frame.
    Outer,
    /// Isolated marker vertex recording an inserted point site.
    Pointsite,
}

/// Breadth-first expansion state of a vertex. Outside an insertion, every
/// vertex is `Undecided` except the permanently-`Out` frame and site
/// markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStatus {
    Undecided,
    /// In the delete-tree of the running insertion.
    In,
    Out,
    /// Created by the running insertion.
    New,
}

/// What a half-edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Straight bisector (point/point or line/line).
    Line,
    /// Parabolic bisector (point/line).
    Parabola,
    /// Twin-less outermost frame edge.
    Outedge,
    /// The segment itself, separating its two offset-side faces.
    Linesite,
    /// Partition of an endpoint region between the two sides of a segment.
    Separator,
    /// Zero-length edge on a null face.
    Nulledge,
}

/// Insertion-scoped face flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceStatus {
    Incident,
    Nonincident,
}

/// Data stored per vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Point,
    pub kind: VertexKind,
    pub status: VertexStatus,
    /// Stable monotone index, also used as the site index for `Pointsite`
    /// vertices.
    pub index: u32,
    /// Diangle of the outgoing direction from the endpoint, for null-face
    /// vertices.
    pub alfa: f64,
    /// Offset-side label relative to an incoming segment: -1, 0 or +1.
    pub k3: i8,
    /// Transient flag for the breadth-first expansion.
    pub in_queue: bool,
    /// Clearance-disk radius: distance to the nearest site at creation time.
    r: f64,
    /// For `Pointsite` vertices: the face of their cell.
    pub face: Opt<FaceHandle>,
    /// For `Pointsite` vertices that became segment endpoints: the null face
    /// pinned there.
    pub null_face: Opt<FaceHandle>,
    out_edges: SmallVec<[HalfEdgeHandle; 8]>,
}

impl Vertex {
    /// Signed clearance violation of this vertex against a new site's apex
    /// point: negative iff the apex intrudes into the clearance disk.
    pub fn in_circle(&self, apex: Point) -> f64 {
        self.position.dist(apex) - self.r
    }

    /// Set the clearance radius from the generator point `g`.
    pub fn init_dist(&mut self, g: Point) {
        self.r = self.position.dist(g);
    }

    pub fn zero_dist(&mut self) {
        self.r = 0.0;
    }

    /// Clearance-disk radius (the curve parameter `t` at this vertex).
    pub fn dist(&self) -> f64 {
        self.r
    }

    pub fn set_alfa(&mut self, dir: crate::geo::Vec2) {
        self.alfa = crate::geo::diangle_of(dir);
    }

    /// Back to the quiescent state between insertions.
    pub fn reset(&mut self) {
        self.status = VertexStatus::Undecided;
        self.in_queue = false;
    }

    pub fn degree(&self) -> usize {
        self.out_edges.len()
    }
}

/// Data stored per half-edge.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub source: VertexHandle,
    pub target: VertexHandle,
    pub twin: Opt<HalfEdgeHandle>,
    pub next: Opt<HalfEdgeHandle>,
    pub face: Opt<FaceHandle>,
    pub kind: EdgeKind,
    /// Offset-side label of the bounded face when it belongs to a line
    /// site: +1 or -1.
    pub k: i8,
    pub curve: Curve,
}

/// Data stored per face.
#[derive(Debug, Clone)]
pub struct Face {
    /// Entry point into the face ring: following `next` from here returns
    /// here.
    pub edge: Opt<HalfEdgeHandle>,
    /// The site owning this cell. `None` for null faces.
    pub site: Option<Site>,
    pub status: FaceStatus,
}


// ===========================================================================
// ===== The graph
// ===========================================================================

pub struct HalfEdgeGraph {
    vertices: VecMap<VertexHandle, Vertex>,
    half_edges: VecMap<HalfEdgeHandle, HalfEdge>,
    faces: VecMap<FaceHandle, Face>,
    vertex_index_count: u32,
}

impl HalfEdgeGraph {
    pub fn new() -> Self {
        Self {
            vertices: VecMap::new(),
            half_edges: VecMap::new(),
            faces: VecMap::new(),
            vertex_index_count: 0,
        }
    }

    // ===== Element access ==================================================

    pub fn vertex(&self, v: VertexHandle) -> &Vertex {
        &self.vertices[v]
    }

    pub fn vertex_mut(&mut self, v: VertexHandle) -> &mut Vertex {
        &mut self.vertices[v]
    }

    pub fn edge(&self, e: HalfEdgeHandle) -> &HalfEdge {
        &self.half_edges[e]
    }

    pub fn edge_mut(&mut self, e: HalfEdgeHandle) -> &mut HalfEdge {
        &mut self.half_edges[e]
    }

    pub fn face(&self, f: FaceHandle) -> &Face {
        &self.faces[f]
    }

    pub fn face_mut(&mut self, f: FaceHandle) -> &mut Face {
        &mut self.faces[f]
    }

    pub fn contains_vertex(&self, v: VertexHandle) -> bool {
        self.vertices.contains(v)
    }

    pub fn num_vertices(&self) -> hsize {
        self.vertices.num_elements()
    }

    pub fn num_half_edges(&self) -> hsize {
        self.half_edges.num_elements()
    }

    pub fn num_faces(&self) -> hsize {
        self.faces.num_elements()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        self.vertices.handles()
    }

    pub fn half_edges(&self) -> impl Iterator<Item = HalfEdgeHandle> + '_ {
        self.half_edges.handles()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceHandle> + '_ {
        self.faces.handles()
    }

    pub fn source(&self, e: HalfEdgeHandle) -> VertexHandle {
        self.half_edges[e].source
    }

    pub fn target(&self, e: HalfEdgeHandle) -> VertexHandle {
        self.half_edges[e].target
    }

    pub fn twin(&self, e: HalfEdgeHandle) -> Option<HalfEdgeHandle> {
        self.half_edges[e].twin.into_option()
    }

    pub fn next(&self, e: HalfEdgeHandle) -> HalfEdgeHandle {
        self.half_edges[e].next.into_option()
            .unwrap_or_else(|| panic!("{:?} has no next pointer", e))
    }

    // ===== Vertex creation =================================================

    /// Add an isolated vertex. The stable index is assigned here and never
    /// reused.
    pub fn add_vertex(
        &mut self,
        position: Point,
        status: VertexStatus,
        kind: VertexKind,
    ) -> VertexHandle {
        let index = self.vertex_index_count;
        self.vertex_index_count += 1;
        self.vertices.push(Vertex {
            position,
            kind,
            status,
            index,
            alfa: ::std::f64::NAN,
            k3: 0,
            in_queue: false,
            r: ::std::f64::MAX,
            face: Opt::none(),
            null_face: Opt::none(),
            out_edges: SmallVec::new(),
        })
    }

    /// Add a vertex whose clearance radius is its distance to `generator`.
    pub fn add_vertex_with_generator(
        &mut self,
        position: Point,
        status: VertexStatus,
        kind: VertexKind,
        generator: Point,
    ) -> VertexHandle {
        let v = self.add_vertex(position, status, kind);
        self.vertices[v].init_dist(generator);
        v
    }

    // ===== Edge and face creation ==========================================

    /// Add a single directed half-edge `u -> w` with no twin, face or next.
    pub fn add_edge(&mut self, u: VertexHandle, w: VertexHandle) -> HalfEdgeHandle {
        let e = self.half_edges.push(HalfEdge {
            source: u,
            target: w,
            twin: Opt::none(),
            next: Opt::none(),
            face: Opt::none(),
            kind: EdgeKind::Line,
            k: 1,
            curve: Curve::unset(),
        });
        self.vertices[u].out_edges.push(e);
        e
    }

    /// Add the half-edge pair `u -> w`, `w -> u` with twin pointers linked.
    pub fn add_twin_edges(
        &mut self,
        u: VertexHandle,
        w: VertexHandle,
    ) -> (HalfEdgeHandle, HalfEdgeHandle) {
        let e = self.add_edge(u, w);
        let e_tw = self.add_edge(w, u);
        self.twin_edges(e, e_tw);
        (e, e_tw)
    }

    /// Link two existing half-edges as twins.
    pub fn twin_edges(&mut self, e1: HalfEdgeHandle, e2: HalfEdgeHandle) {
        debug_assert_eq!(self.source(e1), self.target(e2));
        debug_assert_eq!(self.target(e1), self.source(e2));
        self.half_edges[e1].twin = Opt::some(e2);
        self.half_edges[e2].twin = Opt::some(e1);
    }

    pub fn add_face(&mut self) -> FaceHandle {
        self.faces.push(Face {
            edge: Opt::none(),
            site: None,
            status: FaceStatus::Nonincident,
        })
    }

    // ===== Ring wiring =====================================================

    pub fn set_next(&mut self, e1: HalfEdgeHandle, e2: HalfEdgeHandle) {
        debug_assert_eq!(self.target(e1), self.source(e2));
        self.half_edges[e1].next = Opt::some(e2);
    }

    /// Chain `list` into a closed ring bounding `f`: sets `next` pointers
    /// around the cycle, `face` and `k` for every edge, and `f.edge`.
    pub fn set_next_cycle(&mut self, list: &[HalfEdgeHandle], f: FaceHandle, k: i8) {
        assert!(!list.is_empty());
        for i in 0..list.len() {
            let e = list[i];
            self.set_next(e, list[(i + 1) % list.len()]);
            self.half_edges[e].face = Opt::some(f);
            self.half_edges[e].k = k;
        }
        self.faces[f].edge = Opt::some(list[0]);
    }

    /// Chain `list` with `next` pointers, first to last (no wrap-around).
    pub fn set_next_chain(&mut self, list: &[HalfEdgeHandle]) {
        for w in 0..list.len().saturating_sub(1) {
            self.set_next(list[w], list[w + 1]);
        }
    }

    /// Chain `list` and put every edge on face `f` with label `k`.
    pub fn set_next_chain_face(&mut self, list: &[HalfEdgeHandle], f: FaceHandle, k: i8) {
        self.set_next_chain(list);
        for &e in list {
            self.half_edges[e].face = Opt::some(f);
            self.half_edges[e].k = k;
        }
        self.faces[f].edge = Opt::some(list[0]);
    }

    /// Attach the bisector of `(s1, s2)` to `e`. `s1` is the site of the
    /// face the edge bounds; the edge kind follows the curve family.
    pub fn set_edge_parameters(&mut self, e: HalfEdgeHandle, s1: &Site, s2: &Site, sign: bool) {
        let (curve, family) = Curve::from_sites(s1, s2, sign);
        let edge = &mut self.half_edges[e];
        edge.curve = curve;
        edge.kind = match family {
            crate::bisector::CurveFamily::Line => EdgeKind::Line,
            crate::bisector::CurveFamily::Parabola => EdgeKind::Parabola,
        };
    }

    /// Attach separator-ray parameters to `e`.
    pub fn set_separator_parameters(&mut self, e: HalfEdgeHandle, endpoint: Point, target: Point) {
        let edge = &mut self.half_edges[e];
        edge.curve = Curve::separator(endpoint, target);
        edge.kind = EdgeKind::Separator;
    }

    // ===== Structural surgery ==============================================

    /// Split the edge `e` (and its twin) at the vertex `v`:
    ///
    /// ```text
    ///                 face                           face
    ///  prev -> src --- e ---> trg -> ...   prev -> src -e1-> v -e2-> trg
    ///   ... <- src <- twin -- trg <- tp      ... <- src <-te2- v <-te1- trg
    ///                twin_face                     twin_face
    /// ```
    ///
    /// The four replacement half-edges inherit face, type, `k` and bisector
    /// parameters from the half they replace.
    pub fn add_vertex_in_edge(&mut self, v: VertexHandle, e: HalfEdgeHandle) {
        let twin = self.twin(e).expect("cannot split a twin-less edge");
        let src = self.source(e);
        let trg = self.target(e);
        debug_assert_eq!(self.source(twin), trg);
        debug_assert_eq!(self.target(twin), src);

        let face = self.half_edges[e].face;
        let twin_face = self.half_edges[twin].face;
        let e_next = self.next(e);
        let twin_next = self.next(twin);
        let previous = self.previous_edge(e);
        let twin_previous = self.previous_edge(twin);

        let e1 = self.add_edge(src, v);
        let e2 = self.add_edge(v, trg);
        let te1 = self.add_edge(trg, v);
        let te2 = self.add_edge(v, src);
        self.twin_edges(e1, te2);
        self.twin_edges(e2, te1);

        for &(new, old) in &[(e1, e), (e2, e), (te1, twin), (te2, twin)] {
            let (kind, k, curve) = {
                let o = &self.half_edges[old];
                (o.kind, o.k, o.curve)
            };
            let n = &mut self.half_edges[new];
            n.kind = kind;
            n.k = k;
            n.curve = curve;
        }
        self.half_edges[e1].face = face;
        self.half_edges[e2].face = face;
        self.half_edges[te1].face = twin_face;
        self.half_edges[te2].face = twin_face;

        self.set_next(previous, e1);
        self.set_next(e1, e2);
        self.set_next(e2, e_next);
        self.set_next(twin_previous, te1);
        self.set_next(te1, te2);
        self.set_next(te2, twin_next);

        // the faces may have held the replaced edges as their entry points
        if let Some(f) = face.into_option() {
            self.faces[f].edge = Opt::some(e1);
        }
        if let Some(f) = twin_face.into_option() {
            self.faces[f].edge = Opt::some(te1);
        }

        self.remove_edge(e);
        self.remove_edge(twin);
    }

    /// Remove a degree-2 vertex, merging its two edge pairs back into one:
    ///
    /// ```text
    ///              face_a                            face_a
    ///  ... -> v1 -----> v -----> v2 -> ...    ... -> v1 ----> v2 -> ...
    ///  ... <- v1 <----- v <----- v2 <- ...    ... <- v1 <---- v2 <- ...
    ///              face_b                            face_b
    /// ```
    pub fn remove_deg2_vertex(&mut self, v: VertexHandle) {
        let out: SmallVec<[HalfEdgeHandle; 2]> =
            self.vertices[v].out_edges.iter().cloned().collect();
        assert_eq!(out.len(), 2, "remove_deg2_vertex: {:?} has degree {}", v, out.len());
        let e1 = out[0]; // v -> v1
        let e2 = out[1]; // v -> v2
        let v1 = self.target(e1);
        let v2 = self.target(e2);
        let e1_tw = self.twin(e1).expect("deg-2 removal requires twins");
        let e2_tw = self.twin(e2).expect("deg-2 removal requires twins");

        let face_a = self.half_edges[e2].face; // ring: v1 -> v -> v2
        let face_b = self.half_edges[e1].face; // ring: v2 -> v -> v1
        debug_assert_eq!(self.half_edges[e1_tw].face, face_a);
        debug_assert_eq!(self.half_edges[e2_tw].face, face_b);

        let prev_a = self.previous_edge(e1_tw);
        let next_a = self.next(e2);
        let prev_b = self.previous_edge(e2_tw);
        let next_b = self.next(e1);

        let (ea, eb) = self.add_twin_edges(v1, v2);
        for &(new, old) in &[(ea, e2), (eb, e1)] {
            let (kind, k, curve, face) = {
                let o = &self.half_edges[old];
                (o.kind, o.k, o.curve, o.face)
            };
            let n = &mut self.half_edges[new];
            n.kind = kind;
            n.k = k;
            n.curve = curve;
            n.face = face;
        }

        self.set_next(prev_a, ea);
        self.set_next(ea, next_a);
        self.set_next(prev_b, eb);
        self.set_next(eb, next_b);
        if let Some(f) = face_a.into_option() {
            self.faces[f].edge = Opt::some(ea);
        }
        if let Some(f) = face_b.into_option() {
            self.faces[f].edge = Opt::some(eb);
        }

        self.remove_edge(e1);
        self.remove_edge(e2);
        self.remove_edge(e1_tw);
        self.remove_edge(e2_tw);
        self.vertices.remove(v);
    }

    /// Remove `v` together with every half-edge incident to it. Ring `next`
    /// pointers into the removed edges are left dangling; the caller repairs
    /// the surrounding rings.
    pub fn delete_vertex(&mut self, v: VertexHandle) {
        debug_assert_eq!(self.vertices[v].status, VertexStatus::In);
        let out: SmallVec<[HalfEdgeHandle; 8]> =
            self.vertices[v].out_edges.iter().cloned().collect();
        for e in out {
            if let Some(tw) = self.twin(e) {
                self.remove_edge(tw);
            }
            self.remove_edge(e);
        }
        self.vertices.remove(v);
    }

    fn remove_edge(&mut self, e: HalfEdgeHandle) {
        let edge = self.half_edges.remove(e);
        if let Some(tw) = edge.twin.into_option() {
            if self.half_edges.contains(tw) {
                self.half_edges[tw].twin = Opt::none();
            }
        }
        if self.vertices.contains(edge.source) {
            let list = &mut self.vertices[edge.source].out_edges;
            if let Some(pos) = list.iter().position(|&x| x == e) {
                list.swap_remove(pos);
            }
        }
    }

    // ===== Traversal =======================================================

    /// Half-edges leaving `v`, in no particular order.
    pub fn out_edges(&self, v: VertexHandle) -> SmallVec<[HalfEdgeHandle; 8]> {
        self.vertices[v].out_edges.clone()
    }

    /// The edge on the same ring whose `next` is `e`.
    pub fn previous_edge(&self, e: HalfEdgeHandle) -> HalfEdgeHandle {
        let mut current = e;
        loop {
            let next = self.next(current);
            if next == e {
                return current;
            }
            current = next;
        }
    }

    /// Distinct faces of the half-edges leaving `v`.
    pub fn adjacent_faces(&self, v: VertexHandle) -> SmallVec<[FaceHandle; 4]> {
        let mut faces = SmallVec::new();
        for &e in self.vertices[v].out_edges.iter() {
            if let Some(f) = self.half_edges[e].face.into_option() {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    /// The half-edges of a face ring, starting at the face's entry edge.
    pub fn face_edges(&self, f: FaceHandle) -> Vec<HalfEdgeHandle> {
        let mut out = Vec::new();
        let start = self.faces[f].edge.into_option()
            .unwrap_or_else(|| panic!("{:?} has no boundary edge", f));
        let mut current = start;
        loop {
            out.push(current);
            current = self.next(current);
            if current == start {
                break;
            }
            assert!(
                out.len() <= self.half_edges.next_index() as usize,
                "face ring of {:?} does not close",
                f
            );
        }
        out
    }

    /// The vertices of a face ring (edge targets, in ring order).
    pub fn face_vertices(&self, f: FaceHandle) -> Vec<VertexHandle> {
        self.face_edges(f).into_iter().map(|e| self.target(e)).collect()
    }

    /// Is there a half-edge `u -> w`?
    pub fn has_edge(&self, u: VertexHandle, w: VertexHandle) -> bool {
        self.vertices[u].out_edges.iter().any(|&e| self.target(e) == w)
    }

    /// Compact ring rendering for trace output, e.g. `F3: 0(U)-4(I)-7(N)-`.
    pub fn pretty_face(&self, f: FaceHandle) -> String {
        use std::fmt::Write;

        let mut out = format!("{:?}:", f);
        for e in self.face_edges(f) {
            let v = &self.vertices[self.half_edges[e].source];
            let status = match v.status {
                VertexStatus::Undecided => 'U',
                VertexStatus::In => 'I',
                VertexStatus::Out => 'O',
                VertexStatus::New => 'N',
            };
            let _ = write!(out, " {}({})-", v.index, status);
        }
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::pt;

    fn triangle(g: &mut HalfEdgeGraph) -> (FaceHandle, [VertexHandle; 3], [HalfEdgeHandle; 3]) {
        let a = g.add_vertex(pt(0.0, 0.0), VertexStatus::Undecided, VertexKind::Normal);
        let b = g.add_vertex(pt(1.0, 0.0), VertexStatus::Undecided, VertexKind::Normal);
        let c = g.add_vertex(pt(0.0, 1.0), VertexStatus::Undecided, VertexKind::Normal);
        let f = g.add_face();
        let f_out = g.add_face();
        let (e1, t1) = g.add_twin_edges(a, b);
        let (e2, t2) = g.add_twin_edges(b, c);
        let (e3, t3) = g.add_twin_edges(c, a);
        g.set_next_cycle(&[e1, e2, e3], f, 1);
        g.set_next_cycle(&[t3, t2, t1], f_out, 1);
        (f, [a, b, c], [e1, e2, e3])
    }

    #[test]
    fn twin_symmetry() {
        let mut g = HalfEdgeGraph::new();
        let (_, _, [e1, ..]) = triangle(&mut g);
        let t = g.twin(e1).unwrap();
        assert_eq!(g.twin(t), Some(e1));
        assert_eq!(g.source(e1), g.target(t));
    }

    #[test]
    fn ring_closes_with_face_set() {
        let mut g = HalfEdgeGraph::new();
        let (f, _, [e1, e2, e3]) = triangle(&mut g);
        assert_eq!(g.face_edges(f), vec![e1, e2, e3]);
        for e in g.face_edges(f) {
            assert_eq!(g.edge(e).face.into_option(), Some(f));
        }
    }

    #[test]
    fn split_edge_preserves_structure() {
        let mut g = HalfEdgeGraph::new();
        let (f, [a, b, _], [e1, ..]) = triangle(&mut g);
        let m = g.add_vertex(pt(0.5, 0.0), VertexStatus::New, VertexKind::Normal);
        g.add_vertex_in_edge(m, e1);

        // ring is now a -> m -> b -> c
        let ring = g.face_vertices(f);
        assert_eq!(ring.len(), 4);
        assert!(ring.contains(&m));
        assert!(g.has_edge(a, m) && g.has_edge(m, b));
        assert!(g.has_edge(m, a) && g.has_edge(b, m));

        // all twins still reciprocal
        for e in g.half_edges().collect::<Vec<_>>() {
            if let Some(t) = g.twin(e) {
                assert_eq!(g.twin(t), Some(e));
            }
        }
    }

    #[test]
    fn split_then_merge_restores_degree() {
        let mut g = HalfEdgeGraph::new();
        let (f, _, [e1, ..]) = triangle(&mut g);
        let edges_before = g.num_half_edges();
        let m = g.add_vertex(pt(0.5, 0.0), VertexStatus::New, VertexKind::Split);
        g.add_vertex_in_edge(m, e1);
        assert_eq!(g.num_half_edges(), edges_before + 2);

        g.remove_deg2_vertex(m);
        assert_eq!(g.num_half_edges(), edges_before);
        assert_eq!(g.face_vertices(f).len(), 3);
        assert!(!g.contains_vertex(m));
    }

    #[test]
    fn delete_vertex_removes_incident_edges() {
        let mut g = HalfEdgeGraph::new();
        let (_, [a, b, c], _) = triangle(&mut g);
        g.vertex_mut(a).status = VertexStatus::In;
        let edges_before = g.num_half_edges();
        g.delete_vertex(a);
        assert_eq!(g.num_half_edges(), edges_before - 4);
        assert!(!g.contains_vertex(a));
        assert!(g.has_edge(b, c));
    }

    #[test]
    fn vertex_indices_are_monotone() {
        let mut g = HalfEdgeGraph::new();
        let a = g.add_vertex(pt(0.0, 0.0), VertexStatus::Undecided, VertexKind::Normal);
        let b = g.add_vertex(pt(1.0, 0.0), VertexStatus::Undecided, VertexKind::Normal);
        assert!(g.vertex(a).index < g.vertex(b).index);
    }

    #[test]
    fn in_circle_sign() {
        let mut g = HalfEdgeGraph::new();
        let v = g.add_vertex_with_generator(
            pt(0.0, 0.0),
            VertexStatus::Undecided,
            VertexKind::Normal,
            pt(1.0, 0.0),
        );
        // clearance radius is 1; a site at distance 0.5 violates it
        assert!(g.vertex(v).in_circle(pt(0.5, 0.0)) < 0.0);
        assert!(g.vertex(v).in_circle(pt(2.0, 0.0)) > 0.0);
    }
}
