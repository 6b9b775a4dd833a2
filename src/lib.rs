//! Incremental 2D Voronoi diagrams for point and line-segment sites.
//!
//! The diagram is maintained as a half-edge graph: every undirected edge is
//! a pair of oppositely directed half-edges with `twin`/`next`/`face`
//! links, and every cell is the face of one site. Sites are inserted one at
//! a time; after each insertion the full planar subdivision is up to date.
//!
//! # Example
//!
//! ```
//! use voron::{pt, VoronoiDiagram};
//!
//! let mut vd = VoronoiDiagram::new(1.0, 10);
//! let a = vd.insert_point_site(pt(-0.3, 0.0)).unwrap();
//! let b = vd.insert_point_site(pt(0.3, 0.0)).unwrap();
//! vd.insert_line_site(a, b).unwrap();
//!
//! assert_eq!(vd.num_point_sites(), 5); // 3 frame generators + 2 inserted
//! assert_eq!(vd.num_line_sites(), 1);
//! assert!(vd.check());
//! ```
//!
//! Downstream consumers (offset generation, medial-axis filtering, ...)
//! walk the graph directly via [`VoronoiDiagram::graph`].

pub mod bisector;
pub mod check;
pub mod geo;
pub mod graph;
pub mod grid;
pub mod handle;
pub mod map;
pub mod site;
pub mod solver;

mod diagram;

pub use crate::diagram::{Error, VoronoiDiagram};
pub use crate::geo::{pt, Point, Vec2};
pub use crate::graph::{
    EdgeKind, FaceStatus, HalfEdgeGraph, VertexKind, VertexStatus,
};
pub use crate::handle::{FaceHandle, HalfEdgeHandle, VertexHandle};
pub use crate::site::Site;
