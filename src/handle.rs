//! Handle types used to refer to vertices, half-edges and faces.
//!
//! The half-edge graph is intrinsically cyclic (`twin`/`next`/`face` all
//! point back into the graph), so elements are stored in arenas and referred
//! to by index-based handles instead of references. A handle is just a typed
//! `u32`; it stays valid across unrelated insertions and removals.

use std::fmt;

use optional::{Noned, OptEq};


/// The integer type used as index for handles.
#[allow(non_camel_case_types)]
pub type hsize = u32;

/// Types that can be used to refer to an element in the graph.
pub trait Handle: 'static + Copy + fmt::Debug + Eq + Ord {
    /// Create a handle from the given index.
    fn new(idx: hsize) -> Self;

    /// Return the index of the current handle.
    fn idx(&self) -> hsize;

    fn from_usize(raw: usize) -> Self {
        assert!(raw <= hsize::max_value() as usize);
        Self::new(raw as hsize)
    }

    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $short:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(idx: hsize) -> Self {
                $name(idx)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        // `hsize::MAX` is the niche for "no handle", so `Opt<$name>` is as
        // big as the handle itself.
        impl Noned for $name {
            #[inline(always)]
            fn is_none(&self) -> bool {
                self.0 == hsize::max_value()
            }

            #[inline(always)]
            fn get_none() -> Self {
                $name(hsize::max_value())
            }
        }

        impl OptEq for $name {
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!($short, "{}"), self.0)
            }
        }
    };
}

make_handle_type!(
    /// Handle to refer to a vertex.
    VertexHandle = "V"
);
make_handle_type!(
    /// Handle to refer to a directed half-edge.
    HalfEdgeHandle = "HE"
);
make_handle_type!(
    /// Handle to refer to a face.
    FaceHandle = "F"
);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_roundtrip() {
        let v = VertexHandle::new(27);
        assert_eq!(v.idx(), 27);
        assert_eq!(VertexHandle::from_usize(27), v);
        assert_eq!(v.to_usize(), 27);
    }

    #[test]
    fn debug_repr() {
        assert_eq!(format!("{:?}", VertexHandle::new(3)), "V3");
        assert_eq!(format!("{:?}", HalfEdgeHandle::new(12)), "HE12");
        assert_eq!(format!("{:?}", FaceHandle::new(0)), "F0");
    }

    #[test]
    fn opt_niche() {
        use optional::Optioned;

        let o: Optioned<FaceHandle> = Optioned::none();
        assert!(o.is_none());
        let s = Optioned::some(FaceHandle::new(5));
        assert_eq!(s.into_option(), Some(FaceHandle::new(5)));
    }
}
