//! Spatial index over point-site faces.
//!
//! A uniform bin grid over the far-radius square. Each point-site face is
//! registered under its generator's bin; a query walks outward ring by ring
//! from the query bin and returns the face whose generator is nearest. The
//! result only needs to be a good starting point for the seed search, not
//! the exact containing cell.

use crate::geo::{Point, PointExt};
use crate::handle::FaceHandle;


pub struct FaceGrid {
    far: f64,
    n_bins: usize,
    bin_width: f64,
    bins: Vec<Vec<(Point, FaceHandle)>>,
}

impl FaceGrid {
    pub fn new(far: f64, n_bins: usize) -> Self {
        assert!(far > 0.0);
        let n_bins = n_bins.max(1);
        Self {
            far,
            n_bins,
            bin_width: 2.0 * far / n_bins as f64,
            bins: vec![Vec::new(); n_bins * n_bins],
        }
    }

    fn bin_index(&self, c: f64) -> usize {
        let i = ((c + self.far) / self.bin_width).floor();
        (i.max(0.0) as usize).min(self.n_bins - 1)
    }

    /// Register a point-site face under its generator position.
    pub fn add_face(&mut self, generator: Point, f: FaceHandle) {
        let (i, j) = (self.bin_index(generator.x), self.bin_index(generator.y));
        self.bins[j * self.n_bins + i].push((generator, f));
    }

    /// The registered face whose generator is closest to `p`.
    ///
    /// Panics if no face was ever registered (the engine registers the three
    /// frame faces on construction).
    pub fn find_closest_face(&self, p: Point) -> FaceHandle {
        let (pi, pj) = (self.bin_index(p.x), self.bin_index(p.y));
        let mut best: Option<(f64, FaceHandle)> = None;

        for ring in 0..self.n_bins {
            for (i, j) in ring_bins(pi, pj, ring, self.n_bins) {
                for &(generator, f) in &self.bins[j * self.n_bins + i] {
                    let d = p.dist(generator);
                    if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                        best = Some((d, f));
                    }
                }
            }
            // one extra ring after the first hit, so a generator just across
            // a bin border cannot shadow a closer one
            if let Some((_, f)) = best {
                if ring >= 1 {
                    return f;
                }
            }
        }
        best.map(|(_, f)| f).expect("face grid is empty")
    }
}

/// Bin coordinates of the square ring at Chebyshev distance `ring` around
/// `(pi, pj)`, clipped to the grid.
fn ring_bins(
    pi: usize,
    pj: usize,
    ring: usize,
    n_bins: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let r = ring as isize;
    let (pi, pj) = (pi as isize, pj as isize);
    let n = n_bins as isize;
    (-r..=r)
        .flat_map(move |dj| {
            let cells: Box<dyn Iterator<Item = (isize, isize)>> = if dj.abs() == r {
                Box::new((-r..=r).map(move |di| (pi + di, pj + dj)))
            } else {
                Box::new(
                    [(pi - r, pj + dj), (pi + r, pj + dj)]
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .into_iter(),
                )
            };
            cells
        })
        .filter(move |&(i, j)| i >= 0 && i < n && j >= 0 && j < n)
        .map(|(i, j)| (i as usize, j as usize))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::pt;
    use crate::handle::Handle;

    #[test]
    fn finds_nearest_generator_across_bins() {
        let mut grid = FaceGrid::new(1.0, 10);
        let fa = FaceHandle::new(0);
        let fb = FaceHandle::new(1);
        let fc = FaceHandle::new(2);
        grid.add_face(pt(-0.8, -0.8), fa);
        grid.add_face(pt(0.0, 0.0), fb);
        grid.add_face(pt(0.75, 0.8), fc);

        assert_eq!(grid.find_closest_face(pt(-0.7, -0.9)), fa);
        assert_eq!(grid.find_closest_face(pt(0.1, -0.1)), fb);
        assert_eq!(grid.find_closest_face(pt(0.9, 0.9)), fc);
    }

    #[test]
    fn single_bin_grid() {
        let mut grid = FaceGrid::new(1.0, 1);
        let f = FaceHandle::new(7);
        grid.add_face(pt(0.3, 0.3), f);
        assert_eq!(grid.find_closest_face(pt(-0.9, -0.9)), f);
    }

    #[test]
    fn points_outside_square_are_clamped() {
        let mut grid = FaceGrid::new(1.0, 4);
        let f = FaceHandle::new(0);
        grid.add_face(pt(0.0, 0.0), f);
        assert_eq!(grid.find_closest_face(pt(5.0, -5.0)), f);
    }
}
