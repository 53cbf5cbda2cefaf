use crate::pixel_soa::PixelSoA;
use crate::types::Centroid;
use crate::{EmptyBufferSnafu, InvalidParameter, TooManyClustersSnafu, ZeroClustersSnafu};
use lloyds::LoopOptions;
use rand::RngExt;
use snafu::ensure;

pub mod lloyds;
pub mod random_init;

// Plain Lloyd's algorithm:
// - centroids are seeded with K pixels drawn uniformly with replacement
//   (duplicates allowed, no k-means++)
// - each round assigns every pixel to its nearest centroid, then moves every
//   non-empty centroid to the mean of its pixels
// - empty clusters keep their centroid, they are never reseeded
// - the round count is fixed; stopping on stable assignments is opt-in

pub const DEFAULT_CLUSTERS: usize = 16;
pub const DEFAULT_ITERATIONS: usize = 10;

/// Centroid coordinates, one vector per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentroidSoA {
    pub r: Vec<f64>,
    pub g: Vec<f64>,
    pub b: Vec<f64>,
}

impl CentroidSoA {
    pub fn with_capacity(k: usize) -> Self {
        Self {
            r: Vec::with_capacity(k),
            g: Vec::with_capacity(k),
            b: Vec::with_capacity(k),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, c: Centroid) {
        self.r.push(c.r);
        self.g.push(c.g);
        self.b.push(c.b);
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> Centroid {
        Centroid {
            r: self.r[i],
            g: self.g[i],
            b: self.b[i],
        }
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// All three channels hold the same number of centroids.
    pub fn is_well_formed(&self) -> bool {
        self.r.len() == self.g.len() && self.r.len() == self.b.len()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Centroid> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }
}

impl FromIterator<Centroid> for CentroidSoA {
    fn from_iter<I: IntoIterator<Item = Centroid>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut soa = Self::with_capacity(iter.size_hint().0);
        for c in iter {
            soa.push(c);
        }
        soa
    }
}

#[derive(Debug)]
pub struct Centroids {
    pub centroids: CentroidSoA,
    pub assignments: Vec<usize>,
    /// Pixels per cluster after the last update.
    pub counts: Vec<usize>,
    pub loop_iterations: usize,
    pub converged: bool,
    pub cancelled: bool,
}

/// Seed `k` centroids from random pixels and refine them with Lloyd's loop.
///
/// If no round ran (zero iterations, or cancelled before the first round),
/// pixels are still assigned to their nearest initial centroid so that
/// every assignment is a valid cluster index.
pub fn find_centroids(
    rng: &mut impl RngExt,
    pixels: &PixelSoA,
    k: usize,
    options: LoopOptions,
) -> Result<Centroids, InvalidParameter> {
    pixels.validate()?;
    ensure!(!pixels.is_empty(), EmptyBufferSnafu);
    ensure!(k >= 1, ZeroClustersSnafu);
    ensure!(
        k <= pixels.len(),
        TooManyClustersSnafu {
            k,
            pixels: pixels.len()
        }
    );

    let mut centroids = random_init::find_initial(rng, pixels, k)?;
    let mut assignments = vec![lloyds::UNASSIGNED; pixels.len()];

    let result = lloyds::lloyds_loop(pixels, k, &mut assignments, &mut centroids, options)?;

    let counts = if result.iterations == 0 {
        lloyds::assign_points(pixels, &centroids, &mut assignments);
        lloyds::count_members(k, &assignments)
    } else {
        result.counts
    };

    Ok(Centroids {
        centroids,
        assignments,
        counts,
        loop_iterations: result.iterations,
        converged: result.converged,
        cancelled: result.cancelled,
    })
}
