use super::CentroidSoA;
use crate::pixel_soa::PixelSoA;
use crate::{
    AssignmentLengthMismatchSnafu, CentroidCountMismatchSnafu, EmptyBufferSnafu,
    InvalidParameter, MalformedCentroidsSnafu, TooManyClustersSnafu, ZeroClustersSnafu,
};
use snafu::ensure;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Marks a pixel that hasn't been through an assignment step yet.
pub const UNASSIGNED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions<'a> {
    /// Number of assignment/update rounds to run.
    pub iterations: usize,
    /// Stop early once an assignment step leaves every pixel where it was.
    pub stop_when_stable: bool,
    /// Checked before every round; once set, the loop returns at that boundary.
    pub cancel: Option<&'a AtomicBool>,
}

impl LoopOptions<'_> {
    pub fn fixed(iterations: usize) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }
}

#[inline(always)]
fn distance(c_r: f64, c_g: f64, c_b: f64, r: f64, g: f64, b: f64) -> f64 {
    let dr = c_r - r;
    let dg = c_g - g;
    let db = c_b - b;

    dr.mul_add(dr, dg.mul_add(dg, db * db))
}

/// Assign every pixel to its nearest centroid.
///
/// Ties go to the lowest centroid index. Returns how many assignments changed.
#[inline]
pub fn assign_points(
    pixels: &PixelSoA,
    centroids: &CentroidSoA,
    assignments: &mut [usize],
) -> usize {
    let mut changed = 0;

    for (i, assignment) in assignments.iter_mut().enumerate() {
        let r = f64::from(pixels.r[i]);
        let g = f64::from(pixels.g[i]);
        let b = f64::from(pixels.b[i]);

        let mut min = f64::INFINITY;
        let mut min_idx = 0;
        for j in 0..centroids.len() {
            let d = distance(centroids.r[j], centroids.g[j], centroids.b[j], r, g, b);
            if d < min {
                min = d;
                min_idx = j;
            }
        }

        if *assignment != min_idx {
            *assignment = min_idx;
            changed += 1;
        }
    }

    changed
}

pub fn count_members(k: usize, assignments: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; k];
    for &assigned_c in assignments {
        counts[assigned_c] += 1;
    }
    counts
}

#[derive(Debug)]
pub struct UpdateResult {
    pub shift_squared: f64,
    pub counts: Vec<usize>,
}

/// Move every non-empty centroid to the mean of its pixels.
///
/// Empty clusters keep their previous coordinates.
#[inline]
pub fn update_centroids(
    pixels: &PixelSoA,
    assignments: &[usize],
    centroids: &mut CentroidSoA,
) -> UpdateResult {
    let k = centroids.len();
    let mut counts = vec![0usize; k];
    let mut sums_r = vec![0f64; k];
    let mut sums_g = vec![0f64; k];
    let mut sums_b = vec![0f64; k];

    for (i, assigned_c) in assignments.iter().copied().enumerate() {
        debug_assert!(assigned_c < k);

        counts[assigned_c] += 1;
        sums_r[assigned_c] += f64::from(pixels.r[i]);
        sums_g[assigned_c] += f64::from(pixels.g[i]);
        sums_b[assigned_c] += f64::from(pixels.b[i]);
    }

    let mut shift_squared = 0f64;

    for i in 0..k {
        if counts[i] == 0 {
            trace!(cluster = i, "empty cluster keeps its centroid");
            continue;
        }

        let count = counts[i] as f64;
        let new_r = sums_r[i] / count;
        let new_g = sums_g[i] / count;
        let new_b = sums_b[i] / count;

        shift_squared += distance(
            centroids.r[i],
            centroids.g[i],
            centroids.b[i],
            new_r,
            new_g,
            new_b,
        );

        centroids.r[i] = new_r;
        centroids.g[i] = new_g;
        centroids.b[i] = new_b;
    }

    UpdateResult {
        shift_squared,
        counts,
    }
}

#[derive(Debug)]
pub struct LloydsLoopResult {
    /// Rounds that ran to completion.
    pub iterations: usize,
    pub converged: bool,
    pub cancelled: bool,
    /// Pixels per cluster after the last completed round (all zero if none ran).
    pub counts: Vec<usize>,
}

/// Run Lloyd's rounds over `pixels`, refining `centroids` in place.
///
/// `assignments` holds one entry per pixel; whatever it holds on entry is
/// treated as the previous assignment when counting changes, see
/// [`UNASSIGNED`]. The first round always runs its update step, so the
/// stable stop only fires once the centroids are means of their members.
pub fn lloyds_loop(
    pixels: &PixelSoA,
    k: usize,
    assignments: &mut [usize],
    centroids: &mut CentroidSoA,
    options: LoopOptions,
) -> Result<LloydsLoopResult, InvalidParameter> {
    pixels.validate()?;
    let n = pixels.len();
    ensure!(n > 0, EmptyBufferSnafu);
    ensure!(k >= 1, ZeroClustersSnafu);
    ensure!(k <= n, TooManyClustersSnafu { k, pixels: n });
    ensure!(
        centroids.is_well_formed(),
        MalformedCentroidsSnafu {
            r: centroids.r.len(),
            g: centroids.g.len(),
            b: centroids.b.len(),
        }
    );
    ensure!(
        centroids.len() == k,
        CentroidCountMismatchSnafu {
            expected: k,
            actual: centroids.len(),
        }
    );
    ensure!(
        assignments.len() == n,
        AssignmentLengthMismatchSnafu {
            expected: n,
            actual: assignments.len(),
        }
    );

    let mut counts = vec![0usize; k];

    for i in 0..options.iterations {
        if options.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            debug!(iterations = i, "lloyds loop cancelled");
            return Ok(LloydsLoopResult {
                iterations: i,
                converged: false,
                cancelled: true,
                counts,
            });
        }

        let changed = assign_points(pixels, centroids, assignments);

        // From the second round on, centroids are the means of the previous
        // assignments, so an unchanged assignment leaves them where they are
        if options.stop_when_stable && changed == 0 && i > 0 {
            debug!(iterations = i + 1, "lloyds loop converged");
            return Ok(LloydsLoopResult {
                iterations: i + 1,
                converged: true,
                cancelled: false,
                counts,
            });
        }

        let update_result = update_centroids(pixels, assignments, centroids);
        counts = update_result.counts;

        debug!(
            iteration = i + 1,
            changed,
            shift_squared = update_result.shift_squared,
            empty_clusters = counts.iter().filter(|&&c| c == 0).count(),
            "lloyds iteration"
        );
    }

    Ok(LloydsLoopResult {
        iterations: options.iterations,
        converged: false,
        cancelled: false,
        counts,
    })
}
