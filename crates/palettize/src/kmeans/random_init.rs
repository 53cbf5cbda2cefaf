use super::CentroidSoA;
use crate::pixel_soa::PixelSoA;
use crate::types::Centroid;
use crate::{EmptyBufferSnafu, InvalidParameter, ZeroClustersSnafu};
use rand::RngExt;
use snafu::ensure;

/// Pick `k` initial centroids by sampling pixels uniformly, with replacement.
///
/// There is no uniqueness check, so the same pixel (or two pixels of the
/// same color) can seed several centroids. Those clusters might end up empty.
pub fn find_initial(
    rng: &mut impl RngExt,
    pixels: &PixelSoA,
    k: usize,
) -> Result<CentroidSoA, InvalidParameter> {
    pixels.validate()?;
    ensure!(k >= 1, ZeroClustersSnafu);
    ensure!(!pixels.is_empty(), EmptyBufferSnafu);

    let n = pixels.len();
    let mut centroids = CentroidSoA::with_capacity(k);
    for _ in 0..k {
        let i = rng.random_range(0..n);
        centroids.push(Centroid::from(pixels.get(i)));
    }

    Ok(centroids)
}
