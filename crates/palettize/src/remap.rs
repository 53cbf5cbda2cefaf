use crate::kmeans::CentroidSoA;
use crate::{AssignmentOutOfRangeSnafu, InvalidParameter};
use rgb::RGB8;
use snafu::OptionExt;
use std::collections::HashSet;

#[inline]
fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Round every centroid to the nearest 8-bit color.
pub fn palette(centroids: &CentroidSoA) -> Vec<RGB8> {
    centroids
        .iter()
        .map(|c| RGB8::new(to_channel(c.r), to_channel(c.g), to_channel(c.b)))
        .collect()
}

/// Replace every pixel with the palette color of its cluster.
///
/// Fails if an assignment has no palette entry, e.g. a pixel still marked
/// [`crate::kmeans::lloyds::UNASSIGNED`].
pub fn remap(assignments: &[usize], palette: &[RGB8]) -> Result<Vec<RGB8>, InvalidParameter> {
    assignments
        .iter()
        .enumerate()
        .map(|(index, &cluster)| {
            palette.get(cluster).copied().context(AssignmentOutOfRangeSnafu {
                index,
                cluster,
                k: palette.len(),
            })
        })
        .collect()
}

pub fn to_bytes(pixels: &[RGB8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(pixels.len() * 3);
    for px in pixels {
        buf.extend_from_slice(&[px.r, px.g, px.b]);
    }
    buf
}

pub fn count_distinct(pixels: &[RGB8]) -> usize {
    pixels.iter().copied().collect::<HashSet<_>>().len()
}
