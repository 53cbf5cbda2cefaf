#[cfg(feature = "image")]
pub mod codec;
pub mod kmeans;
pub mod pixel_soa;
pub mod remap;
pub mod rng;
pub mod types;

use kmeans::lloyds::LoopOptions;
use kmeans::CentroidSoA;
use pixel_soa::PixelSoA;
pub use rgb::RGB8;
use snafu::prelude::*;
#[cfg(feature = "image")]
use std::ops::Deref;
use tracing::debug;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum InvalidParameter {
    #[snafu(display("image size must be positive"))]
    ZeroImageSize,

    #[snafu(display("buffer length {len} is not a multiple of 3"))]
    InvalidBufferLength { len: usize },

    #[snafu(display("buffer is empty"))]
    EmptyBuffer,

    #[snafu(display("image size ({width}x{height}) doesn't match the buffer size ({buf_size})"))]
    ImageSizeMismatch {
        width: u32,
        height: u32,
        buf_size: usize,
    },

    #[snafu(display("number of clusters must be at least 1"))]
    ZeroClusters,

    #[snafu(display("{k} clusters requested, but the image only has {pixels} pixels"))]
    TooManyClusters { k: usize, pixels: usize },

    #[snafu(display("expected {expected} initial centroids, got {actual}"))]
    CentroidCountMismatch { expected: usize, actual: usize },

    #[snafu(display(
        "centroid channels have different lengths (r: {r}, g: {g}, b: {b})"
    ))]
    MalformedCentroids { r: usize, g: usize, b: usize },

    #[snafu(display(
        "pixel channels (r: {r}, g: {g}, b: {b}) don't match a {width}x{height} image"
    ))]
    MalformedPixels {
        width: u32,
        height: u32,
        r: usize,
        g: usize,
        b: usize,
    },

    #[snafu(display(
        "assignment buffer holds {actual} entries, expected one per pixel ({expected})"
    ))]
    AssignmentLengthMismatch { expected: usize, actual: usize },

    #[snafu(display("pixel {index} is assigned to cluster {cluster}, but there are only {k}"))]
    AssignmentOutOfRange { index: usize, cluster: usize, k: usize },
}

#[derive(Debug, Copy, Clone)]
enum Pixels<'a> {
    Bytes(&'a [u8]),
    Rgb(&'a [RGB8]),
}

/// A structure used as a façade for the image pixels.
#[derive(Debug, Copy, Clone)]
pub struct InputImage<'a> {
    width: u32,
    height: u32,
    pixels: Pixels<'a>,
}

impl InputImage<'_> {
    /// Wraps a row-major RGBRGBRGB… byte buffer.
    pub fn from_bytes(
        width: u32,
        height: u32,
        buf: &[u8],
    ) -> Result<InputImage<'_>, InvalidParameter> {
        ensure!(!buf.is_empty(), EmptyBufferSnafu);
        ensure!(width > 0 && height > 0, ZeroImageSizeSnafu);
        ensure!(
            buf.len().is_multiple_of(3),
            InvalidBufferLengthSnafu { len: buf.len() }
        );
        ensure!(
            buf.len() == (width as usize) * (height as usize) * 3,
            ImageSizeMismatchSnafu {
                width,
                height,
                buf_size: buf.len()
            }
        );

        Ok(InputImage {
            width,
            height,
            pixels: Pixels::Bytes(buf),
        })
    }

    /// Wraps row-major pixels, as returned by `codec::load_pixels`.
    pub fn from_pixels(
        width: u32,
        height: u32,
        pixels: &[RGB8],
    ) -> Result<InputImage<'_>, InvalidParameter> {
        ensure!(!pixels.is_empty(), EmptyBufferSnafu);
        ensure!(width > 0 && height > 0, ZeroImageSizeSnafu);
        ensure!(
            pixels.len() == (width as usize) * (height as usize),
            ImageSizeMismatchSnafu {
                width,
                height,
                buf_size: pixels.len() * 3
            }
        );

        Ok(InputImage {
            width,
            height,
            pixels: Pixels::Rgb(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn to_soa(self) -> PixelSoA {
        match self.pixels {
            Pixels::Bytes(buf) => PixelSoA::from_bytes(self.width, self.height, buf),
            Pixels::Rgb(pixels) => PixelSoA::from_pixels(self.width, self.height, pixels),
        }
    }
}

#[cfg(feature = "image")]
impl<'a, Container> TryFrom<&'a image::ImageBuffer<image::Rgb<u8>, Container>> for InputImage<'a>
where
    Container: Deref<Target = [<image::Rgb<u8> as image::Pixel>::Subpixel]> + 'a,
{
    type Error = InvalidParameter;

    fn try_from(
        img: &'a image::ImageBuffer<image::Rgb<u8>, Container>,
    ) -> Result<Self, Self::Error> {
        Self::from_bytes(img.width(), img.height(), img.as_raw().deref())
    }
}

/// Tuning knobs for [`compress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Number of clusters K, i.e. the number of colors in the output.
    pub clusters: usize,
    /// Number of assignment/update rounds.
    pub iterations: usize,
    /// Seed for picking the initial centroids.
    pub seed: u64,
    /// Stop before `iterations` rounds once no pixel changes its cluster.
    pub stop_when_stable: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            clusters: kmeans::DEFAULT_CLUSTERS,
            iterations: kmeans::DEFAULT_ITERATIONS,
            seed: rng::DEFAULT_SEED,
            stop_when_stable: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compressed {
    pub width: u32,
    pub height: u32,
    /// Output pixels, row-major, each one the rounded color of its cluster.
    pub pixels: Vec<RGB8>,
    /// One rounded color per cluster.
    pub palette: Vec<RGB8>,
    /// Final (unrounded) centroids.
    pub centroids: CentroidSoA,
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

impl Compressed {
    /// Output pixels as an RGBRGBRGB… buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        remap::to_bytes(&self.pixels)
    }
}

/// Reduce the image to at most `options.clusters` colors.
///
/// ```
/// let input = palettize::InputImage::from_bytes(2, 2,
///   &[0, 0, 0, 255, 255, 255,
///     0, 0, 0, 255, 255, 255]
/// ).unwrap();
///
/// let options = palettize::CompressOptions { clusters: 1, ..Default::default() };
/// let output = palettize::compress(input, &options).unwrap();
///
/// let gray = rgb::Rgb { r: 128, g: 128, b: 128 };
/// assert_eq!(vec![gray], output.palette);
/// assert_eq!(vec![gray; 4], output.pixels);
/// ```
///
/// Centroids are seeded from randomly sampled pixels (with replacement) using
/// `options.seed`, so the same input and options always produce the same
/// output. Clusters that end up with no pixels keep their previous centroid.
pub fn compress(
    input: InputImage,
    options: &CompressOptions,
) -> Result<Compressed, InvalidParameter> {
    debug!(
        width = input.width,
        height = input.height,
        clusters = options.clusters,
        iterations = options.iterations,
        seed = options.seed,
        "compressing image"
    );

    let pixels = input.to_soa();
    let mut rng = rng::seeded(options.seed);

    let result = kmeans::find_centroids(
        &mut rng,
        &pixels,
        options.clusters,
        LoopOptions {
            iterations: options.iterations,
            stop_when_stable: options.stop_when_stable,
            cancel: None,
        },
    )?;

    let palette = remap::palette(&result.centroids);
    let output = remap::remap(&result.assignments, &palette)?;

    debug!(
        loop_iterations = result.loop_iterations,
        converged = result.converged,
        distinct_colors = remap::count_distinct(&output),
        "compressed image"
    );

    Ok(Compressed {
        width: input.width,
        height: input.height,
        pixels: output,
        palette,
        centroids: result.centroids,
        assignments: result.assignments,
        iterations: result.loop_iterations,
        converged: result.converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(clusters: usize, iterations: usize) -> CompressOptions {
        CompressOptions {
            clusters,
            iterations,
            ..Default::default()
        }
    }

    #[test]
    fn single_pixel() {
        let buf = [100, 150, 200];
        let input = InputImage::from_bytes(1, 1, &buf).unwrap();
        let output = compress(input, &options(1, 1)).unwrap();
        assert_eq!(output.centroids.get(0).r, 100.0);
        assert_eq!(output.centroids.get(0).g, 150.0);
        assert_eq!(output.centroids.get(0).b, 200.0);
        assert_eq!(output.to_bytes(), buf);
    }

    #[test]
    fn uniform_image() {
        let buf = [200, 100, 50].repeat(100);
        let input = InputImage::from_bytes(10, 10, &buf).unwrap();
        let output = compress(input, &options(4, 10)).unwrap();
        assert_eq!(output.to_bytes(), buf);
        assert_eq!(remap::count_distinct(&output.pixels), 1);
    }

    #[test]
    fn single_cluster_is_the_mean() {
        let buf = [0, 0, 0, 10, 20, 30, 20, 40, 60, 30, 60, 90];
        let input = InputImage::from_bytes(2, 2, &buf).unwrap();
        let output = compress(input, &options(1, 3)).unwrap();
        let c = output.centroids.get(0);
        assert_eq!((c.r, c.g, c.b), (15.0, 30.0, 45.0));
        assert_eq!(output.pixels, vec![RGB8::new(15, 30, 45); 4]);
    }

    #[test]
    fn deterministic() {
        let buf: Vec<u8> = (0..=255).flat_map(|v| [v, 255 - v, v / 2]).collect();
        let input = InputImage::from_bytes(16, 16, &buf).unwrap();
        let a = compress(input, &options(5, 10)).unwrap();
        let b = compress(input, &options(5, 10)).unwrap();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.pixels, b.pixels);
    }

    #[test]
    fn fixed_iterations_by_default() {
        let buf = [10, 10, 10, 200, 200, 200].repeat(8);
        let input = InputImage::from_bytes(4, 4, &buf).unwrap();
        let output = compress(input, &options(2, 7)).unwrap();
        assert_eq!(output.iterations, 7);
        assert!(!output.converged);
    }

    #[test]
    fn stop_when_stable() {
        let buf = [10, 10, 10, 200, 200, 200].repeat(8);
        let input = InputImage::from_bytes(4, 4, &buf).unwrap();
        let output = compress(
            input,
            &CompressOptions {
                stop_when_stable: true,
                ..options(2, 50)
            },
        )
        .unwrap();
        assert!(output.converged);
        assert!(output.iterations < 50);
    }

    #[test]
    fn zero_iterations_maps_to_initial_centroids() {
        let buf = [10, 10, 10, 200, 200, 200];
        let input = InputImage::from_bytes(2, 1, &buf).unwrap();
        let output = compress(input, &options(1, 0)).unwrap();
        assert_eq!(output.iterations, 0);
        assert_eq!(output.assignments, vec![0, 0]);
        assert_eq!(output.palette.len(), 1);
        // The only centroid is one of the two sampled pixels
        let seeded_from = [RGB8::new(10, 10, 10), RGB8::new(200, 200, 200)];
        assert!(seeded_from.contains(&output.palette[0]));
        assert_eq!(output.pixels, vec![output.palette[0]; 2]);
    }

    #[test]
    fn too_many_clusters() {
        let input = InputImage::from_bytes(1, 2, &[1, 2, 3, 4, 5, 6]).unwrap();
        let err = compress(input, &options(3, 1)).unwrap_err();
        assert!(matches!(
            err,
            InvalidParameter::TooManyClusters { k: 3, pixels: 2 }
        ));
    }

    #[test]
    fn zero_clusters() {
        let input = InputImage::from_bytes(1, 1, &[1, 2, 3]).unwrap();
        let err = compress(input, &options(0, 1)).unwrap_err();
        assert!(matches!(err, InvalidParameter::ZeroClusters));
    }

    #[test]
    fn empty_buffer() {
        let result = InputImage::from_bytes(0, 0, &[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn zero_size() {
        let result = InputImage::from_bytes(0, 1, &[1, 2, 3]);
        assert!(matches!(result, Err(InvalidParameter::ZeroImageSize)));
    }

    #[test]
    fn invalid_length() {
        let result = InputImage::from_bytes(1, 2, &[1, 2]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("of 3"));
    }

    #[test]
    fn size_mismatch() {
        let result = InputImage::from_bytes(2, 2, &[1, 2, 3]);
        assert!(matches!(
            result,
            Err(InvalidParameter::ImageSizeMismatch {
                width: 2,
                height: 2,
                buf_size: 3
            })
        ));
    }

    #[test]
    fn from_pixels_checks_count() {
        let pixels = [RGB8::new(1, 2, 3); 3];
        assert!(InputImage::from_pixels(2, 2, &pixels).is_err());
        assert!(InputImage::from_pixels(3, 1, &pixels).is_ok());
        assert!(matches!(
            InputImage::from_pixels(1, 1, &[]),
            Err(InvalidParameter::EmptyBuffer)
        ));
    }

    #[cfg(feature = "image")]
    #[test]
    fn image_buffer() {
        let img: image::RgbImage =
            image::ImageBuffer::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        let input = InputImage::try_from(&img).unwrap();
        let output = compress(input, &options(2, 3)).unwrap();
        assert_eq!(output.to_bytes(), img.as_raw().clone());
    }
}
