use crate::remap;
use image::{ImageFormat, RgbImage};
use rgb::RGB8;
use snafu::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum CodecError {
    #[snafu(display("failed to read image {}", path.display()))]
    Read {
        path: PathBuf,
        source: image::ImageError,
    },

    #[snafu(display("{len} pixels don't make a {width}x{height} image"))]
    PixelCountMismatch { width: u32, height: u32, len: usize },

    #[snafu(display("output {} must be a .png file", path.display()))]
    UnsupportedOutputFormat { path: PathBuf },

    #[snafu(display("failed to encode image {}", path.display()))]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[snafu(display("failed to write image {}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Decode an image file into row-major 8-bit RGB pixels.
///
/// Any color type the decoder understands is converted to RGB, alpha is
/// dropped.
pub fn load_pixels(path: impl AsRef<Path>) -> Result<(u32, u32, Vec<RGB8>), CodecError> {
    let path = path.as_ref();
    let img = image::open(path).context(ReadSnafu { path })?.to_rgb8();
    let (width, height) = img.dimensions();

    let pixels = img
        .pixels()
        .map(|px| RGB8::new(px[0], px[1], px[2]))
        .collect::<Vec<_>>();

    debug!(path = %path.display(), width, height, "loaded image");
    Ok((width, height, pixels))
}

/// Encode row-major pixels as a PNG file.
///
/// The whole file is encoded in memory first, so nothing is written to
/// `path` unless encoding succeeds.
pub fn save_pixels(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    pixels: &[RGB8],
) -> Result<(), CodecError> {
    let path = path.as_ref();
    ensure!(
        pixels.len() == width as usize * height as usize,
        PixelCountMismatchSnafu {
            width,
            height,
            len: pixels.len()
        }
    );
    ensure!(
        ImageFormat::from_path(path).ok() == Some(ImageFormat::Png),
        UnsupportedOutputFormatSnafu { path }
    );

    let img = RgbImage::from_raw(width, height, remap::to_bytes(pixels)).context(
        PixelCountMismatchSnafu {
            width,
            height,
            len: pixels.len(),
        },
    )?;

    let mut encoded = Cursor::new(Vec::new());
    img.write_to(&mut encoded, ImageFormat::Png)
        .context(EncodeSnafu { path })?;
    std::fs::write(path, encoded.into_inner()).context(WriteSnafu { path })?;

    debug!(path = %path.display(), width, height, "saved image");
    Ok(())
}
