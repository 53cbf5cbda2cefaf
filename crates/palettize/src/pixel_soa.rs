use crate::{InvalidParameter, MalformedPixelsSnafu};
use rgb::RGB8;
use snafu::ensure;

/// Row-major pixel colors, one vector per channel.
#[derive(Debug, Clone)]
pub struct PixelSoA {
    pub width: u32,
    pub height: u32,
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

impl PixelSoA {
    pub fn new(width: u32, height: u32, capacity: usize) -> Self {
        Self {
            width,
            height,
            r: Vec::with_capacity(capacity),
            g: Vec::with_capacity(capacity),
            b: Vec::with_capacity(capacity),
        }
    }

    /// Splits an RGBRGB… buffer into channels.
    ///
    /// The caller is responsible for validating the buffer, see
    /// [`crate::InputImage::from_bytes`].
    pub fn from_bytes(width: u32, height: u32, buf: &[u8]) -> Self {
        assert!(buf.len().is_multiple_of(3));
        assert_eq!(buf.len(), width as usize * height as usize * 3);

        let mut soa = Self::new(width, height, buf.len() / 3);
        for px in buf.chunks_exact(3) {
            soa.push(RGB8::new(px[0], px[1], px[2]));
        }
        soa
    }

    pub fn from_pixels(width: u32, height: u32, pixels: &[RGB8]) -> Self {
        assert_eq!(pixels.len(), width as usize * height as usize);

        let mut soa = Self::new(width, height, pixels.len());
        for &px in pixels {
            soa.push(px);
        }
        soa
    }

    #[inline(always)]
    pub fn push(&mut self, px: RGB8) {
        self.r.push(px.r);
        self.g.push(px.g);
        self.b.push(px.b);
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> RGB8 {
        RGB8::new(self.r[i], self.g[i], self.b[i])
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// All three channels hold one entry per pixel of a `width`x`height` image.
    pub fn is_well_formed(&self) -> bool {
        self.r.len() == self.g.len()
            && self.r.len() == self.b.len()
            && self.r.len() == self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), InvalidParameter> {
        ensure!(
            self.is_well_formed(),
            MalformedPixelsSnafu {
                width: self.width,
                height: self.height,
                r: self.r.len(),
                g: self.g.len(),
                b: self.b.len(),
            }
        );
        Ok(())
    }
}
