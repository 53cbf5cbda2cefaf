use rgb::RGB8;

/// A centroid color with floating-point channels in `[0, 255]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Centroid {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Centroid {
    pub fn squared_distance(self, other: Self) -> f64 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr.mul_add(dr, dg.mul_add(dg, db * db))
    }

    pub fn distance(self, other: Self) -> f64 {
        self.squared_distance(other).sqrt()
    }
}

impl From<RGB8> for Centroid {
    fn from(px: RGB8) -> Self {
        Self {
            r: f64::from(px.r),
            g: f64::from(px.g),
            b: f64::from(px.b),
        }
    }
}
