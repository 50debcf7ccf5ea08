use super::{clamp_u8, Sampler};
use boxing_core::{Image, Matrix, PointF};

/// Box-filter sampler: averages a `(2r+1) x (2r+1)` neighbourhood around the
/// sampling location. Used for metadata and calibration-strip symbols whose
/// printed footprint is larger than one pixel.
#[derive(Debug, Clone, Copy)]
pub struct AreaSampler {
    radius: i32,
}

impl AreaSampler {
    pub fn new(radius: i32) -> Self {
        Self { radius }
    }
}

impl Sampler for AreaSampler {
    fn sample(&self, image: &Image, locations: &Matrix<PointF>) -> Image {
        let width = locations.width();
        let height = locations.height();
        let mut out = Image::filled(width, height, 0);
        let r = self.radius;
        let window = (2 * r + 1) * (2 * r + 1);

        for row in 0..height {
            for col in 0..width {
                let p = locations.get(row, col);
                let cx = p.x.round() as i32;
                let cy = p.y.round() as i32;

                let mut sum: i64 = 0;
                for yi in (cy - r)..=(cy + r) {
                    for xi in (cx - r)..=(cx + r) {
                        sum += image.pixel_clamped(xi as isize, yi as isize) as i64;
                    }
                }
                let avg = sum as f64 / window as f64;
                out.set_pixel(col, row, clamp_u8(avg));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{flat_image, identity_locations};
    use super::*;

    #[test]
    fn flat_image_samples_flat() {
        let img = flat_image(16, 16, 77);
        let locs = identity_locations(8, 8);
        let out = AreaSampler::new(1).sample(&img, &locs);
        assert_eq!(out.pixel(3, 3), 77);
    }

    #[test]
    fn averages_a_sharp_edge() {
        let mut img = Image::filled(8, 8, 0);
        for y in 0..8 {
            for x in 4..8 {
                img.set_pixel(x, y, 255);
            }
        }
        let mut locs: Matrix<PointF> = Matrix::new(1, 1);
        locs.set(0, 0, PointF::new(4.0, 4.0));
        let out = AreaSampler::new(1).sample(&img, &locs);
        // a 3x3 box straddling the edge should land strictly between 0 and 255
        let v = out.pixel(0, 0);
        assert!(v > 0 && v < 255);
    }
}
