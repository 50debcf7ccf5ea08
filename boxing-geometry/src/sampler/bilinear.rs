use super::{clamp_u8, Sampler};
use boxing_core::{Image, Matrix, PointF};

fn lerp(s: f64, e: f64, t: f64) -> f64 {
    s + (e - s) * t
}

fn blerp(c00: f64, c10: f64, c01: f64, c11: f64, tx: f64, ty: f64) -> f64 {
    lerp(lerp(c00, c10, tx), lerp(c01, c11, tx), ty)
}

/// Standard two-tap interpolation of the four neighbours around the
/// sampling location.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearSampler;

impl BilinearSampler {
    pub fn new() -> Self {
        Self
    }
}

impl Sampler for BilinearSampler {
    fn sample(&self, image: &Image, locations: &Matrix<PointF>) -> Image {
        let width = locations.width();
        let height = locations.height();
        let mut out = Image::filled(width, height, 0);

        for row in 0..height {
            for col in 0..width {
                let p = locations.get(row, col);
                let xint = p.x.floor() as isize;
                let yint = p.y.floor() as isize;
                let xfract = p.x - xint as f64;
                let yfract = p.y - yint as f64;

                let c00 = image.pixel_clamped(xint, yint) as f64;
                let c10 = image.pixel_clamped(xint + 1, yint) as f64;
                let c01 = image.pixel_clamped(xint, yint + 1) as f64;
                let c11 = image.pixel_clamped(xint + 1, yint + 1) as f64;

                let value = blerp(c00, c10, c01, c11, xfract, yfract);
                out.set_pixel(col, row, clamp_u8(value));
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
        let img = flat_image(8, 8, 200);
        let locs = identity_locations(8, 8);
        let out = BilinearSampler::new().sample(&img, &locs);
        assert_eq!(out.pixel(2, 2), 200);
    }

    #[test]
    fn interpolates_between_neighbours() {
        let mut img = Image::filled(2, 2, 0);
        img.set_pixel(1, 0, 255);
        img.set_pixel(1, 1, 255);
        let mut locs: Matrix<PointF> = Matrix::new(1, 1);
        locs.set(0, 0, PointF::new(0.5, 0.0));
        let out = BilinearSampler::new().sample(&img, &locs);
        assert_eq!(out.pixel(0, 0), 127);
    }

    #[test]
    fn clamps_out_of_range_coordinates() {
        let img = flat_image(4, 4, 50);
        let mut locs: Matrix<PointF> = Matrix::new(1, 1);
        locs.set(0, 0, PointF::new(-10.0, -10.0));
        let out = BilinearSampler::new().sample(&img, &locs);
        assert_eq!(out.pixel(0, 0), 50);
    }
}
