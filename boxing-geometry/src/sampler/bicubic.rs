use super::{clamp_u8, Sampler};
use boxing_core::{Image, Matrix, PointF};

fn cubic_hermite(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    let aa = -a / 2.0 + (3.0 * b) / 2.0 - (3.0 * c) / 2.0 + d / 2.0;
    let bb = a - (5.0 * b) / 2.0 + 2.0 * c - d / 2.0;
    let cc = -a / 2.0 + c / 2.0;
    let dd = b;
    aa * t * t * t + bb * t * t + cc * t + dd
}

/// Four-tap cubic Hermite (Catmull-Rom) interpolation on each axis. Clamps
/// out-of-range neighbours to the image border rather than extrapolating.
#[derive(Debug, Clone, Copy, Default)]
pub struct BicubicSampler;

impl BicubicSampler {
    pub fn new() -> Self {
        Self
    }
}

impl Sampler for BicubicSampler {
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

                let mut rows = [0f64; 4];
                for (i, dy) in (-1..=2).enumerate() {
                    let a = image.pixel_clamped(xint - 1, yint + dy) as f64;
                    let b = image.pixel_clamped(xint, yint + dy) as f64;
                    let c = image.pixel_clamped(xint + 1, yint + dy) as f64;
                    let d = image.pixel_clamped(xint + 2, yint + dy) as f64;
                    rows[i] = cubic_hermite(a, b, c, d, xfract);
                }
                let value = cubic_hermite(rows[0], rows[1], rows[2], rows[3], yfract);
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
        let img = flat_image(8, 8, 33);
        let locs = identity_locations(8, 8);
        let out = BicubicSampler::new().sample(&img, &locs);
        assert_eq!(out.pixel(4, 4), 33);
    }

    #[test]
    fn clamps_result_to_byte_range() {
        // a sharp checkerboard can push the Hermite curve outside [0, 255];
        // the sampler must clamp rather than wrap.
        let mut img = Image::filled(6, 6, 0);
        for y in 0..6 {
            for x in 0..6 {
                if (x + y) % 2 == 0 {
                    img.set_pixel(x, y, 255);
                }
            }
        }
        let mut locs: Matrix<PointF> = Matrix::new(1, 1);
        locs.set(0, 0, PointF::new(2.5, 2.5));
        let out = BicubicSampler::new().sample(&img, &locs);
        // no assertion on exact value, just that it stayed in range (it
        // always will given u8 output) - verifies no panic on edge taps.
        let _ = out.pixel(0, 0);
    }
}
