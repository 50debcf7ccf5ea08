use super::{clamp_u8, Sampler};
use boxing_core::{Image, Matrix, PointF};

/// Fits a parabola through three samples on each axis using a fixed 3x3
/// neighbourhood. The default sampler for reference bars, where the signal
/// is smooth enough that a quadratic fit outperforms a linear one without
/// the cost of the four-tap cubic.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadraticSampler;

impl BiquadraticSampler {
    pub fn new() -> Self {
        Self
    }

    fn fit_axis(m0: f64, m1: f64, m2: f64, t: f64) -> f64 {
        // Parabola through (-1, m0), (0, m1), (1, m2), evaluated at t in
        // [0, 1] measured from the centre sample.
        let b0 = m0 * 0.5 - m1 + m2 * 0.5;
        let b1 = m0 * -1.5 + m1 * 2.0 + m2 * -0.5;
        t * t * b0 + t * b1 + m0
    }
}

impl Sampler for BiquadraticSampler {
    fn sample(&self, image: &Image, locations: &Matrix<PointF>) -> Image {
        let width = locations.width();
        let height = locations.height();
        let mut out = Image::filled(width, height, 0);

        for row in 0..height {
            for col in 0..width {
                let p = locations.get(row, col);
                let xi = p.x.floor() as isize;
                let yi = p.y.floor() as isize;
                let x_ = p.x - xi as f64 + 1.0;
                let y_ = p.y - yi as f64 + 1.0;

                let mut m = [[0f64; 3]; 3];
                for (r, dy) in (-1..=1).enumerate() {
                    for (c, dx) in (-1..=1).enumerate() {
                        m[r][c] = image.pixel_clamped(xi + dx, yi + dy) as f64;
                    }
                }

                let z0 = Self::fit_axis(m[0][0], m[1][0], m[2][0], y_);
                let z1 = Self::fit_axis(m[0][1], m[1][1], m[2][1], y_);
                let z2 = Self::fit_axis(m[0][2], m[1][2], m[2][2], y_);
                let value = Self::fit_axis(z0, z1, z2, x_);

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
        let img = flat_image(8, 8, 140);
        let locs = identity_locations(8, 8);
        let out = BiquadraticSampler::new().sample(&img, &locs);
        assert_eq!(out.pixel(4, 4), 140);
    }

    #[test]
    fn stays_in_byte_range_on_a_step() {
        let mut img = Image::filled(6, 6, 0);
        for y in 0..6 {
            for x in 3..6 {
                img.set_pixel(x, y, 255);
            }
        }
        let mut locs: Matrix<PointF> = Matrix::new(1, 1);
        locs.set(0, 0, PointF::new(3.0, 3.0));
        let out = BiquadraticSampler::new().sample(&img, &locs);
        let _ = out.pixel(0, 0);
    }
}
