use boxing_core::{CornerMarks, PointF};

/// Bilinear mapping from printed-frame coordinates to captured-image
/// coordinates, parameterised by the measured corners and the printed-space
/// distances between them.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    origin: PointF,
    // printed-space distance spanned by the right and bottom vectors,
    // so that a print-space coordinate can be normalised to [0, 1] before
    // the bilinear blend.
    print_width: f64,
    print_height: f64,
    right: PointF,
    bottom: PointF,
    // The GPF container is not a perfect parallelogram: top-right is
    // reached via `right`, bottom-left via `bottom`, and the corner
    // opposite the origin is measured directly rather than assumed to be
    // `right + bottom`, so skew is represented exactly at the corners.
    opposite: PointF,
}

impl CoordinateMapper {
    /// Build a mapper from measured corners and the frame's printed-space
    /// extent (the distance in print-space pixels between the reference
    /// points the corners were measured at).
    pub fn new(corners: CornerMarks, print_width: f64, print_height: f64) -> Self {
        let origin = PointF::from_point(corners.top_left);
        let right = PointF::from_point(corners.top_right);
        let bottom = PointF::from_point(corners.bottom_left);
        let opposite = PointF::from_point(corners.bottom_right);
        Self {
            origin,
            print_width,
            print_height,
            right,
            bottom,
            opposite,
        }
    }

    /// Map a print-space coordinate into captured-image space. Returns
    /// `None` if the result would be non-finite (degenerate corners).
    pub fn map(&self, print_x: f64, print_y: f64) -> Option<PointF> {
        if self.print_width == 0.0 || self.print_height == 0.0 {
            return None;
        }
        let u = print_x / self.print_width;
        let v = print_y / self.print_height;

        let top = self.origin.lerp(self.right, u);
        let bot = self.bottom.lerp(self.opposite, u);
        let p = top.lerp(bot, v);

        if p.is_finite() {
            Some(p)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxing_core::Point;

    fn unit_square_corners() -> CornerMarks {
        CornerMarks::new(
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(0, 100),
            Point::new(100, 100),
        )
    }

    #[test]
    fn identity_mapping_on_axis_aligned_square() {
        let mapper = CoordinateMapper::new(unit_square_corners(), 10.0, 10.0);
        let p = mapper.map(5.0, 5.0).unwrap();
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn corners_map_to_themselves() {
        let mapper = CoordinateMapper::new(unit_square_corners(), 10.0, 10.0);
        let tl = mapper.map(0.0, 0.0).unwrap();
        assert_eq!((tl.x, tl.y), (0.0, 0.0));
        let br = mapper.map(10.0, 10.0).unwrap();
        assert_eq!((br.x, br.y), (100.0, 100.0));
    }

    #[test]
    fn zero_extent_is_rejected() {
        let mapper = CoordinateMapper::new(unit_square_corners(), 0.0, 10.0);
        assert!(mapper.map(1.0, 1.0).is_none());
    }
}
