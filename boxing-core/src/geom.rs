/// An integer point in either print space or image space, depending on
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A sub-pixel coordinate in the captured image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_point(p: Point) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn add(&self, other: PointF) -> PointF {
        PointF::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: PointF) -> PointF {
        PointF::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(&self, k: f64) -> PointF {
        PointF::new(self.x * k, self.y * k)
    }

    pub fn lerp(&self, other: PointF, t: f64) -> PointF {
        PointF::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// A line between two floating-point points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub start: PointF,
    pub end: PointF,
}

impl Line {
    pub fn new(start: PointF, end: PointF) -> Self {
        Self { start, end }
    }

    pub fn at(&self, t: f64) -> PointF {
        self.start.lerp(self.end, t)
    }

    /// Intersection of this line with `other`, treating both as infinite
    /// lines. Returns `None` when the direction vectors are parallel
    /// (determinant is zero or non-finite).
    pub fn intersect(&self, other: &Line) -> Option<PointF> {
        let d1 = self.end.sub(self.start);
        let d2 = other.end.sub(other.start);
        let denom = d1.x * d2.y - d1.y * d2.x;
        if denom == 0.0 || !denom.is_finite() {
            return None;
        }
        let diff = other.start.sub(self.start);
        let t = (diff.x * d2.y - diff.y * d2.x) / denom;
        if !t.is_finite() {
            return None;
        }
        Some(self.at(t))
    }
}
