use crate::geom::Point;

/// The two generic-preservation-format layout revisions a frame format may
/// declare itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    GpfV1_0,
    GpfV1_1,
}

/// Immutable description of a printed frame, as read from
/// `FrameFormat.*` configuration keys. Lives for as long as the pipeline
/// and tracker built from it.
#[derive(Debug, Clone)]
pub struct FrameFormat {
    pub name: String,
    pub frame_type: FrameType,

    pub raster_width: u32,
    pub raster_height: u32,

    pub frame_width: u32,
    pub frame_height: u32,

    pub border: u32,
    pub border_gap: u32,
    pub corner_mark_size: u32,
    pub corner_mark_gap: u32,
    pub tiles_per_column: u32,

    pub ref_bar_sync_distance: u32,
    pub ref_bar_sync_offset: i32,

    pub max_levels_per_symbol: u32,

    pub sync_point_h_distance: u32,
    pub sync_point_v_distance: u32,
    pub sync_point_radius: u32,
    pub sync_point_offset: i32,

    /// Logical dimensions (rows x cols of symbol cells) of the data
    /// container and the metadata strip. Not named as a top-level
    /// `FrameFormat.*` key in the configuration groups, but every grid
    /// construction step needs a concrete extent to build against, so it
    /// is carried as part of the same descriptor rather than re-derived
    /// ad hoc at each call site.
    pub content_rows: u32,
    pub content_cols: u32,
    pub metadata_rows: u32,
    pub metadata_cols: u32,
}

impl FrameFormat {
    /// `colour depth = log2(max_levels_per_symbol)`, per the data model.
    pub fn bits_per_symbol(&self) -> u32 {
        debug_assert!(self.max_levels_per_symbol.is_power_of_two());
        self.max_levels_per_symbol.trailing_zeros()
    }
}

/// The four corner fiducials, in image space. Invariant: `bottom.y >
/// top.y` and `right.x > left.x`; a caller building one of these from
/// measured coordinates must check this before trusting it further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerMarks {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl CornerMarks {
    pub fn new(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// `true` when the measured corners satisfy the ordering invariant
    /// (right of left, bottom below top) and each dimension is at least
    /// one pixel.
    pub fn is_valid(&self) -> bool {
        self.width() >= 1 && self.height() >= 1
    }

    pub fn width(&self) -> i32 {
        self.top_right.x - self.top_left.x
    }

    pub fn height(&self) -> i32 {
        self.bottom_left.y - self.top_left.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_marks_valid_when_ordered() {
        let marks = CornerMarks::new(
            Point::new(0, 0),
            Point::new(100, 1),
            Point::new(1, 100),
            Point::new(100, 100),
        );
        assert!(marks.is_valid());
        assert_eq!(marks.width(), 100);
        assert_eq!(marks.height(), 100);
    }

    #[test]
    fn corner_marks_invalid_when_collapsed() {
        let marks = CornerMarks::new(
            Point::new(0, 0),
            Point::new(0, 0),
            Point::new(0, 0),
            Point::new(0, 0),
        );
        assert!(!marks.is_valid());
    }
}
