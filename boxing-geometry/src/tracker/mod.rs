mod cornermark;
mod grid;
mod refbar;
mod syncpoint;

use boxing_core::{BoxingError, BoxingResult, CornerMarks, FrameFormat, Image, Matrix, PointF};

use crate::mapper::CoordinateMapper;
use cornermark::search_corners;
use grid::{build_content_grid, build_metadata_grid, horizontal_shift, vertical_displacement};
use refbar::track_reference_bars;
use syncpoint::refine_sync_points;

/// Operating-mode bit flags. Analog mode (the default) enables every step
/// of the real-world pipeline; `SIMULATED` is a testing-only fast path
/// that assumes the image already is the ideal raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerMode(u32);

impl TrackerMode {
    pub const SIMULATED: TrackerMode = TrackerMode(0x0001);
    pub const REFERENCE_MARKS: TrackerMode = TrackerMode(0x0002);
    pub const HORIZONTAL_SHIFT: TrackerMode = TrackerMode(0x0004);
    pub const VERTICAL_SHIFT: TrackerMode = TrackerMode(0x0008);
    pub const CONTENT_CONTAINER: TrackerMode = TrackerMode(0x0010);
    pub const METADATA_CONTAINER: TrackerMode = TrackerMode(0x0020);
    pub const CALIBRATION_BAR: TrackerMode = TrackerMode(0x0040);
    pub const SYSTEM_HUMAN_READABLE: TrackerMode = TrackerMode(0x0080);
    pub const USER_HUMAN_READABLE: TrackerMode = TrackerMode(0x0100);
    pub const SYNC_POINTS: TrackerMode = TrackerMode(0x0200);

    /// The real-world pipeline: every step except the testing-only
    /// simulated fast path.
    pub const ANALOG: TrackerMode = TrackerMode(
        Self::REFERENCE_MARKS.0
            | Self::HORIZONTAL_SHIFT.0
            | Self::VERTICAL_SHIFT.0
            | Self::CONTENT_CONTAINER.0
            | Self::METADATA_CONTAINER.0
            | Self::CALIBRATION_BAR.0
            | Self::SYNC_POINTS.0,
    );

    pub fn contains(&self, other: TrackerMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: TrackerMode) -> TrackerMode {
        TrackerMode(self.0 | other.0)
    }
}

impl std::ops::BitOr for TrackerMode {
    type Output = TrackerMode;
    fn bitor(self, rhs: TrackerMode) -> TrackerMode {
        self.union(rhs)
    }
}

/// Everything the tracker produces for a single frame decode: the measured
/// corners, the coordinate mapper built from them, and the two sampling
/// location matrices (content container, metadata strip) the sampler
/// family consumes.
#[derive(Debug, Clone)]
pub struct TrackerOutput {
    pub corners: CornerMarks,
    pub mapper: CoordinateMapper,
    pub content_locations: Matrix<PointF>,
    pub metadata_locations: Matrix<PointF>,
    /// `true` when one or more optional correction steps were skipped due
    /// to a non-finite intermediate estimate; the decode still succeeded.
    pub degraded: bool,
}

#[derive(Debug, Default)]
pub struct Tracker {
    mode: TrackerMode,
}

impl Default for TrackerMode {
    fn default() -> Self {
        TrackerMode::ANALOG
    }
}

impl Tracker {
    pub fn new(mode: TrackerMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TrackerMode {
        self.mode
    }

    /// Runs the full analog-mode pipeline, or the simulated fast path when
    /// `SIMULATED` is set. Per an open design question, simulated mode
    /// returns early without ever invoking reference-bar tracking; this is
    /// intentional (simulated mode is testing-only) and is preserved here
    /// rather than "fixed".
    pub fn track(&self, image: &Image, format: &FrameFormat) -> BoxingResult<TrackerOutput> {
        if self.mode.contains(TrackerMode::SIMULATED) {
            return Ok(self.track_simulated(format));
        }

        // Step 1: initial sampling-rate estimate (not retained beyond this
        // point; step 3 immediately refines it from measured corners).
        let _x_rate = image.width() as f64 / format.frame_width as f64;
        let _y_rate = image.height() as f64 / format.frame_height as f64;

        // Step 2: corner-mark search (fatal).
        let corners = search_corners(image, format)
            .ok_or_else(|| BoxingError::BorderTrackingError("corners".into()))?;
        if !corners.is_valid() {
            return Err(BoxingError::BorderTrackingError("corners".into()));
        }

        // Step 3 + 4: refine sampling rates is implicit in building the
        // mapper directly from the measured corner distances.
        let print_width = (format.frame_width - format.corner_mark_size) as f64;
        let print_height = (format.frame_height - format.corner_mark_size) as f64;
        let mut mapper = CoordinateMapper::new(corners, print_width, print_height);

        // Step 6: brightness priors near the corners; available to later
        // steps via `image.region_min_max` but not retained on the output,
        // since no downstream step in this crate currently consumes them.
        let _ = image.region_min_max(corners.top_left.x as isize, corners.top_left.y as isize, 4);

        let mut degraded = false;

        // Step 7: reference-bar tracking (fatal).
        let bars = if self.mode.contains(TrackerMode::REFERENCE_MARKS) {
            Some(
                track_reference_bars(image, format, &mapper)
                    .ok_or_else(|| BoxingError::BorderTrackingError("refbars".into()))?,
            )
        } else {
            None
        };

        // Step 8: horizontal shift tracking (degrades silently).
        let h_shift = if self.mode.contains(TrackerMode::HORIZONTAL_SHIFT) {
            match bars.as_ref().and_then(|b| horizontal_shift(image, format, b)) {
                Some(shift) => Some(shift),
                None => {
                    degraded = true;
                    None
                }
            }
        } else {
            None
        };

        // Step 9: content grid construction (fatal on count mismatch).
        let mut content_locations = if self.mode.contains(TrackerMode::CONTENT_CONTAINER) {
            build_content_grid(format, &mapper, bars.as_ref(), h_shift.as_ref())
                .ok_or_else(|| BoxingError::BorderTrackingError("grid".into()))?
        } else {
            Matrix::new(0, 0)
        };

        // Step 10: metadata grid construction.
        let metadata_locations = if self.mode.contains(TrackerMode::METADATA_CONTAINER) {
            build_metadata_grid(format, &mapper)
        } else {
            Matrix::new(0, 0)
        };

        // Step 11: vertical displacement correction (degrades silently).
        if self.mode.contains(TrackerMode::VERTICAL_SHIFT) {
            if !vertical_displacement(image, format, &mapper, &mut content_locations) {
                degraded = true;
            }
        }

        // Step 12: sync-point refinement (degrades silently).
        if self.mode.contains(TrackerMode::SYNC_POINTS) {
            if !refine_sync_points(image, format, &mut content_locations) {
                degraded = true;
            }
        }

        // Non-finite guard: any coordinate that slipped through as NaN or
        // infinite is a border-tracking error, not a silently wrong sample.
        for p in content_locations.as_slice() {
            if !p.is_finite() {
                return Err(BoxingError::BorderTrackingError("non-finite coordinate".into()));
            }
        }

        // Mapper is not mutated after construction in this implementation;
        // silence the `mut` lint path some callers might expect if a future
        // refinement step needs to adjust it in place.
        let _ = &mut mapper;

        Ok(TrackerOutput {
            corners,
            mapper,
            content_locations,
            metadata_locations,
            degraded,
        })
    }

    fn track_simulated(&self, format: &FrameFormat) -> TrackerOutput {
        let corners = cornermark::ideal_corners(format);
        let print_width = (format.frame_width - format.corner_mark_size) as f64;
        let print_height = (format.frame_height - format.corner_mark_size) as f64;
        let mapper = CoordinateMapper::new(corners, print_width, print_height);
        let content_locations = build_content_grid(format, &mapper, None, None)
            .unwrap_or_else(|| Matrix::new(0, 0));
        let metadata_locations = build_metadata_grid(format, &mapper);
        TrackerOutput {
            corners,
            mapper,
            content_locations,
            metadata_locations,
            degraded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxing_core::FrameType;

    fn tiny_format() -> FrameFormat {
        FrameFormat {
            name: "test".into(),
            frame_type: FrameType::GpfV1_1,
            raster_width: 64,
            raster_height: 64,
            frame_width: 64,
            frame_height: 64,
            border: 2,
            border_gap: 1,
            corner_mark_size: 8,
            corner_mark_gap: 1,
            tiles_per_column: 2,
            ref_bar_sync_distance: 0,
            ref_bar_sync_offset: 0,
            max_levels_per_symbol: 4,
            sync_point_h_distance: 16,
            sync_point_v_distance: 16,
            sync_point_radius: 2,
            sync_point_offset: 0,
            content_rows: 4,
            content_cols: 4,
            metadata_rows: 2,
            metadata_cols: 2,
        }
    }

    #[test]
    fn simulated_mode_never_fails() {
        let format = tiny_format();
        let image = Image::filled(format.raster_width as usize, format.raster_height as usize, 128);
        let tracker = Tracker::new(TrackerMode::SIMULATED);
        let out = tracker.track(&image, &format).unwrap();
        assert!(!out.degraded);
        assert!(out.corners.is_valid());
    }

    #[test]
    fn mode_flags_compose_with_bitor() {
        let mode = TrackerMode::REFERENCE_MARKS | TrackerMode::SYNC_POINTS;
        assert!(mode.contains(TrackerMode::REFERENCE_MARKS));
        assert!(mode.contains(TrackerMode::SYNC_POINTS));
        assert!(!mode.contains(TrackerMode::CALIBRATION_BAR));
    }

    #[test]
    fn missing_corners_is_a_border_tracking_error() {
        let format = tiny_format();
        // An all-black image has no corner-mark contrast to find.
        let image = Image::filled(format.raster_width as usize, format.raster_height as usize, 0);
        let tracker = Tracker::new(TrackerMode::ANALOG);
        let result = tracker.track(&image, &format);
        assert!(matches!(result, Err(BoxingError::BorderTrackingError(_))));
    }
}
