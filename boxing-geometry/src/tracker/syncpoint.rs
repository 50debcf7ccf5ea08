use boxing_core::{FrameFormat, Image, Matrix, PointF};

/// Finds the centre of mass of dark pixels within `radius` of `center`,
/// falling back to `center` when the neighbourhood has no contrast.
fn refine_in_radius(image: &Image, center: PointF, radius: i32) -> PointF {
    let cx = center.x.round() as i32;
    let cy = center.y.round() as i32;

    let mut sum_x = 0f64;
    let mut sum_y = 0f64;
    let mut weight = 0f64;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let v = image.pixel_clamped((cx + dx) as isize, (cy + dy) as isize) as f64;
            let w = 255.0 - v;
            sum_x += (cx + dx) as f64 * w;
            sum_y += (cy + dy) as f64 * w;
            weight += w;
        }
    }

    if weight <= 0.0 {
        return center;
    }
    PointF::new(sum_x / weight, sum_y / weight)
}

/// Mean and variance of the offsets (refined minus estimate) in a 5x5
/// neighbourhood of `(row, col)`, clamped to the matrix bounds.
fn neighbourhood_stats(
    offsets: &Matrix<PointF>,
    row: usize,
    col: usize,
) -> (PointF, f64) {
    let r0 = row.saturating_sub(2);
    let r1 = (row + 2).min(offsets.height() - 1);
    let c0 = col.saturating_sub(2);
    let c1 = (col + 2).min(offsets.width() - 1);

    let mut sum = PointF::new(0.0, 0.0);
    let mut n = 0f64;
    for r in r0..=r1 {
        for c in c0..=c1 {
            let o = *offsets.get(r, c);
            sum = sum.add(o);
            n += 1.0;
        }
    }
    let mean = sum.scale(1.0 / n);

    let mut var = 0f64;
    for r in r0..=r1 {
        for c in c0..=c1 {
            let o = *offsets.get(r, c);
            let d = o.sub(mean);
            var += d.x * d.x + d.y * d.y;
        }
    }
    (mean, var / n)
}

/// Refines the content grid's sample locations using the frame's embedded
/// sync points: each cell is nudged towards the local centre of mass
/// within `sync_point_radius`, outliers (offsets whose squared distance
/// from their 5x5 neighbourhood mean exceeds three times the
/// neighbourhood variance) are replaced by the neighbourhood mean offset,
/// and the corrected offsets are then bilinearly blended across 2x2
/// blocks so the correction varies smoothly rather than cell-by-cell.
/// Returns `false` (a degrade, not a failure) when the matrix is too
/// small to form a neighbourhood.
pub fn refine_sync_points(
    image: &Image,
    format: &FrameFormat,
    matrix: &mut Matrix<PointF>,
) -> bool {
    if matrix.width() < 2 || matrix.height() < 2 {
        return false;
    }
    if format.sync_point_radius == 0 {
        return false;
    }

    let radius = format.sync_point_radius as i32;
    let width = matrix.width();
    let height = matrix.height();

    let mut offsets: Matrix<PointF> = Matrix::new(width, height);
    for r in 0..height {
        for c in 0..width {
            let estimate = *matrix.get(r, c);
            let refined = refine_in_radius(image, estimate, radius);
            offsets.set(r, c, refined.sub(estimate));
        }
    }

    let mut corrected: Matrix<PointF> = offsets.clone();
    for r in 0..height {
        for c in 0..width {
            let (mean, var) = neighbourhood_stats(&offsets, r, c);
            let o = *offsets.get(r, c);
            let d = o.sub(mean);
            let dist2 = d.x * d.x + d.y * d.y;
            if var > 0.0 && dist2 > 3.0 * var {
                corrected.set(r, c, mean);
            }
        }
    }

    // Bilinear blend across 2x2 blocks: each cell's final offset is the
    // average of itself and its immediate right/bottom/diagonal neighbour
    // where present, smoothing cell-to-cell jitter in the correction.
    for r in 0..height {
        for c in 0..width {
            let mut sum = *corrected.get(r, c);
            let mut n = 1f64;
            if c + 1 < width {
                sum = sum.add(*corrected.get(r, c + 1));
                n += 1.0;
            }
            if r + 1 < height {
                sum = sum.add(*corrected.get(r + 1, c));
                n += 1.0;
            }
            if r + 1 < height && c + 1 < width {
                sum = sum.add(*corrected.get(r + 1, c + 1));
                n += 1.0;
            }
            let blended = sum.scale(1.0 / n);
            let cell = matrix.get_mut(r, c);
            let candidate = cell.add(blended);
            if candidate.is_finite() {
                *cell = candidate;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxing_core::FrameType;

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

    fn grid(n: usize) -> Matrix<PointF> {
        let mut m: Matrix<PointF> = Matrix::new(n, n);
        for r in 0..n {
            for c in 0..n {
                m.set(r, c, PointF::new(8.0 + c as f64 * 12.0, 8.0 + r as f64 * 12.0));
            }
        }
        m
    }

    #[test]
    fn flat_image_leaves_grid_finite() {
        let image = Image::filled(64, 64, 200);
        let mut matrix = grid(4);
        assert!(refine_sync_points(&image, &format(), &mut matrix));
        for p in matrix.as_slice() {
            assert!(p.is_finite());
        }
    }

    #[test]
    fn too_small_matrix_degrades_without_panicking() {
        let image = Image::filled(64, 64, 200);
        let mut matrix: Matrix<PointF> = Matrix::new(1, 1);
        assert!(!refine_sync_points(&image, &format(), &mut matrix));
    }

    #[test]
    fn zero_radius_is_a_no_op_degrade() {
        let image = Image::filled(64, 64, 200);
        let mut fmt = format();
        fmt.sync_point_radius = 0;
        let mut matrix = grid(4);
        let before = matrix.as_slice().to_vec();
        assert!(!refine_sync_points(&image, &fmt, &mut matrix));
        assert_eq!(matrix.as_slice(), before.as_slice());
    }
}
