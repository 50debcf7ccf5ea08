use boxing_core::{FrameFormat, Image, PointF};

use crate::mapper::CoordinateMapper;

/// Tracked centre-line points for the four reference bars, in image space.
#[derive(Debug, Clone)]
pub struct ReferenceBars {
    pub top: Vec<PointF>,
    pub bottom: Vec<PointF>,
    pub left: Vec<PointF>,
    pub right: Vec<PointF>,
}

const SYNC_PATTERN: [u8; 9] = [1, 0, 1, 0, 0, 0, 1, 0, 1];

/// Refines a candidate centre-line point by searching a small neighbourhood
/// perpendicular to the bar for the centre of mass of dark pixels; falls
/// back to the candidate itself when the neighbourhood has no contrast.
fn refine_point(image: &Image, candidate: PointF, search_radius: i32) -> PointF {
    let cx = candidate.x.round() as i32;
    let cy = candidate.y.round() as i32;

    let mut sum_x = 0f64;
    let mut sum_y = 0f64;
    let mut weight = 0f64;

    for dy in -search_radius..=search_radius {
        for dx in -search_radius..=search_radius {
            let v = image.pixel_clamped((cx + dx) as isize, (cy + dy) as isize) as f64;
            let w = 255.0 - v;
            sum_x += (cx + dx) as f64 * w;
            sum_y += (cy + dy) as f64 * w;
            weight += w;
        }
    }

    if weight <= 0.0 {
        return candidate;
    }
    PointF::new(sum_x / weight, sum_y / weight)
}

fn walk_bar(
    image: &Image,
    mapper: &CoordinateMapper,
    start: (f64, f64),
    end: (f64, f64),
    count: usize,
) -> Option<Vec<PointF>> {
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let t = i as f64 / (count - 1).max(1) as f64;
        let px = start.0 + (end.0 - start.0) * t;
        let py = start.1 + (end.1 - start.1) * t;
        let mapped = mapper.map(px, py)?;
        points.push(refine_point(image, mapped, 2));
    }
    Some(points)
}

/// Sync-corrects a tracked bar in place. When `ref_bar_sync_distance > 0`
/// the bar embeds the known 9-symbol pattern at regular intervals; here we
/// quantize each tracked point's local brightness to two levels and patch
/// runs whose quantized value disagrees with the expected pattern phase by
/// synthesising from the nearest agreeing neighbours, per the three rules:
/// both-ends-synced copies through, one-end-synced linearly extends from
/// the synced slope, and neither-end-synced falls back to the unmodified
/// mapper estimate already in `points`.
fn sync_correct(image: &Image, points: &mut [PointF], sync_distance: u32, avg_rate: f64) {
    if sync_distance == 0 || points.len() < SYNC_PATTERN.len() {
        return;
    }

    let synced: Vec<bool> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let expected = SYNC_PATTERN[i % SYNC_PATTERN.len()];
            let level = image.pixel_clamped(p.x.round() as isize, p.y.round() as isize);
            let bit = if level < 128 { 1 } else { 0 };
            bit == expected
        })
        .collect();

    let max_error = 4.0 * avg_rate;
    let mut i = 0;
    while i < points.len() {
        if synced[i] {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < points.len() && !synced[i] {
            i += 1;
        }
        let run_end = i; // exclusive

        let before = if run_start > 0 { Some(points[run_start - 1]) } else { None };
        let after = if run_end < points.len() { Some(points[run_end]) } else { None };

        match (before, after) {
            (Some(a), Some(b)) => {
                let err = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
                if err <= max_error {
                    for (k, idx) in (run_start..run_end).enumerate() {
                        let t = (k + 1) as f64 / (run_end - run_start + 1) as f64;
                        points[idx] = a.lerp(b, t);
                    }
                }
            }
            (Some(a), None) => {
                if run_start >= 2 {
                    let slope = a.sub(points[run_start - 2]);
                    for (k, idx) in (run_start..run_end).enumerate() {
                        points[idx] = a.add(slope.scale((k + 1) as f64));
                    }
                }
            }
            (None, Some(b)) => {
                if run_end + 1 < points.len() {
                    let slope = points[run_end + 1].sub(b);
                    for (k, idx) in (run_start..run_end).enumerate() {
                        let steps_from_b = (run_end - idx) as f64;
                        points[idx] = b.sub(slope.scale(steps_from_b));
                    }
                }
            }
            (None, None) => {
                // Neither endpoint synced: leave the mapper-derived
                // estimate already in `points` untouched.
            }
        }
    }
}

/// Tracks all four reference bars and applies sync correction to each.
/// Returns `None` only when the mapper cannot place a bar's endpoints
/// (non-finite geometry), which the caller treats as a fatal tracking
/// error.
pub fn track_reference_bars(
    image: &Image,
    format: &FrameFormat,
    mapper: &CoordinateMapper,
) -> Option<ReferenceBars> {
    let print_width = (format.frame_width - format.corner_mark_size) as f64;
    let print_height = (format.frame_height - format.corner_mark_size) as f64;
    let h_count = (format.frame_width / 8).max(4) as usize;
    let v_count = (format.frame_height / 8).max(4) as usize;
    let avg_rate = image.width() as f64 / format.frame_width as f64;

    let mut top = walk_bar(image, mapper, (0.0, 0.0), (print_width, 0.0), h_count)?;
    let mut bottom = walk_bar(image, mapper, (0.0, print_height), (print_width, print_height), h_count)?;
    let mut left = walk_bar(image, mapper, (0.0, 0.0), (0.0, print_height), v_count)?;
    let mut right = walk_bar(image, mapper, (print_width, 0.0), (print_width, print_height), v_count)?;

    sync_correct(image, &mut top, format.ref_bar_sync_distance, avg_rate);
    sync_correct(image, &mut bottom, format.ref_bar_sync_distance, avg_rate);
    sync_correct(image, &mut left, format.ref_bar_sync_distance, avg_rate);
    sync_correct(image, &mut right, format.ref_bar_sync_distance, avg_rate);

    Some(ReferenceBars { top, bottom, left, right })
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

    #[test]
    fn tracks_all_four_bars_on_flat_image() {
        let format = format();
        let image = Image::filled(64, 64, 200);
        let corners = CornerMarks::new(
            Point::new(4, 4),
            Point::new(60, 4),
            Point::new(4, 60),
            Point::new(60, 60),
        );
        let mapper = CoordinateMapper::new(corners, 56.0, 56.0);
        let bars = track_reference_bars(&image, &format, &mapper).unwrap();
        assert!(!bars.top.is_empty());
        assert!(!bars.bottom.is_empty());
        assert!(!bars.left.is_empty());
        assert!(!bars.right.is_empty());
    }

    #[test]
    fn sync_correction_is_a_no_op_when_distance_is_zero() {
        let mut points = vec![PointF::new(0.0, 0.0), PointF::new(1.0, 0.0)];
        let before = points.clone();
        let image = Image::filled(8, 8, 128);
        sync_correct(&image, &mut points, 0, 1.0);
        assert_eq!(points, before);
    }
}
