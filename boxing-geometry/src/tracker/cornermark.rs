use boxing_core::{CornerMarks, FrameFormat, Image, Point};

const DARK_THRESHOLD: u8 = 128;

/// Thresholded search with projection-based centroid refinement: within a
/// window near the expected corner, find the centroid of pixels at or
/// below `DARK_THRESHOLD` (the corner marks are printed as solid dark
/// squares on a light field). Returns `None` when the window has no
/// contrast at all, which the caller treats as a missing corner.
fn find_corner(image: &Image, window_x: (usize, usize), window_y: (usize, usize)) -> Option<Point> {
    let (x0, x1) = window_x;
    let (y0, y1) = window_y;

    let mut sum_x: u64 = 0;
    let mut sum_y: u64 = 0;
    let mut count: u64 = 0;

    for y in y0..y1.min(image.height()) {
        for x in x0..x1.min(image.width()) {
            if image.pixel(x, y) <= DARK_THRESHOLD {
                sum_x += x as u64;
                sum_y += y as u64;
                count += 1;
            }
        }
    }

    if count == 0 {
        return None;
    }

    Some(Point::new((sum_x / count) as i32, (sum_y / count) as i32))
}

/// Scans the four image corners for the characteristic solid square
/// pattern. Each candidate is validated to lie strictly inside the image.
pub fn search_corners(image: &Image, format: &FrameFormat) -> Option<CornerMarks> {
    let mark = format.corner_mark_size as usize;
    // Search window is twice the nominal mark size, centred on where the
    // mark is expected given the frame format and the image's own extent.
    let window = mark * 2;
    let w = image.width();
    let h = image.height();

    let top_left = find_corner(image, (0, window.min(w)), (0, window.min(h)))?;
    let top_right = find_corner(image, (w.saturating_sub(window), w), (0, window.min(h)))?;
    let bottom_left = find_corner(image, (0, window.min(w)), (h.saturating_sub(window), h))?;
    let bottom_right =
        find_corner(image, (w.saturating_sub(window), w), (h.saturating_sub(window), h))?;

    for p in [top_left, top_right, bottom_left, bottom_right] {
        if p.x < 0 || p.y < 0 || p.x as usize >= w || p.y as usize >= h {
            return None;
        }
    }

    Some(CornerMarks::new(top_left, top_right, bottom_left, bottom_right))
}

/// The corners of a perfect, undistorted raster — used by the
/// `SIMULATED` tracking mode.
pub fn ideal_corners(format: &FrameFormat) -> CornerMarks {
    let half_mark = (format.corner_mark_size / 2) as i32;
    let w = format.frame_width as i32;
    let h = format.frame_height as i32;
    CornerMarks::new(
        Point::new(half_mark, half_mark),
        Point::new(w - half_mark, half_mark),
        Point::new(half_mark, h - half_mark),
        Point::new(w - half_mark, h - half_mark),
    )
}
