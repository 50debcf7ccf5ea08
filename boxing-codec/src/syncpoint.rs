use boxing_core::DecodeStats;

use crate::pipeline::{Stage, StageError};

/// Resolves a possibly-negative configured offset into the auto-offset
/// the reference implementation falls back to: centre the first sync
/// point so the grid is as symmetric as possible.
fn resolve_offset(offset: i32, distance: u32) -> u32 {
    if offset < 0 {
        (distance / 2) % distance.max(1)
    } else {
        offset as u32 % distance.max(1)
    }
}

/// The number of sync points a (cols, rows) grid produces for the given
/// per-axis distance and offset, matching `⌈(cols − offset) / d⌉ · ⌈(rows
/// − offset) / d⌉` (with auto-offset substituted first when negative).
pub fn sync_point_count(
    cols: u32,
    rows: u32,
    h_distance: u32,
    v_distance: u32,
    h_offset: i32,
    v_offset: i32,
) -> usize {
    if h_distance == 0 || v_distance == 0 {
        return 0;
    }
    let h_off = resolve_offset(h_offset, h_distance);
    let v_off = resolve_offset(v_offset, v_distance);
    let cols_count = sync_axis_positions(cols, h_distance, h_off).len();
    let rows_count = sync_axis_positions(rows, v_distance, v_off).len();
    cols_count * rows_count
}

fn sync_axis_positions(extent: u32, distance: u32, offset: u32) -> Vec<u32> {
    let mut positions = Vec::new();
    let mut c = offset;
    while c < extent {
        positions.push(c);
        c += distance;
    }
    positions
}

/// Per-frame foreground/background bit arrays marking which grid
/// positions are sync points, built once per format from (distance,
/// radius, offset). A "symbol tracker" (the `cursor`) walks these in
/// lockstep with the data array during decode.
pub struct SyncGrid {
    cols: usize,
    rows: usize,
    is_sync: Vec<bool>,
}

impl SyncGrid {
    pub fn new(cols: u32, rows: u32, h_distance: u32, v_distance: u32, radius: u32, h_offset: i32, v_offset: i32) -> Self {
        let cols = cols as usize;
        let rows = rows as usize;
        let mut is_sync = vec![false; cols * rows];

        if h_distance > 0 && v_distance > 0 {
            let h_off = resolve_offset(h_offset, h_distance);
            let v_off = resolve_offset(v_offset, v_distance);
            let sync_cols = sync_axis_positions(cols as u32, h_distance, h_off);
            let sync_rows = sync_axis_positions(rows as u32, v_distance, v_off);
            let r = radius as i64;

            for &sr in &sync_rows {
                for &sc in &sync_cols {
                    for dr in -r..=r {
                        for dc in -r..=r {
                            let row = sr as i64 + dr;
                            let col = sc as i64 + dc;
                            if row >= 0 && col >= 0 && (row as usize) < rows && (col as usize) < cols {
                                is_sync[row as usize * cols + col as usize] = true;
                            }
                        }
                    }
                }
            }
        }

        Self { cols, rows, is_sync }
    }

    pub fn len(&self) -> usize {
        self.cols * self.rows
    }
}

/// Removes sync-point positions from the encoded stream: the inverse of
/// the encoder's insertion. A cursor walks the sync grid and the input in
/// lockstep; non-sync positions are copied through, sync positions are
/// skipped.
pub struct SyncPointInserter {
    grid: SyncGrid,
}

impl SyncPointInserter {
    pub fn new(grid: SyncGrid) -> Self {
        Self { grid }
    }

    fn data_block_size(&self) -> usize {
        self.grid.len() - self.grid.is_sync.iter().filter(|&&s| s).count()
    }
}

impl Stage for SyncPointInserter {
    fn name(&self) -> &str {
        "SyncPointInserter"
    }

    fn encoded_block_size(&self) -> usize {
        self.grid.len()
    }

    fn decoded_block_size(&self) -> usize {
        self.data_block_size()
    }

    fn decode(
        &self,
        data: &[u8],
        _erasures: &[bool],
        _stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError> {
        if data.len() != self.grid.len() {
            return Err(StageError::ConfigError(format!(
                "SyncPointInserter expected {} bytes, got {}",
                self.grid.len(),
                data.len()
            )));
        }
        let out = data
            .iter()
            .zip(self.grid.is_sync.iter())
            .filter_map(|(&b, &sync)| if sync { None } else { Some(b) })
            .collect();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_point_count_matches_ceiling_formula() {
        let cols = 10;
        let rows = 10;
        let h_distance = 4;
        let v_distance = 4;
        let count = sync_point_count(cols, rows, h_distance, v_distance, 0, 0);
        let expected_cols = ((cols - 0) as f64 / h_distance as f64).ceil() as usize;
        let expected_rows = ((rows - 0) as f64 / v_distance as f64).ceil() as usize;
        assert_eq!(count, expected_cols * expected_rows);
    }

    #[test]
    fn decode_strips_exactly_the_flagged_positions() {
        let grid = SyncGrid::new(8, 1, 2, 1, 0, 0, 0);
        let stage = SyncPointInserter::new(grid);
        let data: Vec<u8> = (0..8).collect();
        let mut stats = DecodeStats::new();
        let out = stage.decode(&data, &[], &mut stats).unwrap();
        assert_eq!(out.len(), stage.decoded_block_size());
        assert!(out.len() < data.len());
    }

    #[test]
    fn zero_distance_marks_nothing_as_sync() {
        let grid = SyncGrid::new(4, 4, 0, 0, 1, 0, 0);
        let stage = SyncPointInserter::new(grid);
        let data: Vec<u8> = (0..16).collect();
        let mut stats = DecodeStats::new();
        let out = stage.decode(&data, &[], &mut stats).unwrap();
        assert_eq!(out, data);
    }
}
