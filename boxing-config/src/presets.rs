use boxing_core::{FrameFormat, FrameType};

use crate::error::ConfigError;

/// Built-in `FrameFormat` values for the named presets the test fixtures
/// and scenario tests exercise, so callers can select a format by name
/// without needing an external config file on disk.
pub fn named_preset(name: &str) -> Result<FrameFormat, ConfigError> {
    match name {
        "4kv7" => Ok(data_frame(name, 7)),
        "4kv8" => Ok(data_frame(name, 8)),
        "4kv9" => Ok(data_frame(name, 9)),
        "4kv10" => Ok(data_frame(name, 10)),
        "4k-controlframe-v1" => Ok(control_frame(name, 1)),
        "4k-controlframe-v2" => Ok(control_frame(name, 2)),
        "4k-controlframe-v3" => Ok(control_frame(name, 3)),
        "4k-controlframe-v4" => Ok(control_frame(name, 4)),
        "4k-controlframe-v5" => Ok(control_frame(name, 5)),
        "4k-controlframe-v6" => Ok(control_frame(name, 6)),
        "4k-controlframe-v7" => Ok(control_frame(name, 7)),
        _ => Err(ConfigError::UnknownFormat(name.to_string())),
    }
}

fn data_frame(name: &str, version: u32) -> FrameFormat {
    FrameFormat {
        name: name.to_string(),
        frame_type: FrameType::GpfV1_1,
        raster_width: 4096,
        raster_height: 2160,
        frame_width: 4096,
        frame_height: 2160,
        border: 16,
        border_gap: 4,
        corner_mark_size: 64,
        corner_mark_gap: 8,
        tiles_per_column: 8,
        ref_bar_sync_distance: 32,
        ref_bar_sync_offset: 0,
        // Higher version numbers pack more levels per symbol, trading
        // channel margin for capacity.
        max_levels_per_symbol: 1 << (version.min(10) / 2 + 1),
        sync_point_h_distance: 256,
        sync_point_v_distance: 256,
        sync_point_radius: 4,
        sync_point_offset: -1,
        content_rows: 32,
        content_cols: 32,
        metadata_rows: 2,
        metadata_cols: 32,
    }
}

fn control_frame(name: &str, version: u32) -> FrameFormat {
    FrameFormat {
        name: name.to_string(),
        frame_type: FrameType::GpfV1_1,
        raster_width: 1024,
        raster_height: 540,
        frame_width: 1024,
        frame_height: 540,
        border: 8,
        border_gap: 2,
        corner_mark_size: 32,
        corner_mark_gap: 4,
        tiles_per_column: 4,
        ref_bar_sync_distance: 16,
        ref_bar_sync_offset: 0,
        max_levels_per_symbol: 1 << (version.min(7) / 2 + 1),
        sync_point_h_distance: 128,
        sync_point_v_distance: 128,
        sync_point_radius: 2,
        sync_point_offset: -1,
        content_rows: 8,
        content_cols: 8,
        metadata_rows: 2,
        metadata_cols: 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_frame_presets_are_4096_by_2160() {
        for name in ["4kv7", "4kv8", "4kv9", "4kv10"] {
            let format = named_preset(name).unwrap();
            assert_eq!(format.frame_width, 4096);
            assert_eq!(format.frame_height, 2160);
        }
    }

    #[test]
    fn control_frame_presets_are_1024_by_540() {
        for v in 1..=7 {
            let name = format!("4k-controlframe-v{}", v);
            let format = named_preset(&name).unwrap();
            assert_eq!(format.frame_width, 1024);
            assert_eq!(format.frame_height, 540);
        }
    }

    #[test]
    fn unknown_preset_name_is_rejected() {
        assert!(named_preset("does-not-exist").is_err());
    }
}
