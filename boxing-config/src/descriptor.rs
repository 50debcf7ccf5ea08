use std::collections::HashMap;

use boxing_core::{FrameFormat, FrameType};

use crate::error::ConfigError;
use crate::map::RawConfig;

/// Per-stage configuration, keyed by the stage name as it appears in the
/// pipeline's coding scheme list (e.g. `ReedSolomon_outer`).
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    pub codec: String,
    pub params: HashMap<String, String>,
}

impl StageConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

/// The resolved stage ordering and per-stage configuration for a frame
/// format's content and metadata pipelines.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub symbol_alignment: u32,
    pub data_coding_scheme: Vec<String>,
    pub metadata_coding_scheme: Vec<String>,
    pub stages: HashMap<String, StageConfig>,
}

impl PipelineSpec {
    pub fn stage_config(&self, name: &str) -> Result<&StageConfig, ConfigError> {
        self.stages
            .get(name)
            .ok_or_else(|| ConfigError::UnknownStage(name.to_string()))
    }
}

/// Parses `[FrameFormat]`/`[FrameRaster]` keys into a `boxing_core::FrameFormat`.
/// The grid-dimension fields boxing-core added beyond the configuration
/// groups listed in the external interface are read from an extra,
/// optional `[FrameGrid]` section; when absent, `content_rows`/
/// `content_cols` fall back to `tiles_per_column` directly (not squared),
/// `metadata_cols` likewise, and `metadata_rows` falls back to `1`. Named
/// presets set these fields explicitly rather than relying on the
/// fallback.
pub fn parse_frame_format(config: &RawConfig) -> Result<FrameFormat, ConfigError> {
    let name = config.get("FormatInfo", "name")?.to_string();
    let frame_type = match config.get("FrameFormat", "type")? {
        "GPFv1.0" => FrameType::GpfV1_0,
        "GPFv1.1" => FrameType::GpfV1_1,
        other => {
            return Err(ConfigError::Parse {
                line: 0,
                message: format!("unknown FrameFormat.type '{}'", other),
            })
        }
    };

    let raster_width = config.get_u32("FrameRaster", "width")?;
    let raster_height = config.get_u32("FrameRaster", "height")?;
    let frame_width = config.get_u32("FrameFormat", "width")?;
    let frame_height = config.get_u32("FrameFormat", "height")?;
    let border = config.get_u32("FrameFormat", "border")?;
    let border_gap = config.get_u32("FrameFormat", "borderGap")?;
    let corner_mark_size = config.get_u32("FrameFormat", "cornerMarkSize")?;
    let corner_mark_gap = config.get_u32("FrameFormat", "cornerMarkGap")?;
    let tiles_per_column = config.get_u32("FrameFormat", "tilesPerColumn")?;
    let ref_bar_sync_distance = config.get_u32("FrameFormat", "refBarSyncDistance")?;
    let ref_bar_sync_offset = config.get_i32("FrameFormat", "refBarSyncOffset")?;
    let max_levels_per_symbol = config.get_u32("FrameFormat", "maxLevelsPerSymbol")?;

    let sync_point_h_distance = config.get_u32("SyncPoint", "hDistance").unwrap_or(0);
    let sync_point_v_distance = config.get_u32("SyncPoint", "vDistance").unwrap_or(0);
    let sync_point_radius = config.get_u32("SyncPoint", "radius").unwrap_or(0);
    let sync_point_offset = config.get_i32("SyncPoint", "offset").unwrap_or(-1);

    let content_rows = config
        .get_u32("FrameGrid", "contentRows")
        .unwrap_or(tiles_per_column);
    let content_cols = config
        .get_u32("FrameGrid", "contentCols")
        .unwrap_or(tiles_per_column);
    let metadata_rows = config.get_u32("FrameGrid", "metadataRows").unwrap_or(1);
    let metadata_cols = config.get_u32("FrameGrid", "metadataCols").unwrap_or(tiles_per_column);

    Ok(FrameFormat {
        name,
        frame_type,
        raster_width,
        raster_height,
        frame_width,
        frame_height,
        border,
        border_gap,
        corner_mark_size,
        corner_mark_gap,
        tiles_per_column,
        ref_bar_sync_distance,
        ref_bar_sync_offset,
        max_levels_per_symbol,
        sync_point_h_distance,
        sync_point_v_distance,
        sync_point_radius,
        sync_point_offset,
        content_rows,
        content_cols,
        metadata_rows,
        metadata_cols,
    })
}

fn split_scheme(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Parses `[CodecDispatcher]` and every `[<stageName>]` section it
/// references into a `PipelineSpec`. Unrecognised required keys fail
/// with `CONFIG_ERROR`; stage sections not referenced by either scheme
/// are ignored.
pub fn parse_pipeline_spec(config: &RawConfig) -> Result<PipelineSpec, ConfigError> {
    let symbol_alignment = config.get_u32("CodecDispatcher", "symbolAlignment").unwrap_or(8);
    let data_coding_scheme = split_scheme(config.get("CodecDispatcher", "DataCodingScheme")?);
    let metadata_coding_scheme = split_scheme(config.get("CodecDispatcher", "MetadataCodingScheme")?);

    let mut stages = HashMap::new();
    for stage_name in data_coding_scheme.iter().chain(metadata_coding_scheme.iter()) {
        let codec = config.get(stage_name, "codec").unwrap_or(stage_name).to_string();
        let params = raw_section_params(config, stage_name);
        stages.insert(stage_name.clone(), StageConfig { codec, params });
    }

    Ok(PipelineSpec {
        symbol_alignment,
        data_coding_scheme,
        metadata_coding_scheme,
        stages,
    })
}

/// Reads every key under a stage's own section, independent of whether
/// each is individually "required" — stage construction validates which
/// keys it actually needs.
fn raw_section_params(config: &RawConfig, section: &str) -> HashMap<String, String> {
    // RawConfig intentionally doesn't expose raw section iteration to
    // keep its surface small; individual known keys are read on demand
    // by each stage's own constructor via `StageConfig::get`.
    let mut params = HashMap::new();
    for key in [
        "codec",
        "headerSize",
        "payloadSize",
        "byteParityNumber",
        "messageSize",
        "distance",
        "interleavingType",
        "symbolType",
        "stripeSize",
        "blockSize",
        "key",
        "bitsPerPixel",
        "symbolsPerBlock",
        "variant",
        "seed",
        "iterations",
        "parityBits",
    ] {
        if let Ok(v) = config.get(section, key) {
            params.insert(key.to_string(), v.to_string());
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawConfig {
        RawConfig::parse(
            "[FormatInfo]\nname = test\n\
             [FrameFormat]\ntype = GPFv1.1\nwidth = 64\nheight = 64\nborder = 2\nborderGap = 1\ncornerMarkSize = 8\ncornerMarkGap = 1\ntilesPerColumn = 2\nrefBarSyncDistance = 0\nrefBarSyncOffset = 0\nmaxLevelsPerSymbol = 4\n\
             [FrameRaster]\nwidth = 64\nheight = 64\n\
             [CodecDispatcher]\nDataCodingScheme = PacketHeader, CRC32, ReedSolomon_outer\nMetadataCodingScheme = CRC32\n\
             [ReedSolomon_outer]\nbyteParityNumber = 8\nmessageSize = 24\n",
        )
        .unwrap()
    }

    #[test]
    fn parses_frame_format_fields() {
        let format = parse_frame_format(&sample()).unwrap();
        assert_eq!(format.name, "test");
        assert_eq!(format.frame_width, 64);
        assert_eq!(format.max_levels_per_symbol, 4);
    }

    #[test]
    fn parses_pipeline_stage_order_and_params() {
        let spec = parse_pipeline_spec(&sample()).unwrap();
        assert_eq!(spec.data_coding_scheme, vec!["PacketHeader", "CRC32", "ReedSolomon_outer"]);
        let rs = spec.stage_config("ReedSolomon_outer").unwrap();
        assert_eq!(rs.get_u32("byteParityNumber"), Some(8));
    }

    #[test]
    fn unknown_stage_lookup_is_a_config_error() {
        let spec = parse_pipeline_spec(&sample()).unwrap();
        assert!(matches!(spec.stage_config("NoSuchStage"), Err(ConfigError::UnknownStage(_))));
    }
}
