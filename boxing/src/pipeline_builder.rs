use boxing_codec::{
    Cipher, Crc32, Crc32Variant, Crc64, Distance, Interleaver, InterleavingType, Ldpc, Modulator,
    PacketHeader, ParityCheckMatrix, Pipeline, ReedSolomon, Stage, Striping, SyncGrid, SyncPointInserter,
    SymbolType,
};
use boxing_config::{PipelineSpec, StageConfig};
use boxing_core::FrameFormat;

use crate::error::UnboxError;

fn require_u32(cfg: &StageConfig, key: &str) -> Result<u32, UnboxError> {
    cfg.get_u32(key)
        .ok_or_else(|| UnboxError::ConfigError(format!("missing or invalid '{}' parameter", key)))
}

fn build_stage(
    name: &str,
    format: &FrameFormat,
    cfg: &StageConfig,
    cipher_key: Option<u32>,
) -> Result<Box<dyn Stage>, UnboxError> {
    match cfg.codec.as_str() {
        "PacketHeader" => {
            let header_size = require_u32(cfg, "headerSize")? as usize;
            let payload_size = require_u32(cfg, "payloadSize")? as usize;
            Ok(Box::new(PacketHeader::new(header_size, payload_size)))
        }
        "CRC32" => {
            let variant = match cfg.get("variant").unwrap_or("crc32") {
                "crc32" => Crc32Variant::Standard,
                "crc32c" => Crc32Variant::Castagnoli,
                "crc32k" => Crc32Variant::Koopman,
                other => {
                    return Err(UnboxError::ConfigError(format!("unknown CRC32 variant '{}'", other)))
                }
            };
            let stage = match cfg.get_u32("seed") {
                Some(seed) => Crc32::new(variant, seed),
                None => Crc32::with_default_seed(variant),
            };
            Ok(Box::new(stage))
        }
        "CRC64" => {
            let stage = match cfg.get("seed").and_then(|s| s.parse::<u64>().ok()) {
                Some(seed) => Crc64::new(seed),
                None => Crc64::with_default_seed(),
            };
            Ok(Box::new(stage))
        }
        "ReedSolomon" => {
            let parity = require_u32(cfg, "byteParityNumber")? as usize;
            let message = require_u32(cfg, "messageSize")? as usize;
            Ok(Box::new(ReedSolomon::new(message + parity, message)))
        }
        "Interleaving" => {
            let distance = require_u32(cfg, "distance")? as usize;
            let block_size = require_u32(cfg, "blockSize")? as usize;
            let interleaving_type = match cfg.get("interleavingType").unwrap_or("block") {
                "block" => InterleavingType::Block,
                "frame" => InterleavingType::Frame,
                other => {
                    return Err(UnboxError::ConfigError(format!("unknown interleaving type '{}'", other)))
                }
            };
            let symbol_type = match cfg.get("symbolType").unwrap_or("byte") {
                "byte" => SymbolType::Byte,
                "bit" => SymbolType::Bit,
                other => return Err(UnboxError::ConfigError(format!("unknown symbol type '{}'", other))),
            };
            Ok(Box::new(Interleaver::new(Distance(distance), block_size, interleaving_type, symbol_type)))
        }
        "Striping" => {
            let stripe_size = require_u32(cfg, "stripeSize")? as usize;
            let block_size = require_u32(cfg, "blockSize")? as usize;
            Ok(Box::new(Striping::new(stripe_size, block_size)))
        }
        "Cipher" => {
            let block_size = require_u32(cfg, "blockSize")? as usize;
            let key = match cfg.get("key") {
                Some("auto") | None => cipher_key.ok_or_else(|| {
                    UnboxError::ConfigError(
                        "Cipher stage with key = auto needs CipherKey from a decoded metadata item".into(),
                    )
                })?,
                Some(k) => k.parse::<u32>().map_err(|_| {
                    UnboxError::ConfigError(format!("invalid Cipher key '{}'", k))
                })?,
            };
            Ok(Box::new(Cipher::new(key, block_size)))
        }
        "Modulator" => {
            let bits_per_pixel = require_u32(cfg, "bitsPerPixel")?;
            let symbols_per_block = require_u32(cfg, "symbolsPerBlock")? as usize;
            Ok(Box::new(Modulator::new(bits_per_pixel, symbols_per_block)))
        }
        "SyncPointInserter" => {
            let grid = SyncGrid::new(
                format.content_cols,
                format.content_rows,
                format.sync_point_h_distance,
                format.sync_point_v_distance,
                format.sync_point_radius,
                format.sync_point_offset,
                format.sync_point_offset,
            );
            Ok(Box::new(SyncPointInserter::new(grid)))
        }
        "LDPC" => {
            let message_size = require_u32(cfg, "messageSize")? as usize;
            let parity_bits = require_u32(cfg, "parityBits")? as usize;
            let seed = cfg.get("seed").and_then(|s| s.parse::<u64>().ok()).unwrap_or(1);
            let iterations = cfg.get_u32("iterations").unwrap_or(25) as usize;
            let matrix = ParityCheckMatrix::with_seed(message_size, parity_bits, seed);
            Ok(Box::new(Ldpc::with_iterations(matrix, iterations)))
        }
        other => Err(UnboxError::ConfigError(format!("unrecognised codec stage type '{}' for '{}'", other, name))),
    }
}

/// Builds a `Pipeline` from a named stage order (`DataCodingScheme` or
/// `MetadataCodingScheme`), resolving each name's own section through
/// `spec`. `cipher_key` supplies the key for any `Cipher` stage configured
/// with `key = auto`; the metadata pipeline (which never itself carries an
/// auto-keyed cipher) is built with `None`.
pub fn build_pipeline(
    format: &FrameFormat,
    spec: &PipelineSpec,
    scheme: &[String],
    cipher_key: Option<u32>,
) -> Result<Pipeline, UnboxError> {
    let mut stages = Vec::with_capacity(scheme.len());
    for name in scheme {
        let cfg = spec.stage_config(name)?;
        stages.push(build_stage(name, format, cfg, cipher_key)?);
    }
    Pipeline::new(stages).map_err(UnboxError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxing_config::{RawConfig, parse_frame_format, parse_pipeline_spec};

    fn sample() -> (FrameFormat, PipelineSpec) {
        let config = RawConfig::parse(
            "[FormatInfo]\nname = test\n\
             [FrameFormat]\ntype = GPFv1.1\nwidth = 64\nheight = 64\nborder = 2\nborderGap = 1\ncornerMarkSize = 8\ncornerMarkGap = 1\ntilesPerColumn = 2\nrefBarSyncDistance = 0\nrefBarSyncOffset = 0\nmaxLevelsPerSymbol = 4\n\
             [FrameRaster]\nwidth = 64\nheight = 64\n\
             [CodecDispatcher]\nDataCodingScheme = PacketHeader, CRC32\nMetadataCodingScheme = CRC32\n\
             [PacketHeader]\nheaderSize = 4\npayloadSize = 28\n\
             [CRC32]\nvariant = crc32\n",
        )
        .unwrap();
        (parse_frame_format(&config).unwrap(), parse_pipeline_spec(&config).unwrap())
    }

    #[test]
    fn builds_a_pipeline_from_config() {
        let (format, spec) = sample();
        let pipeline = build_pipeline(&format, &spec, &spec.data_coding_scheme, None).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["PacketHeader", "CRC32"]);
    }

    #[test]
    fn unknown_stage_in_scheme_fails() {
        let (format, spec) = sample();
        let scheme = vec!["NoSuchStage".to_string()];
        assert!(build_pipeline(&format, &spec, &scheme, None).is_err());
    }
}
