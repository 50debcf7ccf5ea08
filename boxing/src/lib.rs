#![allow(dead_code)]

//! The top-level `Unboxer`: ties the geometry tracker, the sampler family,
//! the demodulator, and the configured codec pipelines together into the
//! single decode entry point the CLI (and any other caller) drives.

mod error;
mod metadata;
mod pipeline_builder;

pub use error::{ResultCode, UnboxError};
pub use metadata::decode_metadata;
pub use pipeline_builder::build_pipeline;

use log::{debug, info, warn};

use boxing_codec::{Demodulator, PamDemapper};
use boxing_config::PipelineSpec;
use boxing_core::{DecodeStats, FrameFormat, Image, MetadataItem};
use boxing_geometry::{AreaSampler, BiquadraticSampler, Sampler, Tracker, TrackerMode};

/// Everything a successful decode produces.
#[derive(Debug, Clone)]
pub struct UnboxResult {
    /// The recovered content payload, after every content-pipeline stage
    /// (including its trailing CRC check) has run.
    pub content: Vec<u8>,
    /// The decoded metadata items, in strip order.
    pub metadata: Vec<MetadataItem>,
    pub stats: DecodeStats,
    /// `true` if the tracker had to skip an optional correction step.
    pub degraded: bool,
}

/// Called after each named stage of the decode; returning `false` aborts
/// the decode with `ProcessCallbackAbort`, matching the reference
/// implementation's caller-driven cancellation.
pub type ProgressCallback<'a> = dyn Fn(&str) -> bool + 'a;

/// The top-level decoder: a `FrameFormat` plus the resolved content and
/// metadata coding pipelines, bound to a tracker mode and two sampling
/// kernels. Metadata and calibration symbols are sampled with a box-filter
/// (`AreaSampler`); content and reference bars default to the biquadratic
/// kernel, per the two regions' differing printed footprints.
pub struct Unboxer<'a> {
    format: FrameFormat,
    spec: PipelineSpec,
    tracker: Tracker,
    metadata_sampler: Box<dyn Sampler>,
    content_sampler: Box<dyn Sampler>,
    on_progress: Option<Box<ProgressCallback<'a>>>,
}

impl<'a> Unboxer<'a> {
    pub fn new(format: FrameFormat, spec: PipelineSpec) -> Self {
        Self::with_samplers(
            format,
            spec,
            TrackerMode::ANALOG,
            Box::new(AreaSampler::new(1)),
            Box::new(BiquadraticSampler),
        )
    }

    pub fn with_samplers(
        format: FrameFormat,
        spec: PipelineSpec,
        mode: TrackerMode,
        metadata_sampler: Box<dyn Sampler>,
        content_sampler: Box<dyn Sampler>,
    ) -> Self {
        Self {
            format,
            spec,
            tracker: Tracker::new(mode),
            metadata_sampler,
            content_sampler,
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, callback: impl Fn(&str) -> bool + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    fn checkpoint(&self, stage: &str) -> Result<(), UnboxError> {
        if let Some(cb) = &self.on_progress {
            if !cb(stage) {
                return Err(UnboxError::ProcessCallbackAbort);
            }
        }
        Ok(())
    }

    /// Demodulates one sampled symbol image into the byte stream its
    /// coding pipeline expects: a 32-level alphabet is the 2D-PAM
    /// constellation (signed LLR bytes, one group of five per pixel pair);
    /// any other alphabet size is plain per-symbol quantization (one byte
    /// per symbol).
    fn demodulate(&self, image: &Image) -> Vec<u8> {
        let demod = Demodulator::new(image.width().max(1), image.height().max(1), self.alphabet());
        if self.format.max_levels_per_symbol == 32 {
            let demapper = PamDemapper::new();
            demod
                .demap_2d_pam(image, &demapper)
                .into_iter()
                .map(|llr| llr as u8)
                .collect()
        } else {
            demod.quantize_pam(image)
        }
    }

    fn alphabet(&self) -> usize {
        (self.format.max_levels_per_symbol as usize).max(2)
    }

    /// Runs the full decode: geometry tracking, sampling, demodulation,
    /// metadata pipeline + parsing (resolving any auto-keyed cipher), then
    /// the content pipeline.
    pub fn decode(&self, image: &Image) -> Result<UnboxResult, UnboxError> {
        let mut stats = DecodeStats::new();

        self.checkpoint("tracking")?;
        let tracker_out = self.tracker.track(image, &self.format)?;
        debug!(
            "unboxer: tracked frame, content grid {}x{}, degraded = {}",
            tracker_out.content_locations.width(),
            tracker_out.content_locations.height(),
            tracker_out.degraded
        );

        self.checkpoint("sampling")?;
        let metadata_image = self.metadata_sampler.sample(image, &tracker_out.metadata_locations);
        let content_image = self.content_sampler.sample(image, &tracker_out.content_locations);

        self.checkpoint("metadata-decode")?;
        let metadata_bytes = self.demodulate(&metadata_image);
        let metadata_pipeline =
            build_pipeline(&self.format, &self.spec, &self.spec.metadata_coding_scheme, None)?;
        let metadata_recovered = metadata_pipeline.decode(&metadata_bytes, &mut stats)?;
        let metadata_items = decode_metadata(&metadata_recovered)?;

        let cipher_key = metadata_items.iter().find_map(|item| match item {
            MetadataItem::CipherKey(key) => Some(*key),
            _ => None,
        });
        if cipher_key.is_some() {
            debug!("unboxer: resolved auto-keyed cipher from metadata");
        }

        self.checkpoint("content-decode")?;
        let content_bytes = self.demodulate(&content_image);
        let content_pipeline =
            build_pipeline(&self.format, &self.spec, &self.spec.data_coding_scheme, cipher_key)?;
        let content_recovered = content_pipeline.decode(&content_bytes, &mut stats)?;

        if stats.unresolved_errors > 0 {
            warn!(
                "unboxer: {} unresolved errors remained after decode",
                stats.unresolved_errors
            );
        }
        info!(
            "unboxer: decode complete, {} resolved / {} unresolved errors",
            stats.resolved_errors, stats.unresolved_errors
        );

        Ok(UnboxResult {
            content: content_recovered,
            metadata: metadata_items,
            stats,
            degraded: tracker_out.degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxing_config::{named_preset, RawConfig};
    use boxing_core::FrameType;
    use boxing_geometry::BilinearSampler;

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

    fn tiny_spec() -> PipelineSpec {
        let config = RawConfig::parse(
            "[CodecDispatcher]\nDataCodingScheme = CRC32\nMetadataCodingScheme = CRC32\n\
             [CRC32]\nvariant = crc32\n",
        )
        .unwrap();
        boxing_config::parse_pipeline_spec(&config).unwrap()
    }

    #[test]
    fn simulated_mode_decode_runs_end_to_end_without_panicking() {
        let format = tiny_format();
        let image = Image::filled(format.raster_width as usize, format.raster_height as usize, 128);
        let unboxer = Unboxer::with_samplers(
            format,
            tiny_spec(),
            TrackerMode::SIMULATED,
            Box::new(BilinearSampler),
            Box::new(BilinearSampler),
        );
        // A flat image has no real CRC-bearing payload; the CRC stage is
        // expected to reject it, but the pipeline up to that point must not
        // panic on a degenerate (but validly shaped) frame.
        let _ = unboxer.decode(&image);
    }

    #[test]
    fn abort_callback_stops_before_tracking() {
        let format = tiny_format();
        let image = Image::filled(format.raster_width as usize, format.raster_height as usize, 128);
        let unboxer = Unboxer::with_samplers(
            format,
            tiny_spec(),
            TrackerMode::SIMULATED,
            Box::new(BilinearSampler),
            Box::new(BilinearSampler),
        )
        .on_progress(|_| false);
        assert!(matches!(unboxer.decode(&image), Err(UnboxError::ProcessCallbackAbort)));
    }

    #[test]
    fn named_preset_builds_a_real_format() {
        let format = named_preset("4kv7").unwrap();
        assert_eq!(format.frame_width, 4096);
    }
}
