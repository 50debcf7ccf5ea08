use boxing_core::DecodeStats;

use crate::pipeline::{Stage, StageError};

/// Frame-to-frame striping across `stripe_size` frames. This crate decodes
/// one frame's worth of data per call and carries no state across calls, so
/// it cannot perform the actual cross-frame accumulation a `stripe_size`
/// greater than one requires; a pipeline configured with real striping
/// fails loudly at decode time instead of silently returning wrong data.
/// `stripe_size == 1` is the single-frame case and is a pass-through.
pub struct Striping {
    stripe_size: usize,
    block_size: usize,
}

impl Striping {
    pub fn new(stripe_size: usize, block_size: usize) -> Self {
        assert!(stripe_size >= 1, "stripe size must be at least one frame");
        Self { stripe_size, block_size }
    }

    pub fn stripe_size(&self) -> usize {
        self.stripe_size
    }
}

impl Stage for Striping {
    fn name(&self) -> &str {
        "Striping"
    }

    fn encoded_block_size(&self) -> usize {
        self.block_size
    }

    fn decoded_block_size(&self) -> usize {
        self.block_size
    }

    fn decode(
        &self,
        data: &[u8],
        _erasures: &[bool],
        _stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError> {
        if self.stripe_size > 1 {
            return Err(StageError::ConfigError(format!(
                "Striping stage configured with stripe_size = {}, but this decoder has no \
                 cross-frame buffering; only stripe_size = 1 is supported",
                self.stripe_size
            )));
        }
        Ok(data.to_vec())
    }
}
