use std::error;
use std::fmt;

use boxing_core::DecodeStats;
use log::{debug, warn};

/// A stage's contribution to a failed decode. Mirrors the taxonomy the
/// unboxer translates into a `BoxingError` once the pipeline returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// A FEC stage exhausted its correction capacity.
    DataDecodeError(String),
    /// A CRC stage's recomputed value disagreed with the stored one.
    CrcMismatch,
    /// Block-size accounting disagreed between adjacent stages.
    ConfigError(String),
}

impl error::Error for StageError {}
impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DataDecodeError(msg) => write!(f, "data decode error: {}", msg),
            Self::CrcMismatch => write!(f, "crc mismatch"),
            Self::ConfigError(msg) => write!(f, "pipeline config error: {}", msg),
        }
    }
}

/// One stage of the reversible codec pipeline. Every stage describes its
/// own block-size contract so the dispatcher can validate adjacency
/// before the first decode ever runs.
pub trait Stage {
    fn name(&self) -> &str;

    fn encoded_block_size(&self) -> usize;
    fn decoded_block_size(&self) -> usize;

    /// `true` for stages whose `decode` can alter bits to correct errors
    /// (and therefore should feed `DecodeStats`).
    fn is_error_correcting(&self) -> bool {
        false
    }

    /// Decodes one stage's worth of data in place, returning the
    /// recovered bytes. `erasures` marks byte positions the caller already
    /// knows are unreliable (e.g. from an upstream demodulator); stages
    /// that don't use erasure information ignore it.
    fn decode(
        &self,
        data: &[u8],
        erasures: &[bool],
        stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError>;
}

/// An ordered sequence of stages, built in encode order and walked back to
/// front on decode. Block-size contracts between adjacent stages are
/// validated once, at construction.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Builds a pipeline from a list of stages given in *encode* order.
    /// Fails with `ConfigError` if any adjacent pair's block sizes
    /// disagree (stage *i*'s encoded-block-size must equal stage
    /// *i+1*'s decoded-block-size).
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Result<Self, StageError> {
        for pair in stages.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.encoded_block_size() != b.decoded_block_size() {
                return Err(StageError::ConfigError(format!(
                    "stage '{}' encoded_block_size {} does not match stage '{}' decoded_block_size {}",
                    a.name(),
                    a.encoded_block_size(),
                    b.name(),
                    b.decoded_block_size()
                )));
            }
        }
        Ok(Self { stages })
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage back to front (reverse of the encode-order list
    /// the pipeline was constructed from), threading erasure information
    /// and statistics through the whole chain.
    pub fn decode(&self, data: &[u8], stats: &mut DecodeStats) -> Result<Vec<u8>, StageError> {
        let mut buf = data.to_vec();
        let mut erasures = vec![false; buf.len()];

        for stage in self.stages.iter().rev() {
            debug!("codec pipeline: decoding stage '{}'", stage.name());
            match stage.decode(&buf, &erasures, stats) {
                Ok(next) => {
                    erasures = vec![false; next.len()];
                    buf = next;
                }
                Err(e) => {
                    warn!("codec pipeline: stage '{}' failed: {}", stage.name(), e);
                    return Err(e);
                }
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity {
        name: String,
        size: usize,
    }

    impl Stage for Identity {
        fn name(&self) -> &str {
            &self.name
        }
        fn encoded_block_size(&self) -> usize {
            self.size
        }
        fn decoded_block_size(&self) -> usize {
            self.size
        }
        fn decode(
            &self,
            data: &[u8],
            _erasures: &[bool],
            _stats: &mut DecodeStats,
        ) -> Result<Vec<u8>, StageError> {
            Ok(data.to_vec())
        }
    }

    #[test]
    fn matching_block_sizes_build_a_pipeline() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(Identity { name: "a".into(), size: 8 }),
            Box::new(Identity { name: "b".into(), size: 8 }),
        ];
        assert!(Pipeline::new(stages).is_ok());
    }

    #[test]
    fn mismatched_block_sizes_are_rejected() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(Identity { name: "a".into(), size: 8 }),
            Box::new(Identity { name: "b".into(), size: 16 }),
        ];
        assert!(matches!(Pipeline::new(stages), Err(StageError::ConfigError(_))));
    }

    #[test]
    fn decode_runs_stages_in_reverse() {
        struct Tag(u8);
        impl Stage for Tag {
            fn name(&self) -> &str {
                "tag"
            }
            fn encoded_block_size(&self) -> usize {
                1
            }
            fn decoded_block_size(&self) -> usize {
                1
            }
            fn decode(
                &self,
                data: &[u8],
                _erasures: &[bool],
                _stats: &mut DecodeStats,
            ) -> Result<Vec<u8>, StageError> {
                let mut out = data.to_vec();
                out.push(self.0);
                Ok(out)
            }
        }
        let stages: Vec<Box<dyn Stage>> = vec![Box::new(Tag(1)), Box::new(Tag(2))];
        let pipeline = Pipeline::new(stages).unwrap();
        let mut stats = DecodeStats::new();
        let out = pipeline.decode(&[], &mut stats).unwrap();
        assert_eq!(out, vec![2, 1]);
    }
}
