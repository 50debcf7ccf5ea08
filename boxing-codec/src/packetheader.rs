use boxing_core::DecodeStats;

use crate::pipeline::{Stage, StageError};

/// Strips (decode) or would prepend (encode) a fixed-size leading header.
/// Decode simply drops the first `header_size` bytes; the header's
/// contents are not otherwise interpreted by this stage.
pub struct PacketHeader {
    header_size: usize,
    payload_size: usize,
}

impl PacketHeader {
    pub fn new(header_size: usize, payload_size: usize) -> Self {
        Self { header_size, payload_size }
    }
}

impl Stage for PacketHeader {
    fn name(&self) -> &str {
        "PacketHeader"
    }

    fn encoded_block_size(&self) -> usize {
        self.header_size + self.payload_size
    }

    fn decoded_block_size(&self) -> usize {
        self.payload_size
    }

    fn decode(
        &self,
        data: &[u8],
        _erasures: &[bool],
        _stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError> {
        if data.len() < self.header_size {
            return Err(StageError::ConfigError(
                "PacketHeader input shorter than header size".into(),
            ));
        }
        Ok(data[self.header_size..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_bytes_are_stripped() {
        let stage = PacketHeader::new(4, 8);
        let mut data = vec![0xAA; 4];
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut stats = DecodeStats::new();
        let out = stage.decode(&data, &[], &mut stats).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
