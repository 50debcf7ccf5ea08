use boxing_core::DecodeStats;

use crate::pipeline::{Stage, StageError};

/// Selects the reflected polynomial a `Crc32` stage's lookup table is
/// built from. Each variant is precomputed once at construction and
/// shared read-only for the life of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crc32Variant {
    /// The standard 0xEDB88320 reversed polynomial.
    Standard,
    /// Castagnoli, 0x82F63B78.
    Castagnoli,
    /// Koopman, 0xEB31D82E.
    Koopman,
}

impl Crc32Variant {
    fn reversed_poly(self) -> u32 {
        match self {
            Crc32Variant::Standard => 0xEDB8_8320,
            Crc32Variant::Castagnoli => 0x82F6_3B78,
            Crc32Variant::Koopman => 0xEB31_D82E,
        }
    }
}

fn build_table_32(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut c = i as u32;
        for _ in 0..8 {
            c = if c & 1 != 0 { (c >> 1) ^ poly } else { c >> 1 };
        }
        *entry = c;
    }
    table
}

/// Verifies a trailing 4-byte CRC32 against the recovered payload. The
/// default seed is `0`, matching `boxing_math_crc32_create_def`, which
/// also defaults to the Castagnoli polynomial rather than Standard.
pub struct Crc32 {
    table: [u32; 256],
    seed: u32,
}

impl Crc32 {
    pub fn new(variant: Crc32Variant, seed: u32) -> Self {
        Self {
            table: build_table_32(variant.reversed_poly()),
            seed,
        }
    }

    pub fn with_default_seed(variant: Crc32Variant) -> Self {
        Self::new(variant, 0)
    }

    fn compute(&self, data: &[u8]) -> u32 {
        let mut crc = self.seed;
        for &b in data {
            let idx = ((crc ^ b as u32) & 0xFF) as usize;
            crc = (crc >> 8) ^ self.table[idx];
        }
        crc ^ self.seed
    }
}

impl Stage for Crc32 {
    fn name(&self) -> &str {
        "CRC32"
    }

    fn encoded_block_size(&self) -> usize {
        0
    }

    fn decoded_block_size(&self) -> usize {
        0
    }

    fn decode(
        &self,
        data: &[u8],
        _erasures: &[bool],
        _stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError> {
        if data.len() < 4 {
            return Err(StageError::ConfigError("CRC32 input shorter than 4 bytes".into()));
        }
        let (payload, trailer) = data.split_at(data.len() - 4);
        let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if self.compute(payload) != stored {
            return Err(StageError::CrcMismatch);
        }
        Ok(payload.to_vec())
    }
}

fn build_table_64(poly: u64) -> [u64; 256] {
    let mut table = [0u64; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut c = i as u64;
        for _ in 0..8 {
            c = if c & 1 != 0 { (c >> 1) ^ poly } else { c >> 1 };
        }
        *entry = c;
    }
    table
}

/// ECMA-182 CRC64, reflected form. Default seed is `0`, matching
/// `boxing_math_crc64_create_def`.
pub struct Crc64 {
    table: [u64; 256],
    seed: u64,
}

const ECMA_182_REVERSED: u64 = 0xC96C_5795_D787_0F42;

impl Crc64 {
    pub fn new(seed: u64) -> Self {
        Self {
            table: build_table_64(ECMA_182_REVERSED),
            seed,
        }
    }

    pub fn with_default_seed() -> Self {
        Self::new(0)
    }

    fn compute(&self, data: &[u8]) -> u64 {
        let mut crc = self.seed;
        for &b in data {
            let idx = ((crc ^ b as u64) & 0xFF) as usize;
            crc = (crc >> 8) ^ self.table[idx];
        }
        crc ^ self.seed
    }
}

impl Stage for Crc64 {
    fn name(&self) -> &str {
        "CRC64"
    }

    fn encoded_block_size(&self) -> usize {
        0
    }

    fn decoded_block_size(&self) -> usize {
        0
    }

    fn decode(
        &self,
        data: &[u8],
        _erasures: &[bool],
        _stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError> {
        if data.len() < 8 {
            return Err(StageError::ConfigError("CRC64 input shorter than 8 bytes".into()));
        }
        let (payload, trailer) = data.split_at(data.len() - 8);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(trailer);
        let stored = u64::from_le_bytes(bytes);
        if self.compute(payload) != stored {
            return Err(StageError::CrcMismatch);
        }
        Ok(payload.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_crc32_round_trips() {
        let crc = Crc32::with_default_seed(Crc32Variant::Standard);
        let payload = b"HELLO\n";
        let value = crc.compute(payload);
        let mut framed = payload.to_vec();
        framed.extend_from_slice(&value.to_le_bytes());
        let mut stats = DecodeStats::new();
        let out = crc.decode(&framed, &[], &mut stats).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn corrupted_trailer_is_a_mismatch() {
        let crc = Crc32::with_default_seed(Crc32Variant::Castagnoli);
        let mut framed = b"data".to_vec();
        framed.extend_from_slice(&[0, 0, 0, 0]);
        let mut stats = DecodeStats::new();
        assert_eq!(crc.decode(&framed, &[], &mut stats), Err(StageError::CrcMismatch));
    }

    #[test]
    fn crc64_round_trips() {
        let crc = Crc64::with_default_seed();
        let payload = b"round trip payload";
        let value = crc.compute(payload);
        let mut framed = payload.to_vec();
        framed.extend_from_slice(&value.to_le_bytes());
        let mut stats = DecodeStats::new();
        let out = crc.decode(&framed, &[], &mut stats).unwrap();
        assert_eq!(out, payload);
    }
}
