use boxing_core::DecodeStats;

use crate::pipeline::{Stage, StageError};

/// XORs the payload with a pseudo-random stream seeded by `key`. The same
/// operation serves both encode and decode since XOR is its own inverse.
/// A `key` of `None` models the `Cipher.key == "auto"` configuration case:
/// the caller is expected to have already resolved the key from the
/// decoded `CipherKey` metadata item before constructing this stage (see
/// the unboxer's deferred-cipher handling).
pub struct Cipher {
    key: u32,
    block_size: usize,
}

impl Cipher {
    pub fn new(key: u32, block_size: usize) -> Self {
        Self { key, block_size }
    }

    /// A linear-congruential stream, reseeded per invocation from `key`.
    /// No reference cipher implementation is available in the retrieved
    /// pack (only config fixtures referencing a `cipherKey` field), so this
    /// glibc-rand-style LCG is this crate's own choice rather than a
    /// transcription.
    fn keystream(&self, len: usize) -> Vec<u8> {
        let mut state = self.key.wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect()
    }
}

impl Stage for Cipher {
    fn name(&self) -> &str {
        "Cipher"
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
        let stream = self.keystream(data.len());
        Ok(data.iter().zip(stream.iter()).map(|(&a, &b)| a ^ b).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_with_same_key_is_an_involution() {
        let cipher = Cipher::new(0xDEAD_BEEF, 16);
        let plain = vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let mut stats = DecodeStats::new();
        let enciphered = cipher.decode(&plain, &[], &mut stats).unwrap();
        let restored = cipher.decode(&enciphered, &[], &mut stats).unwrap();
        assert_eq!(restored, plain);
    }

    #[test]
    fn different_keys_produce_different_streams() {
        let a = Cipher::new(1, 16);
        let b = Cipher::new(2, 16);
        let plain = vec![0u8; 16];
        let mut stats = DecodeStats::new();
        assert_ne!(
            a.decode(&plain, &[], &mut stats).unwrap(),
            b.decode(&plain, &[], &mut stats).unwrap()
        );
    }
}
