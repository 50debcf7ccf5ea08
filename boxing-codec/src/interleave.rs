use boxing_core::DecodeStats;

use crate::pipeline::{Stage, StageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterleavingType {
    Block,
    Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    Byte,
    Bit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distance(pub usize);

/// Block or frame interleaver by bit or byte distance. Deinterleaving
/// (decode) is the exact inverse permutation of `output[i] = input[(i mod
/// d) * n + (i / d)]`.
pub struct Interleaver {
    distance: usize,
    block_size: usize,
    interleaving_type: InterleavingType,
    symbol_type: SymbolType,
}

impl Interleaver {
    pub fn new(
        distance: Distance,
        block_size: usize,
        interleaving_type: InterleavingType,
        symbol_type: SymbolType,
    ) -> Self {
        assert_eq!(
            block_size % distance.0,
            0,
            "interleaver block size must be divisible by distance"
        );
        Self {
            distance: distance.0,
            block_size,
            interleaving_type,
            symbol_type,
        }
    }

    fn bits_from_bytes(bytes: &[u8]) -> Vec<bool> {
        let mut bits = Vec::with_capacity(bytes.len() * 8);
        for &b in bytes {
            for i in (0..8).rev() {
                bits.push((b >> i) & 1 != 0);
            }
        }
        bits
    }

    fn bytes_from_bits(bits: &[bool]) -> Vec<u8> {
        bits.chunks(8)
            .map(|chunk| {
                let mut b = 0u8;
                for (i, &bit) in chunk.iter().enumerate() {
                    if bit {
                        b |= 1 << (7 - i);
                    }
                }
                b
            })
            .collect()
    }

    /// Deinterleave one block: `output[(i mod d) * n + (i / d)] =
    /// input[i]`, the inverse of the encode-side formula in the
    /// specification.
    fn deinterleave_symbols<T: Copy + Default>(&self, symbols: &[T]) -> Vec<T> {
        let d = self.distance;
        let n = symbols.len() / d;
        let mut out = vec![T::default(); symbols.len()];
        for i in 0..symbols.len() {
            let dest = (i % d) * n + (i / d);
            out[dest] = symbols[i];
        }
        out
    }
}

impl Stage for Interleaver {
    fn name(&self) -> &str {
        "Interleaving"
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
        if self.interleaving_type == InterleavingType::Frame {
            // Frame interleaving only has meaning spanning multiple
            // frames; within a single frame's data this stage is a
            // pass-through.
            return Ok(data.to_vec());
        }

        match self.symbol_type {
            SymbolType::Byte => {
                let mut out = Vec::with_capacity(data.len());
                for block in data.chunks(self.block_size) {
                    out.extend(self.deinterleave_symbols(block));
                }
                Ok(out)
            }
            SymbolType::Bit => {
                let bits = Self::bits_from_bytes(data);
                let bit_block = self.block_size * 8;
                let mut out_bits = Vec::with_capacity(bits.len());
                for block in bits.chunks(bit_block) {
                    out_bits.extend(self.deinterleave_symbols(block));
                }
                Ok(Self::bytes_from_bits(&out_bits))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_interleave_then_deinterleave_is_identity() {
        let distance = 4usize;
        let n = 4usize;
        let block_size = distance * n;
        let original: Vec<u8> = (0..block_size as u8).collect();

        let mut interleaved = vec![0u8; block_size];
        for i in 0..block_size {
            interleaved[(i % distance) * n + (i / distance)] = original[i];
        }

        let stage = Interleaver::new(Distance(distance), block_size, InterleavingType::Block, SymbolType::Byte);
        let mut stats = DecodeStats::new();
        let out = stage.decode(&interleaved, &[], &mut stats).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn bit_interleave_then_deinterleave_is_identity() {
        let distance = 2usize;
        let block_size = 2usize; // 16 bits
        let stage = Interleaver::new(Distance(distance), block_size, InterleavingType::Block, SymbolType::Bit);
        let original = vec![0b1010_0110u8, 0b0101_1001u8];
        let bits = Interleaver::bits_from_bytes(&original);
        let n = bits.len() / distance;
        let mut interleaved_bits = vec![false; bits.len()];
        for i in 0..bits.len() {
            interleaved_bits[(i % distance) * n + (i / distance)] = bits[i];
        }
        let interleaved = Interleaver::bytes_from_bits(&interleaved_bits);
        let mut stats = DecodeStats::new();
        let out = stage.decode(&interleaved, &[], &mut stats).unwrap();
        assert_eq!(out, original);
    }
}
