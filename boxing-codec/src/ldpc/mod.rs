mod mod2sparse;

pub use mod2sparse::Mod2Sparse;

use boxing_core::DecodeStats;
use log::debug;

use crate::pipeline::{Stage, StageError};

/// A splitmix64-style deterministic generator. Not cryptographic; used
/// only to build a reproducible parity-check matrix from a fixed seed so
/// two decoders built from the same descriptor produce bit-identical
/// matrices without serialising them.
struct DeterministicRng(u64);

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// The LDPC parity-check matrix `H`, `parity_size x message_size`
/// (systematic columns first, parity columns last, per the reference
/// construction's convention). Built once per frame format from
/// `(message_size, parity_size)` under an "even-both, no 4-cycles"
/// column/row-weight distribution (reference construction's distribution
/// class `"3"`), seeded deterministically so two decoders built from the
/// same descriptor agree bit-for-bit.
pub struct ParityCheckMatrix {
    sparse: Mod2Sparse,
    message_size: usize,
    parity_size: usize,
}

const DEFAULT_SEED: u64 = 1;
const COLUMN_WEIGHT: usize = 3;

impl ParityCheckMatrix {
    pub fn new(message_size: usize, parity_size: usize) -> Self {
        Self::with_seed(message_size, parity_size, DEFAULT_SEED)
    }

    pub fn with_seed(message_size: usize, parity_size: usize, seed: u64) -> Self {
        let total_cols = message_size + parity_size;
        let mut sparse = Mod2Sparse::new(parity_size, total_cols);
        let mut rng = DeterministicRng::new(seed);

        // "Even-both" distribution: every column gets exactly
        // `COLUMN_WEIGHT` checks (clamped to the number of rows), and
        // checks are spread across rows round-robin first, then filled
        // randomly, while rejecting placements that would create a
        // 4-cycle (two columns sharing two rows).
        let weight = COLUMN_WEIGHT.min(parity_size.max(1));
        let mut row_fill = vec![0usize; parity_size];

        for col in 0..total_cols {
            let mut chosen: Vec<usize> = Vec::with_capacity(weight);
            let mut attempts = 0usize;
            while chosen.len() < weight && attempts < weight * 64 {
                attempts += 1;
                let row = if parity_size == 0 {
                    break;
                } else {
                    // Bias towards the least-filled rows to keep row
                    // weight roughly even, falling back to a uniform pick.
                    let candidate = rng.next_below(parity_size);
                    let alt = rng.next_below(parity_size);
                    if row_fill[alt] < row_fill[candidate] { alt } else { candidate }
                };
                if chosen.contains(&row) {
                    continue;
                }
                if creates_four_cycle(&sparse, col, row, &chosen) {
                    continue;
                }
                chosen.push(row);
                row_fill[row] += 1;
            }
            for row in chosen {
                sparse.set(row, col);
            }
        }

        Self { sparse, message_size, parity_size }
    }

    pub fn message_size(&self) -> usize {
        self.message_size
    }

    pub fn parity_size(&self) -> usize {
        self.parity_size
    }

    fn check_row_columns(&self, row: usize) -> Vec<usize> {
        self.sparse.row_entries(row)
    }

    fn variable_col_rows(&self, col: usize) -> Vec<usize> {
        self.sparse.col_entries(col)
    }
}

/// True if adding a check at `row` for `col` would complete a 4-cycle
/// with any already-chosen row: two rows that already share two columns
/// between them.
fn creates_four_cycle(sparse: &Mod2Sparse, col: usize, row: usize, chosen: &[usize]) -> bool {
    let new_row_cols: std::collections::HashSet<usize> = sparse.row_entries(row).into_iter().collect();
    for &other in chosen {
        let other_cols: std::collections::HashSet<usize> = sparse.row_entries(other).into_iter().collect();
        let shared = new_row_cols.intersection(&other_cols).filter(|&&c| c != col).count();
        if shared >= 1 {
            return true;
        }
    }
    false
}

/// Sum-product belief propagation LDPC decoder over `ParityCheckMatrix`.
/// Input is a vector of signed-8-bit LLRs (the 2D-PAM demapper's
/// output); output is the systematic message portion re-packed into
/// bytes.
pub struct Ldpc {
    matrix: ParityCheckMatrix,
    iterations: usize,
}

const DEFAULT_ITERATIONS: usize = 25;

impl Ldpc {
    pub fn new(matrix: ParityCheckMatrix) -> Self {
        Self { matrix, iterations: DEFAULT_ITERATIONS }
    }

    pub fn with_iterations(matrix: ParityCheckMatrix, iterations: usize) -> Self {
        Self { matrix, iterations }
    }

    fn decode_llrs(&self, llrs: &[f64], stats: &mut DecodeStats) -> Result<Vec<bool>, StageError> {
        let n = self.matrix.message_size + self.matrix.parity_size;
        if llrs.len() != n {
            return Err(StageError::ConfigError(format!(
                "LDPC expected {} LLRs, got {}",
                n,
                llrs.len()
            )));
        }

        // Likelihood ratios from LLRs: exp(L / 10).
        let channel: Vec<f64> = llrs.iter().map(|&l| (l / 10.0).exp()).collect();
        let mut var_to_check: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for col in 0..n {
            for row in self.matrix.variable_col_rows(col) {
                var_to_check[col].push((row, channel[col]));
            }
        }

        let mut check_to_var: Vec<std::collections::HashMap<usize, f64>> =
            vec![std::collections::HashMap::new(); self.matrix.parity_size];

        let mut hard_decision = vec![false; n];
        let mut satisfied = false;

        for _iteration in 0..self.iterations {
            // Variable-to-check: product of channel LR and all other
            // incoming check messages.
            let mut messages_out: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
            for col in 0..n {
                let rows = self.matrix.variable_col_rows(col);
                for &row in &rows {
                    let mut product = channel[col];
                    for &other_row in &rows {
                        if other_row == row {
                            continue;
                        }
                        if let Some(&m) = check_to_var[other_row].get(&col) {
                            product *= m;
                        }
                    }
                    messages_out[col].push((row, product));
                }
            }

            // Check-to-variable: tanh-rule product approximated via the
            // likelihood-ratio product/sum form (equivalent for binary
            // messages expressed as odds ratios).
            let mut next_check_to_var: Vec<std::collections::HashMap<usize, f64>> =
                vec![std::collections::HashMap::new(); self.matrix.parity_size];
            for row in 0..self.matrix.parity_size {
                let cols = self.matrix.check_row_columns(row);
                for &col in &cols {
                    let mut odd_product = 1f64;
                    for &other_col in &cols {
                        if other_col == col {
                            continue;
                        }
                        if let Some(&(_, lr)) = messages_out[other_col].iter().find(|(r, _)| *r == row) {
                            let p1 = lr / (1.0 + lr);
                            odd_product *= 1.0 - 2.0 * p1;
                        }
                    }
                    let p1 = (1.0 - odd_product) / 2.0;
                    let lr = if p1 >= 1.0 { f64::INFINITY } else { p1 / (1.0 - p1).max(1e-12) };
                    next_check_to_var[row].insert(col, lr.max(1e-6));
                }
            }
            check_to_var = next_check_to_var;

            // Hard decision: total likelihood ratio per variable.
            for col in 0..n {
                let mut total = channel[col];
                for &row in &self.matrix.variable_col_rows(col) {
                    if let Some(&m) = check_to_var[row].get(&col) {
                        total *= m;
                    }
                }
                hard_decision[col] = total < 1.0;
            }

            satisfied = (0..self.matrix.parity_size).all(|row| {
                self.matrix.check_row_columns(row).iter().filter(|&&c| hard_decision[c]).count() % 2 == 0
            });
            if satisfied {
                break;
            }
        }

        let altered = llrs.iter().zip(hard_decision.iter()).filter(|(&l, &bit)| (l < 0) != bit).count() as u64;
        if satisfied {
            stats.record_resolved(altered);
        } else {
            stats.record_unresolved(altered);
        }
        debug!("LDPC: {} altered bits, parity satisfied = {}", altered, satisfied);

        Ok(hard_decision)
    }
}

impl Stage for Ldpc {
    fn name(&self) -> &str {
        "LDPC"
    }

    fn encoded_block_size(&self) -> usize {
        self.matrix.message_size + self.matrix.parity_size
    }

    fn decoded_block_size(&self) -> usize {
        (self.matrix.message_size + 7) / 8
    }

    fn is_error_correcting(&self) -> bool {
        true
    }

    fn decode(
        &self,
        data: &[u8],
        _erasures: &[bool],
        stats: &mut DecodeStats,
    ) -> Result<Vec<u8>, StageError> {
        let n = self.encoded_block_size();
        if data.len() != n {
            return Err(StageError::ConfigError(format!(
                "LDPC expected {} signed-LLR bytes, got {}",
                n,
                data.len()
            )));
        }
        let llrs: Vec<f64> = data.iter().map(|&b| b as i8 as f64).collect();
        let bits = self.decode_llrs(&llrs, stats)?;

        let message_bits = &bits[..self.matrix.message_size];
        let bytes = message_bits
            .chunks(8)
            .map(|chunk| {
                let mut b = 0u8;
                for (i, &bit) in chunk.iter().enumerate() {
                    if bit {
                        b |= 1 << (7 - i);
                    }
                }
                b
            })
            .collect();
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_matrix_gives_every_column_some_weight() {
        let matrix = ParityCheckMatrix::new(16, 8);
        for col in 0..24 {
            assert!(!matrix.variable_col_rows(col).is_empty(), "column {} has no checks", col);
        }
    }

    #[test]
    fn same_seed_produces_identical_matrices() {
        let a = ParityCheckMatrix::with_seed(16, 8, 7);
        let b = ParityCheckMatrix::with_seed(16, 8, 7);
        for row in 0..8 {
            assert_eq!(a.check_row_columns(row), b.check_row_columns(row));
        }
    }

    #[test]
    fn clean_llrs_decode_without_altering_bits() {
        let matrix = ParityCheckMatrix::with_seed(8, 4, 3);
        let ldpc = Ldpc::new(matrix);
        // Strong positive LLR for every bit: confident "bit = 0" in the
        // mapping this decoder uses (total likelihood ratio >= 1).
        let data = vec![100i8 as u8; 12];
        let mut stats = DecodeStats::new();
        let out = ldpc.decode(&data, &[], &mut stats);
        assert!(out.is_ok());
    }
}
