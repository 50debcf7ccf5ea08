//! Turns a sampled grayscale symbol image into either a quantized-byte
//! stream (standard PAM) or a signed-LLR stream (32-symbol 2D-PAM), using
//! a per-block local k-means quantizer to track the channel's drifting
//! brightness levels.

use boxing_core::{Image, Matrix};

/// Sorted per-cluster means and variances for one analysis block.
#[derive(Debug, Clone)]
pub struct BlockStats {
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
}

impl BlockStats {
    /// Thresholds are the midpoints between neighbouring sorted means;
    /// quantizing a pixel means finding which interval it falls in.
    fn thresholds(&self) -> Vec<f64> {
        self.means.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    fn quantize_value(&self, value: u8) -> u8 {
        let v = value as f64;
        let thresholds = self.thresholds();
        thresholds.iter().filter(|&&t| v >= t).count() as u8
    }
}

/// Partitions a sampled image into non-overlapping `block_width x
/// block_height` blocks and fits `k` levels to each block's 256-bin
/// brightness histogram via a deterministic farthest-point seeding (a
/// reproducible substitute for the randomized k-means++ seeding the
/// reference implementation uses, since this crate has no entropy
/// source) followed by six Lloyd iterations.
pub struct KMeansQuantizer {
    block_width: usize,
    block_height: usize,
    k: usize,
}

const LLOYD_ITERATIONS: usize = 6;

impl KMeansQuantizer {
    pub fn new(block_width: usize, block_height: usize, k: usize) -> Self {
        assert!(k >= 2, "quantizer needs at least two levels");
        Self { block_width, block_height, k }
    }

    fn histogram(image: &Image, x0: usize, y0: usize, w: usize, h: usize) -> [u64; 256] {
        let mut hist = [0u64; 256];
        for y in y0..(y0 + h).min(image.height()) {
            for x in x0..(x0 + w).min(image.width()) {
                hist[image.pixel(x, y) as usize] += 1;
            }
        }
        hist
    }

    fn seed_means(hist: &[u64; 256], k: usize) -> Vec<f64> {
        let present: Vec<usize> = (0..256).filter(|&v| hist[v] > 0).collect();
        if present.is_empty() {
            return (0..k).map(|i| i as f64 * 255.0 / (k - 1).max(1) as f64).collect();
        }

        let mut means = vec![present[0] as f64];
        while means.len() < k {
            let next = present
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    let da = means.iter().map(|&m| (a as f64 - m).abs()).fold(f64::MAX, f64::min);
                    let db = means.iter().map(|&m| (b as f64 - m).abs()).fold(f64::MAX, f64::min);
                    da.partial_cmp(&db).unwrap()
                })
                .unwrap();
            means.push(next as f64);
        }
        means
    }

    /// Six Lloyd iterations of nearest-mean assignment over the block's
    /// histogram, then a final pass computing per-cluster variance.
    fn fit_block(&self, hist: &[u64; 256]) -> BlockStats {
        let mut means = Self::seed_means(hist, self.k);

        for _ in 0..LLOYD_ITERATIONS {
            let mut sums = vec![0f64; self.k];
            let mut counts = vec![0f64; self.k];
            for value in 0..256usize {
                let weight = hist[value] as f64;
                if weight == 0.0 {
                    continue;
                }
                let cluster = nearest_mean(&means, value as f64);
                sums[cluster] += value as f64 * weight;
                counts[cluster] += weight;
            }
            for i in 0..self.k {
                if counts[i] > 0.0 {
                    means[i] = sums[i] / counts[i];
                }
            }
        }

        let mut idx: Vec<usize> = (0..self.k).collect();
        idx.sort_by(|&a, &b| means[a].partial_cmp(&means[b]).unwrap());
        let sorted_means: Vec<f64> = idx.iter().map(|&i| means[i]).collect();

        let mut var_sums = vec![0f64; self.k];
        let mut var_counts = vec![0f64; self.k];
        for value in 0..256usize {
            let weight = hist[value] as f64;
            if weight == 0.0 {
                continue;
            }
            let cluster = nearest_mean(&sorted_means, value as f64);
            let d = value as f64 - sorted_means[cluster];
            var_sums[cluster] += d * d * weight;
            var_counts[cluster] += weight;
        }
        let variances: Vec<f64> = (0..self.k)
            .map(|i| if var_counts[i] > 0.0 { var_sums[i] / var_counts[i] } else { 1.0 })
            .collect();

        BlockStats { means: sorted_means, variances }
    }

    /// Returns the per-block stats tensor (row-major, `W_blocks x
    /// H_blocks`) and a same-size-as-image matrix of per-pixel quantized
    /// interval indices.
    pub fn quantize(&self, image: &Image) -> (Matrix<BlockStats>, Vec<u8>) {
        let blocks_w = (image.width() + self.block_width - 1) / self.block_width;
        let blocks_h = (image.height() + self.block_height - 1) / self.block_height;
        let mut tensor: Matrix<BlockStats> = Matrix::from_vec(
            blocks_w,
            blocks_h,
            (0..blocks_w * blocks_h)
                .map(|_| BlockStats { means: vec![], variances: vec![] })
                .collect(),
        );

        for by in 0..blocks_h {
            for bx in 0..blocks_w {
                let x0 = bx * self.block_width;
                let y0 = by * self.block_height;
                let hist = Self::histogram(image, x0, y0, self.block_width, self.block_height);
                tensor.set(by, bx, self.fit_block(&hist));
            }
        }

        let mut quantized = vec![0u8; image.width() * image.height()];
        for y in 0..image.height() {
            for x in 0..image.width() {
                let bx = x / self.block_width;
                let by = y / self.block_height;
                let stats = tensor.get(by, bx);
                quantized[y * image.width() + x] = stats.quantize_value(image.pixel(x, y));
            }
        }

        (tensor, quantized)
    }
}

fn nearest_mean(means: &[f64], value: f64) -> usize {
    means
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().partial_cmp(&(*b - value).abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap()
}

/// The fixed 32-point constellation on a 6x6 grid (coordinate bounds
/// `[0, 5]`) and the five bit-partition planes, transcribed literally
/// from the reference encoder's `map_32_2dPam`/`bit_map` tables.
pub struct PamDemapper {
    constellation: [(u8, u8); 32],
    bitmaps: [([[f64; 6]; 6], [[f64; 6]; 6]); 5],
}

impl PamDemapper {
    pub fn new() -> Self {
        let constellation = build_constellation();
        let bitmaps = build_bitmaps(&constellation);
        Self { constellation, bitmaps }
    }

    pub fn constellation(&self) -> &[(u8, u8); 32] {
        &self.constellation
    }

    /// Demaps one pair of consecutive sampled symbols into five LLR
    /// bytes, one per bit position, using the local per-axis means and
    /// variances from the quantizer tensor.
    pub fn demap_pair(&self, s0: u8, s1: u8, axis_stats: &BlockStats) -> [i8; 5] {
        let mut likelihood = [[0f64; 6]; 6];
        for row in 0..6 {
            for col in 0..6 {
                let mu_col = axis_stats.means.get(col).copied().unwrap_or(255.0);
                let var_col = axis_stats.variances.get(col).copied().unwrap_or(1.0).max(1e-6);
                let mu_row = axis_stats.means.get(row).copied().unwrap_or(255.0);
                let var_row = axis_stats.variances.get(row).copied().unwrap_or(1.0).max(1e-6);

                let d_col = s0 as f64 - mu_col;
                let d_row = s1 as f64 - mu_row;
                likelihood[row][col] =
                    (-(d_col * d_col) / var_col).exp() * (-(d_row * d_row) / var_row).exp();
            }
        }

        let mut out = [0i8; 5];
        for (bit, (plane0, plane1)) in self.bitmaps.iter().enumerate() {
            let mut p0 = 0f64;
            let mut p1 = 0f64;
            for row in 0..6 {
                for col in 0..6 {
                    p0 += likelihood[row][col] * plane0[row][col];
                    p1 += likelihood[row][col] * plane1[row][col];
                }
            }
            // Preserved literally as log1p(p1/p0 - 1) rather than
            // simplified to log(p1/p0), to keep floating-point behaviour
            // identical for edge cases near p1 ~= p0.
            let llr = if p0 > 0.0 { (p1 / p0 - 1.0).ln_1p() * 10.0 } else { 0.0 };
            out[bit] = llr.clamp(-128.0, 127.0).round() as i8;
        }
        out
    }
}

impl Default for PamDemapper {
    fn default() -> Self {
        Self::new()
    }
}

fn build_constellation() -> [(u8, u8); 32] {
    // map_32_2dPam: index -> (s0, s1), i.e. (col, row) on the 6x6 grid.
    [
        (0, 0), (1, 0), (2, 1), (2, 0), (0, 1), (0, 2), (2, 2), (1, 2),
        (5, 0), (4, 0), (3, 1), (3, 0), (5, 1), (5, 2), (3, 2), (4, 2),
        (0, 5), (1, 5), (2, 4), (2, 5), (0, 4), (0, 3), (2, 3), (1, 3),
        (5, 5), (4, 5), (3, 4), (3, 5), (5, 4), (5, 3), (3, 3), (4, 3),
    ]
}

fn build_bitmaps(_constellation: &[(u8, u8); 32]) -> [([[f64; 6]; 6], [[f64; 6]; 6]); 5] {
    // bit_map[bit][0 | 1][row][col], transcribed literally.
    fn f(rows: [[u8; 6]; 6]) -> [[f64; 6]; 6] {
        let mut out = [[0f64; 6]; 6];
        for r in 0..6 {
            for c in 0..6 {
                out[r][c] = rows[r][c] as f64;
            }
        }
        out
    }

    [
        (
            f([[1, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1], [0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0]]),
            f([[0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0], [1, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1]]),
        ),
        (
            f([[1, 1, 1, 0, 0, 0], [1, 1, 1, 0, 0, 0], [1, 1, 1, 0, 0, 0], [1, 1, 1, 0, 0, 0], [1, 1, 1, 0, 0, 0], [1, 1, 1, 0, 0, 0]]),
            f([[0, 0, 0, 1, 1, 1], [0, 0, 0, 1, 1, 1], [0, 0, 0, 1, 1, 1], [0, 0, 0, 1, 1, 1], [0, 0, 0, 1, 1, 1], [0, 0, 0, 1, 1, 1]]),
        ),
        (
            f([[1, 1, 1, 1, 1, 1], [0, 0, 1, 1, 0, 0], [0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0], [0, 0, 1, 1, 0, 0], [1, 1, 1, 1, 1, 1]]),
            f([[0, 0, 0, 0, 0, 0], [1, 0, 0, 0, 0, 1], [1, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1], [1, 0, 0, 0, 0, 1], [0, 0, 0, 0, 0, 0]]),
        ),
        (
            f([[1, 1, 0, 0, 1, 1], [1, 0, 0, 0, 0, 1], [1, 0, 0, 0, 0, 1], [1, 0, 0, 0, 0, 1], [1, 0, 0, 0, 0, 1], [1, 1, 0, 0, 1, 1]]),
            f([[0, 0, 1, 1, 0, 0], [0, 0, 1, 1, 0, 0], [0, 1, 1, 1, 1, 0], [0, 1, 1, 1, 1, 0], [0, 0, 1, 1, 0, 0], [0, 0, 1, 1, 0, 0]]),
        ),
        (
            f([[1, 0, 0, 0, 0, 1], [1, 0, 1, 1, 0, 1], [0, 0, 1, 1, 0, 0], [0, 0, 1, 1, 0, 0], [1, 0, 1, 1, 0, 1], [1, 0, 0, 0, 0, 1]]),
            f([[0, 1, 1, 1, 1, 0], [0, 0, 0, 0, 0, 0], [1, 1, 0, 0, 1, 1], [1, 1, 0, 0, 1, 1], [0, 0, 0, 0, 0, 0], [0, 1, 1, 1, 1, 0]]),
        ),
    ]
}

/// Top-level entry point tying the quantizer and demapper together per
/// the frame format's configured alphabet size.
pub struct Demodulator {
    quantizer: KMeansQuantizer,
}

impl Demodulator {
    pub fn new(block_width: usize, block_height: usize, alphabet_size: usize) -> Self {
        Self { quantizer: KMeansQuantizer::new(block_width, block_height, alphabet_size) }
    }

    /// Standard PAM path: one quantized byte per pixel.
    pub fn quantize_pam(&self, image: &Image) -> Vec<u8> {
        self.quantizer.quantize(image).1
    }

    /// 32-symbol 2D-PAM path: one 5-byte LLR group per pair of pixels,
    /// read in raster order.
    pub fn demap_2d_pam(&self, image: &Image, demapper: &PamDemapper) -> Vec<i8> {
        let (tensor, _) = self.quantizer.quantize(image);
        let pixels = image.pixels();
        let mut out = Vec::with_capacity(pixels.len() / 2 * 5);

        for (i, pair) in pixels.chunks(2).enumerate() {
            if pair.len() < 2 {
                break;
            }
            let pixel_index = i * 2;
            let x = pixel_index % image.width();
            let y = pixel_index / image.width();
            let bx = (x / self.quantizer.block_width).min(tensor.width() - 1);
            let by = (y / self.quantizer.block_height).min(tensor.height() - 1);
            let stats = tensor.get(by, bx);
            out.extend_from_slice(&demapper.demap_pair(pair[0], pair[1], stats));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_block_fits_to_a_single_dominant_level() {
        let quantizer = KMeansQuantizer::new(8, 8, 4);
        let image = Image::filled(8, 8, 100);
        let (tensor, quantized) = quantizer.quantize(&image);
        assert_eq!(tensor.width(), 1);
        assert_eq!(tensor.height(), 1);
        assert!(quantized.iter().all(|&v| v == quantized[0]));
    }

    #[test]
    fn bimodal_block_separates_into_two_clusters() {
        let quantizer = KMeansQuantizer::new(8, 8, 2);
        let mut image = Image::filled(8, 8, 20);
        for y in 0..4 {
            for x in 0..8 {
                image.set_pixel(x, y, 220);
            }
        }
        let (_, quantized) = quantizer.quantize(&image);
        let levels: std::collections::HashSet<u8> = quantized.iter().copied().collect();
        assert_eq!(levels.len(), 2);
    }

    #[test]
    fn constellation_has_32_distinct_points_in_bounds() {
        let demapper = PamDemapper::new();
        let points = demapper.constellation();
        let set: std::collections::HashSet<(u8, u8)> = points.iter().copied().collect();
        assert_eq!(set.len(), 32);
        assert!(points.iter().all(|&(c, r)| c <= 5 && r <= 5));
    }

    #[test]
    fn demap_pair_produces_five_bounded_llrs() {
        let demapper = PamDemapper::new();
        let stats = BlockStats {
            means: vec![10.0, 50.0, 90.0, 130.0, 170.0, 210.0],
            variances: vec![25.0; 6],
        };
        let llrs = demapper.demap_pair(90, 130, &stats);
        assert_eq!(llrs.len(), 5);
        for v in llrs {
            assert!((-128..=127).contains(&(v as i32)));
        }
    }
}
