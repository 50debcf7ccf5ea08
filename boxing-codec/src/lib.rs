#![allow(dead_code)]

//! The reversible codec pipeline: an ordered sequence of `Stage`
//! implementations walked back-to-front on decode, plus the demodulator
//! that turns a sampled symbol image into the bitstream the pipeline
//! consumes.

mod cipher;
mod crc;
pub mod demod;
mod interleave;
pub mod ldpc;
mod modulator;
mod packetheader;
mod pipeline;
mod rs;
mod stripe;
mod syncpoint;

pub use cipher::Cipher;
pub use crc::{Crc32, Crc32Variant, Crc64};
pub use demod::{BlockStats, Demodulator, KMeansQuantizer, PamDemapper};
pub use interleave::{Distance, Interleaver, InterleavingType, SymbolType};
pub use ldpc::{Ldpc, ParityCheckMatrix};
pub use modulator::Modulator;
pub use packetheader::PacketHeader;
pub use pipeline::{Pipeline, Stage, StageError};
pub use rs::ReedSolomon;
pub use stripe::Striping;
pub use syncpoint::{SyncGrid, SyncPointInserter};
