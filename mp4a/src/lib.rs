//! Frame address resolution and streaming decode for MP4/M4A audio tracks.
//!
//! ## Technical Overview
//!
//! An MP4 container records where its audio access units live through three
//! independent, compactly-encoded tables: per-sample byte sizes (`stsz`),
//! sample-to-chunk runs (`stsc`) and chunk byte offsets (`stco`/`co64`).
//! None of them yields byte addresses alone; they must be walked together,
//! chunk boundaries against sample counts.
//!
//! ## Quick Start
//!
//! Steps for converting a track:
//!
//! 1. Build [`structs::sample::SampleSizeTable`] and
//!    [`structs::chunk::ChunkLayoutTable`] from the container metadata.
//! 2. Resolve access-unit addresses with
//!    [`process::resolve::FrameAddressResolver`].
//! 3. Extract the Audio Specific Config from the codec descriptors with
//!    [`structs::esds::AudioSpecificConfig`] and initialize
//!    [`process::decode::AacDecoder`].
//! 4. Stream PCM out of [`process::pipeline::DecodePipeline`].
//!
//! ```rust
//! use mp4a::process::{decode::AacDecoder, pipeline::DecodePipeline, resolve::FrameAddressResolver};
//! use mp4a::structs::{chunk::ChunkLayoutTable, esds::AudioSpecificConfig, sample::SampleSizeTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sizes = SampleSizeTable::from_sizes(vec![211, 204, 209]);
//! let layout = ChunkLayoutTable::new(vec![4096], vec![3])?;
//! let frames = FrameAddressResolver::new(sizes, layout)?;
//!
//! let asc = AudioSpecificConfig::parse(&[0x12, 0x10])?;
//! let decoder = AacDecoder::try_new(&asc)?;
//!
//! let source = std::io::Cursor::new(vec![0u8; 8192]);
//! let pipeline = DecodePipeline::new(source, frames, decoder);
//! # let _ = pipeline;
//! # Ok(())
//! # }
//! ```

/// Processing functionality: address resolution, decoding, the pipeline.
pub mod process;

/// Data structures for the container metadata tables.
pub mod structs;

/// Utility infrastructure: error types.
pub mod utils;
