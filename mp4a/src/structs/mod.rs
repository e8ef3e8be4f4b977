/// Per-sample byte length table ([`sample::SampleSizeTable`]).
pub mod sample;

/// Chunk offsets and sample-to-chunk runs ([`chunk::ChunkLayoutTable`]).
pub mod chunk;

/// Codec descriptor tree and the Audio Specific Config
/// ([`esds::AudioSpecificConfig`]).
pub mod esds;
