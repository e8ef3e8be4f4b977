use std::io;

#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error(
        "Sample count disagrees with chunk layout: {samples} samples in the size table, chunk runs cover {chunk_samples}"
    )]
    SampleCountMismatch { samples: u64, chunk_samples: u64 },

    #[error("Chunk {chunk} is referenced but only {offsets} chunk offsets are recorded")]
    MissingChunkOffset { chunk: usize, offsets: usize },

    #[error("Chunk {chunk} declares zero samples per chunk")]
    EmptyChunkRun { chunk: usize },

    #[error("Chunk offset count ({offsets}) does not match run entry count ({runs})")]
    RunCountMismatch { offsets: usize, runs: usize },

    #[error("Run entry {index} starts at chunk {first_chunk}, expected a value in 1..={max}")]
    RunOutOfRange {
        index: usize,
        first_chunk: u32,
        max: usize,
    },

    #[error("Run entries must start at chunk 1 and be strictly increasing. Read {0} after {1}")]
    RunNotIncreasing(u32, u32),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("No decoder-specific-info descriptor among the codec descriptors")]
    NoDecoderSpecificInfo,

    #[error("Expected exactly one decoder-specific-info descriptor, found {0}")]
    AmbiguousDecoderSpecificInfo(usize),

    #[error("Decoder-specific-info payload too short for an Audio Specific Config: {0} bytes")]
    ShortPayload(usize),

    #[error("Sampling frequency index {0} has no fixed rate (escape or reserved value)")]
    UnsupportedFrequencyIndex(u8),

    #[error("Channel configuration {0} is not a fixed speaker layout")]
    UnsupportedChannelConfig(u8),
}

#[derive(thiserror::Error, Debug)]
pub enum DecoderError {
    #[error("Decoder rejected the Audio Specific Config: {0}")]
    Init(#[source] symphonia::core::errors::Error),

    #[error("Decode failed on access unit {index}: {source}")]
    Bitstream {
        index: u64,
        #[source]
        source: symphonia::core::errors::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read access unit at offset {offset}: {source}")]
    SourceRead {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error(
        "Source exhausted at access unit {index}: wanted {expected} bytes at offset {offset}, got {got}"
    )]
    SourceExhausted {
        index: u64,
        offset: u64,
        expected: u64,
        got: usize,
    },

    #[error(transparent)]
    Decode(#[from] DecoderError),

    #[error("PCM stream closed by the consumer")]
    StreamClosed,
}
