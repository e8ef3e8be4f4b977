/// Frame address resolution.
///
/// Provides the [`FrameAddressResolver`](resolve::FrameAddressResolver) for
/// turning the container's metadata tables into the byte range of every
/// access unit.
pub mod resolve;

/// Access-unit decoding to PCM.
///
/// Provides the [`AccessUnitDecoder`](decode::AccessUnitDecoder) capability
/// and the symphonia-backed [`AacDecoder`](decode::AacDecoder).
pub mod decode;

/// Streaming decode pipeline.
///
/// Provides the [`DecodePipeline`](pipeline::DecodePipeline) driving
/// resolved frames through a decoder into an ordered PCM block stream.
pub mod pipeline;
