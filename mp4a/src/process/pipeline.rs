use std::io::{self, Read, Seek, SeekFrom};

use crate::process::decode::{AccessUnitDecoder, DecodedBlock};
use crate::process::resolve::FrameAddressResolver;
use crate::utils::errors::PipelineError;

/// Random-access byte source for the container's media-data region.
///
/// `read_range` fills as much of `buf` as the source can provide starting
/// at `offset` and returns the byte count; a short count means the source
/// ended inside the requested range. I/O failures other than running out of
/// data are returned as errors.
pub trait RangeReader {
    fn read_range(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read + Seek> RangeReader for R {
    fn read_range(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

/// Policy for a source that ends before the last resolved frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truncation {
    /// Stop producing frames and close the stream normally. This matches
    /// the original tool, which treated EOF inside a frame as the end of
    /// usable audio.
    #[default]
    Tolerate,
    /// Fail the pipeline with [`PipelineError::SourceExhausted`].
    Fail,
}

/// Counters reported after a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Access units fully read from the source.
    pub frames_read: u64,
    /// Access units that produced non-empty PCM.
    pub frames_decoded: u64,
    /// Interleaved PCM samples handed to the consumer.
    pub samples_emitted: u64,
    /// Whether the run stopped early on an exhausted source.
    pub truncated: bool,
}

/// Streams resolved access units through a stateful decoder into a PCM
/// block sequence.
///
/// Owns the source reader, the frame sequence and the decoder exclusively;
/// decode calls happen in strict frame order. PCM leaves through the `emit`
/// callback in the same order, so a blocking callback gives the producer
/// side of a backpressured producer/consumer pair.
pub struct DecodePipeline<S, D> {
    source: S,
    frames: FrameAddressResolver,
    decoder: D,
    truncation: Truncation,
}

impl<S, D> DecodePipeline<S, D>
where
    S: RangeReader,
    D: AccessUnitDecoder,
{
    pub fn new(source: S, frames: FrameAddressResolver, decoder: D) -> Self {
        Self {
            source,
            frames,
            decoder,
            truncation: Truncation::default(),
        }
    }

    pub fn with_truncation(mut self, truncation: Truncation) -> Self {
        self.truncation = truncation;
        self
    }

    /// Runs the pipeline to completion or first fatal error.
    ///
    /// Every error is fatal except an exhausted source under
    /// [`Truncation::Tolerate`], which ends the run normally with
    /// `truncated` set in the stats. Empty decoder output is skipped, not
    /// emitted.
    pub fn run<F>(mut self, mut emit: F) -> Result<PipelineStats, PipelineError>
    where
        F: FnMut(DecodedBlock) -> Result<(), PipelineError>,
    {
        let mut stats = PipelineStats::default();
        let mut buf = Vec::new();

        while let Some(frame) = self.frames.next() {
            buf.resize(frame.size as usize, 0);
            let got = self
                .source
                .read_range(frame.offset, &mut buf)
                .map_err(|source| PipelineError::SourceRead {
                    offset: frame.offset,
                    source,
                })?;

            if (got as u64) < frame.size {
                match self.truncation {
                    Truncation::Tolerate => {
                        log::warn!(
                            "Source exhausted at access unit {}: wanted {} bytes at offset {}, got {got}; stopping",
                            stats.frames_read,
                            frame.size,
                            frame.offset,
                        );
                        stats.truncated = true;
                        break;
                    }
                    Truncation::Fail => {
                        return Err(PipelineError::SourceExhausted {
                            index: stats.frames_read,
                            offset: frame.offset,
                            expected: frame.size,
                            got,
                        });
                    }
                }
            }

            let block = self.decoder.decode(&buf)?;
            stats.frames_read += 1;

            if block.is_empty() {
                continue;
            }

            stats.frames_decoded += 1;
            stats.samples_emitted += block.samples.len() as u64;
            emit(block)?;
        }

        log::debug!(
            "Pipeline finished: {} frames read, {} decoded, {} samples",
            stats.frames_read,
            stats.frames_decoded,
            stats.samples_emitted,
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::chunk::ChunkLayoutTable;
    use crate::structs::sample::SampleSizeTable;
    use crate::utils::errors::DecoderError;
    use std::io::Cursor;
    use symphonia::core::errors::Error as SymphoniaError;

    /// Widens each input byte to one i32 sample; optionally yields empty
    /// blocks for the first `priming` calls.
    struct EchoDecoder {
        priming: usize,
        calls: usize,
    }

    impl EchoDecoder {
        fn new(priming: usize) -> Self {
            Self { priming, calls: 0 }
        }
    }

    impl AccessUnitDecoder for EchoDecoder {
        fn decode(&mut self, access_unit: &[u8]) -> Result<DecodedBlock, DecoderError> {
            self.calls += 1;
            let samples = if self.calls <= self.priming {
                Vec::new()
            } else {
                access_unit.iter().map(|&b| i32::from(b)).collect()
            };
            Ok(DecodedBlock {
                samples,
                channels: 1,
                sample_rate: 44100,
            })
        }
    }

    struct FailingDecoder;

    impl AccessUnitDecoder for FailingDecoder {
        fn decode(&mut self, _access_unit: &[u8]) -> Result<DecodedBlock, DecoderError> {
            Err(DecoderError::Bitstream {
                index: 0,
                source: SymphoniaError::DecodeError("bad unit"),
            })
        }
    }

    fn resolver(sizes: Vec<u32>, offsets: Vec<u64>, per_chunk: Vec<u32>) -> FrameAddressResolver {
        FrameAddressResolver::new(
            SampleSizeTable::from_sizes(sizes),
            ChunkLayoutTable::new(offsets, per_chunk).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn emits_all_frames_in_order() {
        // Media region: 8 bytes at offset 2, split 3 + 2 + 3.
        let source = Cursor::new(vec![0xAA, 0xBB, 1, 2, 3, 4, 5, 6, 7, 8]);
        let frames = resolver(vec![3, 2, 3], vec![2], vec![3]);

        let mut out = Vec::new();
        let stats = DecodePipeline::new(source, frames, EchoDecoder::new(0))
            .run(|block| {
                out.extend(block.samples);
                Ok(())
            })
            .unwrap();

        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(stats.frames_read, 3);
        assert_eq!(stats.frames_decoded, 3);
        assert_eq!(stats.samples_emitted, 8);
        assert!(!stats.truncated);
    }

    #[test]
    fn truncated_source_stops_cleanly_by_default() {
        // Third frame wants bytes past the end of the source.
        let source = Cursor::new(vec![1, 2, 3, 4]);
        let frames = resolver(vec![2, 2, 2], vec![0], vec![3]);

        let mut out = Vec::new();
        let stats = DecodePipeline::new(source, frames, EchoDecoder::new(0))
            .run(|block| {
                out.extend(block.samples);
                Ok(())
            })
            .unwrap();

        assert_eq!(out, vec![1, 2, 3, 4]);
        assert_eq!(stats.frames_read, 2);
        assert!(stats.truncated);
    }

    #[test]
    fn truncated_source_is_fatal_in_strict_mode() {
        let source = Cursor::new(vec![1, 2, 3]);
        let frames = resolver(vec![2, 2], vec![0], vec![2]);

        let err = DecodePipeline::new(source, frames, EchoDecoder::new(0))
            .with_truncation(Truncation::Fail)
            .run(|_| Ok(()))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::SourceExhausted {
                index: 1,
                offset: 2,
                expected: 2,
                got: 1,
            }
        ));
    }

    #[test]
    fn empty_decoder_output_is_skipped() {
        let source = Cursor::new(vec![1, 2, 3, 4]);
        let frames = resolver(vec![2, 2], vec![0], vec![2]);

        let mut blocks = 0;
        let stats = DecodePipeline::new(source, frames, EchoDecoder::new(1))
            .run(|_| {
                blocks += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(blocks, 1);
        assert_eq!(stats.frames_read, 2);
        assert_eq!(stats.frames_decoded, 1);
        assert_eq!(stats.samples_emitted, 2);
    }

    #[test]
    fn decode_failure_aborts() {
        let source = Cursor::new(vec![1, 2]);
        let frames = resolver(vec![2], vec![0], vec![1]);

        let err = DecodePipeline::new(source, frames, FailingDecoder)
            .run(|_| Ok(()))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[test]
    fn consumer_hangup_aborts() {
        let source = Cursor::new(vec![1, 2, 3, 4]);
        let frames = resolver(vec![2, 2], vec![0], vec![2]);

        let err = DecodePipeline::new(source, frames, EchoDecoder::new(0))
            .run(|_| Err(PipelineError::StreamClosed))
            .unwrap_err();

        assert!(matches!(err, PipelineError::StreamClosed));
    }

    #[test]
    fn range_reader_fills_across_short_reads() {
        let mut source = Cursor::new(vec![9, 8, 7, 6, 5]);
        let mut buf = [0u8; 3];
        let got = source.read_range(1, &mut buf).unwrap();
        assert_eq!(got, 3);
        assert_eq!(buf, [8, 7, 6]);

        // Reading past the end yields a short count, not an error.
        let got = source.read_range(4, &mut buf).unwrap();
        assert_eq!(got, 1);
    }
}
