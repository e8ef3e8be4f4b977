use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_AAC, CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;

use crate::structs::esds::AudioSpecificConfig;
use crate::utils::errors::DecoderError;

/// PCM produced by one decode call: interleaved 32-bit samples plus the
/// signal parameters the decoder reported for them.
///
/// A block may be empty (codec priming); empty blocks carry no PCM and are
/// skipped by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    pub samples: Vec<i32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedBlock {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// PCM frames in this block (samples per channel).
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// Stateful block decoder consuming raw access units in strict decode order.
///
/// The decoder carries bitstream state across calls; it must be fed every
/// access unit exactly once, in order, by a single owner.
pub trait AccessUnitDecoder {
    fn decode(&mut self, access_unit: &[u8]) -> Result<DecodedBlock, DecoderError>;
}

/// AAC access-unit decoder backed by symphonia.
///
/// Initialized exactly once from the 2-byte Audio Specific Config; an
/// unsupported configuration fails here, before any frame is read.
pub struct AacDecoder {
    inner: Box<dyn Decoder>,
    sample_buf: Option<SampleBuffer<i32>>,
    units_decoded: u64,
}

impl AacDecoder {
    pub fn try_new(config: &AudioSpecificConfig) -> Result<Self, DecoderError> {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_AAC)
            .with_extra_data(config.bytes().to_vec().into_boxed_slice());
        if let Ok(rate) = config.sample_rate() {
            params.with_sample_rate(rate);
        }

        let inner = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(DecoderError::Init)?;

        Ok(Self {
            inner,
            sample_buf: None,
            units_decoded: 0,
        })
    }

    /// Releases decoder state. Consumed by value so no further decode call
    /// can follow teardown.
    pub fn finish(mut self) {
        let _ = self.inner.finalize();
    }
}

impl AccessUnitDecoder for AacDecoder {
    fn decode(&mut self, access_unit: &[u8]) -> Result<DecodedBlock, DecoderError> {
        let packet = Packet::new_from_slice(0, self.units_decoded, 0, access_unit);
        let decoded = self
            .inner
            .decode(&packet)
            .map_err(|source| DecoderError::Bitstream {
                index: self.units_decoded,
                source,
            })?;
        self.units_decoded += 1;

        let spec = *decoded.spec();
        let channels = spec.channels.count() as u16;
        let sample_rate = spec.rate;

        if decoded.frames() == 0 {
            return Ok(DecodedBlock {
                samples: Vec::new(),
                channels,
                sample_rate,
            });
        }

        let needed = decoded.frames() * spec.channels.count();
        let buf = match self.sample_buf.take() {
            Some(buf) if buf.capacity() >= needed => self.sample_buf.insert(buf),
            _ => self
                .sample_buf
                .insert(SampleBuffer::new(decoded.capacity() as u64, spec)),
        };
        buf.copy_interleaved_ref(decoded);

        Ok(DecodedBlock {
            samples: buf.samples().to_vec(),
            channels,
            sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::esds::AudioSpecificConfig;

    #[test]
    fn initializes_from_aac_lc_config() {
        let asc = AudioSpecificConfig::parse(&[0x12, 0x10]).unwrap();
        assert!(AacDecoder::try_new(&asc).is_ok());
    }

    #[test]
    fn empty_block_reports_zero_frames() {
        let block = DecodedBlock {
            samples: Vec::new(),
            channels: 2,
            sample_rate: 44100,
        };
        assert!(block.is_empty());
        assert_eq!(block.frame_count(), 0);
    }

    #[test]
    fn frame_count_divides_by_channels() {
        let block = DecodedBlock {
            samples: vec![0; 2048],
            channels: 2,
            sample_rate: 44100,
        };
        assert_eq!(block.frame_count(), 1024);
    }
}
