use std::fmt;
use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::utils::errors::ConfigError;

/// MPEG-4 descriptor tag carrying the decoder-specific info (the Audio
/// Specific Config for AAC tracks).
pub const DEC_SPECIFIC_INFO_TAG: u8 = 0x05;

/// One descriptor from the track's `esds` descriptor tree, flattened to its
/// tag and raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl Descriptor {
    pub fn new(tag: u8, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }
}

/// The 2-byte Audio Specific Config consumed at decoder initialization.
///
/// Bit layout (big-endian): 5-bit audio object type, 4-bit sampling
/// frequency index, 4-bit channel configuration. The raw bytes are kept
/// alongside the unpacked fields because the decoder takes them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    raw: [u8; 2],
    object_type: u8,
    frequency_index: u8,
    channel_config: u8,
}

/// Sampling rates by frequency index, per ISO/IEC 14496-3. Indices 13 and
/// 14 are reserved, 15 is the explicit-frequency escape.
const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

impl AudioSpecificConfig {
    /// Unpacks the first two bytes of a decoder-specific-info payload.
    pub fn parse(payload: &[u8]) -> Result<Self, ConfigError> {
        if payload.len() < 2 {
            return Err(ConfigError::ShortPayload(payload.len()));
        }

        let raw = [payload[0], payload[1]];
        let mut reader = BitReader::endian(Cursor::new(&raw), BigEndian);

        // Reads from a 2-byte in-memory cursor cannot fail.
        let object_type: u8 = reader.read_unsigned_var(5).unwrap_or(0);
        let frequency_index: u8 = reader.read_unsigned_var(4).unwrap_or(0);
        let channel_config: u8 = reader.read_unsigned_var(4).unwrap_or(0);

        Ok(Self {
            raw,
            object_type,
            frequency_index,
            channel_config,
        })
    }

    /// Locates the decoder-specific-info descriptor among the track's codec
    /// descriptors. Exactly one must exist.
    pub fn from_descriptors(descriptors: &[Descriptor]) -> Result<Self, ConfigError> {
        let mut matches = descriptors
            .iter()
            .filter(|d| d.tag == DEC_SPECIFIC_INFO_TAG);

        let first = matches.next().ok_or(ConfigError::NoDecoderSpecificInfo)?;
        let extra = matches.count();
        if extra > 0 {
            return Err(ConfigError::AmbiguousDecoderSpecificInfo(extra + 1));
        }

        Self::parse(&first.payload)
    }

    /// The raw bytes handed to the decoder verbatim.
    pub fn bytes(&self) -> [u8; 2] {
        self.raw
    }

    pub fn object_type(&self) -> u8 {
        self.object_type
    }

    pub fn frequency_index(&self) -> u8 {
        self.frequency_index
    }

    pub fn channel_config(&self) -> u8 {
        self.channel_config
    }

    /// Sampling rate for the frequency index, if it names a fixed rate.
    pub fn sample_rate(&self) -> Result<u32, ConfigError> {
        SAMPLE_RATES
            .get(self.frequency_index as usize)
            .copied()
            .ok_or(ConfigError::UnsupportedFrequencyIndex(self.frequency_index))
    }

    /// Channel count for the channel configuration. Configuration 0 (layout
    /// carried elsewhere in the stream) is not supported.
    pub fn channels(&self) -> Result<u16, ConfigError> {
        match self.channel_config {
            1..=6 => Ok(u16::from(self.channel_config)),
            7 => Ok(8),
            other => Err(ConfigError::UnsupportedChannelConfig(other)),
        }
    }

    pub fn object_type_name(&self) -> &'static str {
        match self.object_type {
            1 => "AAC Main",
            2 => "AAC LC",
            3 => "AAC SSR",
            4 => "AAC LTP",
            5 => "SBR",
            29 => "PS",
            _ => "unknown",
        }
    }
}

impl fmt::Display for AudioSpecificConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} 0x{:02X}", self.raw[0], self.raw[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_decoder_specific_info() {
        let descriptors = [
            Descriptor::new(0x04, vec![0x40, 0x15, 0x00]),
            Descriptor::new(DEC_SPECIFIC_INFO_TAG, vec![0x12, 0x10]),
        ];

        let asc = AudioSpecificConfig::from_descriptors(&descriptors).unwrap();
        assert_eq!(asc.bytes(), [0x12, 0x10]);
    }

    #[test]
    fn missing_descriptor_is_an_error() {
        let descriptors = [Descriptor::new(0x04, vec![0x40])];
        let err = AudioSpecificConfig::from_descriptors(&descriptors).unwrap_err();
        assert!(matches!(err, ConfigError::NoDecoderSpecificInfo));
    }

    #[test]
    fn duplicate_descriptors_are_ambiguous() {
        let descriptors = [
            Descriptor::new(DEC_SPECIFIC_INFO_TAG, vec![0x12, 0x10]),
            Descriptor::new(DEC_SPECIFIC_INFO_TAG, vec![0x11, 0x90]),
        ];
        let err = AudioSpecificConfig::from_descriptors(&descriptors).unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousDecoderSpecificInfo(2)));
    }

    #[test]
    fn short_payload_is_an_error() {
        let err = AudioSpecificConfig::parse(&[0x12]).unwrap_err();
        assert!(matches!(err, ConfigError::ShortPayload(1)));
    }

    #[test]
    fn unpacks_aac_lc_stereo_44100() {
        // 0x12 0x10 = object type 2 (LC), frequency index 4, 2 channels
        let asc = AudioSpecificConfig::parse(&[0x12, 0x10]).unwrap();
        assert_eq!(asc.object_type(), 2);
        assert_eq!(asc.object_type_name(), "AAC LC");
        assert_eq!(asc.frequency_index(), 4);
        assert_eq!(asc.sample_rate().unwrap(), 44100);
        assert_eq!(asc.channels().unwrap(), 2);
    }

    #[test]
    fn unpacks_mono_48000() {
        // object type 2, frequency index 3 (48000), 1 channel
        let asc = AudioSpecificConfig::parse(&[0x11, 0x88]).unwrap();
        assert_eq!(asc.sample_rate().unwrap(), 48000);
        assert_eq!(asc.channels().unwrap(), 1);
    }

    #[test]
    fn escape_frequency_index_is_unsupported() {
        // frequency index 15 signals an explicit 24-bit rate
        let asc = AudioSpecificConfig::parse(&[0x17, 0x90]).unwrap();
        assert!(matches!(
            asc.sample_rate(),
            Err(ConfigError::UnsupportedFrequencyIndex(15))
        ));
    }
}
