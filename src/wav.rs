use std::io::{self, BufWriter, Seek, SeekFrom, Write};

const RIFF_HEADER_BYTES: u64 = 36;

/// RIFF/WAVE file writer for 32-bit integer PCM.
///
/// The RIFF and data chunk sizes are patched in `finish`; a file that was
/// never finished is deliberately not a valid WAV.
pub struct WavWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    riff_size_position: u64,
    data_size_position: u64,
    data_written: u64,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            riff_size_position: 0,
            data_size_position: 0,
            data_written: 0,
            sample_rate: 44100,
            channels: 1,
            bits_per_sample: 32,
        }
    }

    /// Configure audio format parameters
    pub fn configure_audio_format(
        &mut self,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> io::Result<()> {
        if self.data_written > 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot change format after writing data",
            ));
        }

        self.sample_rate = sample_rate;
        self.channels = channels;
        self.bits_per_sample = bits_per_sample;
        Ok(())
    }

    /// Write the RIFF/WAVE header with placeholder sizes
    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(b"RIFF")?;
        self.riff_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // RIFF size (patched in finish)
        self.writer.write_all(b"WAVE")?;

        self.writer.write_all(b"fmt ")?;
        self.writer.write_all(&16u32.to_le_bytes())?;
        self.writer.write_all(&1u16.to_le_bytes())?; // PCM format
        self.writer.write_all(&self.channels.to_le_bytes())?;
        self.writer.write_all(&self.sample_rate.to_le_bytes())?;

        let bytes_per_frame = u32::from(self.channels) * u32::from(self.bits_per_sample / 8);
        let byte_rate = self.sample_rate * bytes_per_frame;
        self.writer.write_all(&byte_rate.to_le_bytes())?;
        self.writer
            .write_all(&(bytes_per_frame as u16).to_le_bytes())?;
        self.writer.write_all(&self.bits_per_sample.to_le_bytes())?;

        self.writer.write_all(b"data")?;
        self.data_size_position = self.writer.stream_position()?;
        self.writer.write_all(&0u32.to_le_bytes())?; // Data size (patched in finish)

        Ok(())
    }

    /// Write interleaved PCM samples as 32-bit little-endian
    pub fn write_pcm(&mut self, samples: &[i32]) -> io::Result<()> {
        for &sample in samples {
            self.writer.write_all(&sample.to_le_bytes())?;
            self.data_written += 4;
        }
        Ok(())
    }

    /// Finish writing and patch the header sizes
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;

        let current_pos = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(self.data_size_position))?;
        self.writer
            .write_all(&(self.data_written as u32).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(self.riff_size_position))?;
        let riff_size = RIFF_HEADER_BYTES + self.data_written;
        self.writer.write_all(&(riff_size as u32).to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(current_pos))?;
        self.writer.flush()?;

        Ok(())
    }

    /// Get the underlying writer
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    /// Get statistics about written data
    pub fn stats(&self) -> WavStats {
        WavStats {
            data_written: self.data_written,
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        }
    }
}

/// Statistics about WAV file writing
#[derive(Debug, Clone)]
pub struct WavStats {
    pub data_written: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() -> io::Result<()> {
        let cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(cursor);

        writer.configure_audio_format(48000, 2, 32)?;
        writer.write_header()?;

        let buffer = writer.into_inner()?.into_inner();

        assert_eq!(&buffer[0..4], b"RIFF");
        assert_eq!(&buffer[8..12], b"WAVE");
        assert_eq!(&buffer[12..16], b"fmt ");
        assert_eq!(&buffer[36..40], b"data");
        // channels and sample rate inside the fmt chunk
        assert_eq!(u16::from_le_bytes([buffer[22], buffer[23]]), 2);
        assert_eq!(
            u32::from_le_bytes([buffer[24], buffer[25], buffer[26], buffer[27]]),
            48000
        );

        Ok(())
    }

    #[test]
    fn test_sample_write_and_finish() -> io::Result<()> {
        let cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(cursor);

        writer.configure_audio_format(44100, 1, 32)?;
        writer.write_header()?;

        let samples = vec![0x123456i32, -0x789ABCi32, 42];
        writer.write_pcm(&samples)?;

        let stats = writer.stats();
        assert_eq!(stats.data_written, 12);

        writer.finish()?;
        let buffer = writer.into_inner()?.into_inner();

        // Patched sizes: data chunk and RIFF chunk
        assert_eq!(
            u32::from_le_bytes([buffer[40], buffer[41], buffer[42], buffer[43]]),
            12
        );
        assert_eq!(
            u32::from_le_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]),
            36 + 12
        );
        assert_eq!(buffer.len(), 44 + 12);

        Ok(())
    }

    #[test]
    fn test_format_locked_after_data() -> io::Result<()> {
        let cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(cursor);

        writer.write_header()?;
        writer.write_pcm(&[1])?;

        assert!(writer.configure_audio_format(48000, 2, 32).is_err());
        Ok(())
    }
}
