use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use indicatif::ProgressBar;

use mp4a::process::decode::DecodedBlock;

use crate::timestamp::time_str;
use crate::wav::WavWriter;

/// Output format the writer falls back to when the stream decodes to
/// nothing, taken from the Audio Specific Config.
#[derive(Debug, Clone, Copy)]
pub struct FallbackFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

pub struct BlockHandlerContext<'a> {
    pub pb: &'a Option<ProgressBar>,
    pub start_time: Instant,
}

/// Consumer-side state: creates the WAV writer lazily on the first decoded
/// block (the decoder's reported format wins over container guesses) and
/// tracks counters for the final report.
pub struct ConvertHandler {
    output_path: PathBuf,
    sample_rate_override: Option<u32>,
    fallback: FallbackFormat,
    writer: Option<WavWriter<File>>,
    pub decoded_blocks: u64,
    pub decoded_samples: u64,
    pub final_sample_rate: u32,
}

/// PCM bit depth of the WAV output.
const BITS_PER_SAMPLE: u16 = 32;

impl ConvertHandler {
    pub fn new(
        output_path: PathBuf,
        sample_rate_override: Option<u32>,
        fallback: FallbackFormat,
    ) -> Self {
        let final_sample_rate = sample_rate_override.unwrap_or(fallback.sample_rate);
        Self {
            output_path,
            sample_rate_override,
            fallback,
            writer: None,
            decoded_blocks: 0,
            decoded_samples: 0,
            final_sample_rate,
        }
    }

    pub fn handle_block(&mut self, block: DecodedBlock, ctx: &BlockHandlerContext) -> Result<()> {
        if self.writer.is_none() {
            let sample_rate = self.sample_rate_override.unwrap_or(block.sample_rate);
            self.create_writer(sample_rate, block.channels)?;
        }

        self.decoded_blocks += 1;
        self.decoded_samples += block.frame_count() as u64;

        if let Some(ref mut writer) = self.writer {
            writer.write_pcm(&block.samples)?;
        }

        if let Some(pb) = ctx.pb {
            pb.inc(1);
            if self.decoded_blocks % 30 == 0 {
                let elapsed = ctx.start_time.elapsed();
                let audio_secs = self.decoded_samples as f64 / self.final_sample_rate as f64;
                let speed = audio_secs / elapsed.as_secs_f64();
                pb.set_message(format!(
                    "speed: {speed:.1}x | timestamp: {}",
                    time_str(audio_secs)
                ));
            }
        }

        Ok(())
    }

    /// Finalizes the output file. A stream that produced no PCM still gets
    /// a valid, empty WAV in the fallback format.
    pub fn finalize(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let (rate, channels) = (self.final_sample_rate, self.fallback.channels);
            log::info!("No PCM produced; writing an empty WAV file");
            self.create_writer(rate, channels)?;
        }

        if let Some(ref mut writer) = self.writer {
            writer.finish()?;
            let stats = writer.stats();
            log::info!(
                "Wrote {} ({} PCM bytes, {} Hz, {} channels)",
                self.output_path.display(),
                stats.data_written,
                stats.sample_rate,
                stats.channels
            );
        }
        Ok(())
    }

    /// Drops the writer without finalizing and removes the partial file, so
    /// a failed conversion never leaves something that looks like a WAV.
    pub fn discard(&mut self) {
        if self.writer.take().is_some() {
            if let Err(e) = std::fs::remove_file(&self.output_path) {
                log::warn!(
                    "Failed to remove partial output {}: {e}",
                    self.output_path.display()
                );
            } else {
                log::info!("Removed partial output {}", self.output_path.display());
            }
        }
    }

    fn create_writer(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        log::info!(
            "Creating WAV file: {} ({sample_rate} Hz, {channels} channels, {BITS_PER_SAMPLE}-bit)",
            self.output_path.display()
        );
        let mut writer = WavWriter::new(File::create(&self.output_path)?);
        writer.configure_audio_format(sample_rate, channels, BITS_PER_SAMPLE)?;
        writer.write_header()?;

        self.final_sample_rate = sample_rate;
        self.writer = Some(writer);
        Ok(())
    }
}
