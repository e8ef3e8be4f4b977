use std::fs::File;
use std::sync::mpsc;
use std::thread;

use anyhow::Result;

use mp4a::process::decode::{AacDecoder, DecodedBlock};
use mp4a::process::pipeline::{DecodePipeline, PipelineStats, Truncation};
use mp4a::process::resolve::FrameAddressResolver;
use mp4a::utils::errors::PipelineError;

/// PCM blocks buffered between the producer thread and the writer before
/// the producer blocks. Each block is one decoded access unit.
pub const PCM_CHANNEL_DEPTH: usize = 64;

pub struct ProducerConfig {
    pub media: File,
    pub frames: FrameAddressResolver,
    pub decoder: AacDecoder,
    pub truncation: Truncation,
    pub tx: mpsc::SyncSender<Result<DecodedBlock>>,
}

/// Spawns the producer: resolve frame addresses, read each access unit,
/// decode, and push PCM blocks into the bounded channel. Blocking on a full
/// channel is the backpressure that keeps memory bounded.
///
/// Fatal pipeline errors are sent through the channel so the consumer stops
/// before finalizing any output, and also returned from the thread.
pub fn spawn_producer_thread(config: ProducerConfig) -> thread::JoinHandle<Result<PipelineStats>> {
    thread::spawn(move || -> Result<PipelineStats> {
        let ProducerConfig {
            media,
            frames,
            decoder,
            truncation,
            tx,
        } = config;

        let result = DecodePipeline::new(media, frames, decoder)
            .with_truncation(truncation)
            .run(|block| {
                tx.send(Ok(block))
                    .map_err(|_| PipelineError::StreamClosed)
            });

        match result {
            Ok(stats) => {
                log::info!(
                    "Conversion complete: {} access units read, {} decoded, {} PCM samples",
                    stats.frames_read,
                    stats.frames_decoded,
                    stats.samples_emitted
                );
                Ok(stats)
            }
            Err(PipelineError::StreamClosed) => {
                // Consumer already failed and dropped the receiver; its
                // error is the one worth reporting.
                Err(PipelineError::StreamClosed.into())
            }
            Err(e) => {
                let report = anyhow::Error::new(e);
                let _ = tx.send(Err(anyhow::anyhow!("{report:#}")));
                Err(report)
            }
        }
    })
}
