use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Result;
use indicatif::MultiProgress;

use mp4a::process::decode::AacDecoder;
use mp4a::process::pipeline::Truncation;
use mp4a::process::resolve::FrameAddressResolver;
use mp4a::structs::esds::AudioSpecificConfig;

use super::handler::{BlockHandlerContext, ConvertHandler, FallbackFormat};
use super::producer::{PCM_CHANNEL_DEPTH, ProducerConfig, spawn_producer_thread};
use super::progress::{create_progress_bar, finalize_progress_bar};
use crate::cli::command::{Cli, ConvertArgs};
use crate::input::AudioTrack;

pub fn cmd_convert(args: &ConvertArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Converting audio track: {} (strict mode: {})",
        args.input.display(),
        cli.strict
    );

    let track = AudioTrack::open(&args.input)?;

    let asc = AudioSpecificConfig::from_descriptors(&track.descriptors)?;
    log::info!(
        "Audio Specific Config: {asc} ({}, {} Hz, {} channels)",
        asc.object_type_name(),
        asc.sample_rate().map(|r| r.to_string()).unwrap_or_else(|_| "?".into()),
        asc.channels().map(|c| c.to_string()).unwrap_or_else(|_| "?".into()),
    );

    let frames = FrameAddressResolver::new(track.sizes, track.layout)?;
    let total_frames = frames.frame_count() as u64;
    log::info!(
        "Track {}: {total_frames} access units, {} media bytes",
        track.track_id,
        frames.media_bytes()
    );

    // Initialized exactly once, before any frame is read; an unsupported
    // configuration aborts here with no output file created.
    let decoder = AacDecoder::try_new(&asc)?;

    let output_path = resolve_output_path(args);
    log::info!("Output path: {}", output_path.display());

    let truncation = if cli.strict {
        Truncation::Fail
    } else {
        Truncation::Tolerate
    };

    let pb = if let Some(multi) = multi {
        Some(create_progress_bar(multi, total_frames)?)
    } else {
        None
    };

    let (tx, rx) = mpsc::sync_channel(PCM_CHANNEL_DEPTH);

    let producer_thread = spawn_producer_thread(ProducerConfig {
        media: track.media,
        frames,
        decoder,
        truncation,
        tx,
    });

    let fallback = FallbackFormat {
        sample_rate: asc.sample_rate().unwrap_or(44100),
        channels: asc.channels().unwrap_or(1),
    };
    let mut handler = ConvertHandler::new(output_path, args.sample_rate, fallback);
    let start_time = std::time::Instant::now();

    while let Ok(result) = rx.recv() {
        match result {
            Ok(block) => {
                let ctx = BlockHandlerContext {
                    pb: &pb,
                    start_time,
                };
                if let Err(e) = handler.handle_block(block, &ctx) {
                    handler.discard();
                    if let Some(pb) = pb {
                        pb.finish_with_message("conversion failed");
                    }
                    return Err(e);
                }
            }
            Err(e) => {
                handler.discard();
                if let Some(pb) = pb {
                    pb.finish_with_message("conversion failed");
                }
                return Err(e);
            }
        }
    }

    // Channel closed: the producer is done. Its result decides whether the
    // output is finalized or thrown away.
    match producer_thread.join() {
        Ok(Ok(stats)) => {
            if stats.truncated {
                log::warn!("Source ended early; the output covers the decoded prefix only");
            }
            handler.finalize()?;
            finalize_progress_bar(
                &pb,
                handler.decoded_samples,
                handler.final_sample_rate,
                start_time,
            );
            log::info!("Conversion completed successfully");
            Ok(())
        }
        Ok(Err(e)) => {
            handler.discard();
            if let Some(pb) = pb {
                pb.finish_with_message("conversion failed");
            }
            Err(e)
        }
        Err(_) => {
            handler.discard();
            if let Some(pb) = pb {
                pb.finish_with_message("producer thread panicked");
            }
            Err(anyhow::anyhow!("Producer thread panicked"))
        }
    }
}

fn resolve_output_path(args: &ConvertArgs) -> PathBuf {
    match args.output_path {
        Some(ref path) => path.clone(),
        None => args.input.with_extension("wav"),
    }
}
