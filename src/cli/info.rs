use anyhow::Result;
use serde::Serialize;

use mp4a::structs::esds::AudioSpecificConfig;

use super::command::{Cli, InfoArgs};
use crate::input::AudioTrack;
use crate::timestamp::time_str;

/// PCM frames per AAC access unit (long-window AAC-LC).
const SAMPLES_PER_ACCESS_UNIT: u64 = 1024;

#[derive(Debug, Serialize)]
struct TrackReport {
    track_id: u32,
    sample_count: usize,
    chunk_count: usize,
    media_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    codec_config: Option<CodecReport>,
}

#[derive(Debug, Serialize)]
struct CodecReport {
    audio_specific_config: String,
    object_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_duration: Option<String>,
}

pub fn cmd_info(args: &InfoArgs, _cli: &Cli) -> Result<()> {
    log::info!("Analyzing audio track: {}", args.input.display());

    let track = AudioTrack::open(&args.input)?;

    let codec_config = match AudioSpecificConfig::from_descriptors(&track.descriptors) {
        Ok(asc) => Some(codec_report(&asc, track.sizes.len() as u64)),
        Err(e) => {
            log::warn!("No usable codec configuration: {e}");
            None
        }
    };

    let report = TrackReport {
        track_id: track.track_id,
        sample_count: track.sizes.len(),
        chunk_count: track.layout.chunk_count(),
        media_bytes: track.sizes.total_bytes(),
        codec_config,
    };

    print!("{}", serde_yaml_ng::to_string(&report)?);
    Ok(())
}

fn codec_report(asc: &AudioSpecificConfig, sample_count: u64) -> CodecReport {
    let sample_rate = asc.sample_rate().ok();
    let estimated_duration = sample_rate.map(|rate| {
        let secs = (sample_count * SAMPLES_PER_ACCESS_UNIT) as f64 / rate as f64;
        time_str(secs)
    });

    CodecReport {
        audio_specific_config: asc.to_string(),
        object_type: asc.object_type_name().to_string(),
        sample_rate,
        channels: asc.channels().ok(),
        estimated_duration,
    }
}
