use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use mp4::{MediaType, Mp4Track};

use mp4a::structs::chunk::{ChunkLayoutTable, ChunkRun};
use mp4a::structs::esds::{DEC_SPECIFIC_INFO_TAG, Descriptor};
use mp4a::structs::sample::SampleSizeTable;

/// One AAC audio track lifted out of the container: the metadata tables the
/// core consumes, the flattened codec descriptors, and an independent file
/// handle for random-access media reads.
pub struct AudioTrack {
    pub track_id: u32,
    pub sizes: SampleSizeTable,
    pub layout: ChunkLayoutTable,
    pub descriptors: Vec<Descriptor>,
    pub media: File,
}

impl AudioTrack {
    /// Parses the container's box tree and extracts the first AAC track.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        let size = file.metadata()?.len();
        let mp4 = mp4::Mp4Reader::read_header(BufReader::new(file), size)
            .with_context(|| format!("Failed to parse MP4 container {}", path.display()))?;

        // Lowest track id wins when the container carries several.
        let track = mp4
            .tracks()
            .values()
            .filter(|t| matches!(t.media_type(), Ok(MediaType::AAC)))
            .min_by_key(|t| t.track_id())
            .ok_or_else(|| anyhow!("No AAC audio track in {}", path.display()))?;
        let track_id = track.track_id();
        log::debug!("Selected audio track {track_id}");

        let sizes = sample_size_table(track);
        let layout = chunk_layout_table(track)?;
        let descriptors = codec_descriptors(track);

        // Separate handle: the parse reader's buffer position is unrelated
        // to the media-data reads the pipeline will issue.
        let media = File::open(path)?;

        Ok(Self {
            track_id,
            sizes,
            layout,
            descriptors,
            media,
        })
    }
}

fn sample_size_table(track: &Mp4Track) -> SampleSizeTable {
    let stsz = &track.trak.mdia.minf.stbl.stsz;
    if stsz.sample_size > 0 {
        SampleSizeTable::constant(stsz.sample_size, stsz.sample_count)
    } else {
        SampleSizeTable::from_sizes(stsz.sample_sizes.clone())
    }
}

fn chunk_layout_table(track: &Mp4Track) -> Result<ChunkLayoutTable> {
    let stbl = &track.trak.mdia.minf.stbl;

    let offsets: Vec<u64> = if let Some(ref co64) = stbl.co64 {
        co64.entries.clone()
    } else if let Some(ref stco) = stbl.stco {
        stco.entries.iter().map(|&o| u64::from(o)).collect()
    } else {
        return Err(anyhow!("Track {} has no chunk offset table", track.track_id()));
    };

    let runs: Vec<ChunkRun> = stbl
        .stsc
        .entries
        .iter()
        .map(|e| ChunkRun {
            first_chunk: e.first_chunk,
            samples_per_chunk: e.samples_per_chunk,
        })
        .collect();

    ChunkLayoutTable::from_runs(offsets, &runs)
        .with_context(|| format!("Malformed chunk tables on track {}", track.track_id()))
}

/// Flattens the track's esds descriptor tree into tagged raw payloads.
///
/// The mp4 crate parses the decoder-specific-info payload into its three
/// ASC bitfields; re-packing them reproduces the original two bytes
/// exactly, since a 2-byte ASC holds nothing else.
fn codec_descriptors(track: &Mp4Track) -> Vec<Descriptor> {
    let esds = match track
        .trak
        .mdia
        .minf
        .stbl
        .stsd
        .mp4a
        .as_ref()
        .and_then(|mp4a| mp4a.esds.as_ref())
    {
        Some(esds) => esds,
        None => return Vec::new(),
    };

    let dec_specific = &esds.es_desc.dec_config.dec_specific;
    let b0 = (dec_specific.profile << 3) | (dec_specific.freq_index >> 1);
    let b1 = ((dec_specific.freq_index & 1) << 7) | (dec_specific.chan_conf << 3);

    vec![Descriptor::new(DEC_SPECIFIC_INFO_TAG, vec![b0, b1])]
}
