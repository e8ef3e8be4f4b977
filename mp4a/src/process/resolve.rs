use crate::structs::chunk::ChunkLayoutTable;
use crate::structs::sample::SampleSizeTable;
use crate::utils::errors::TableError;

/// Resolved byte range of one access unit inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub offset: u64,
    pub size: u64,
}

/// Walks the sample-size and chunk-layout tables together and yields the
/// absolute `(offset, size)` of every access unit, in decode order.
///
/// No single table can produce these addresses on its own: sample sizes say
/// how long each access unit is, the chunk layout says where runs of them
/// start. The resolver keeps a byte cursor that accumulates sample sizes
/// within a chunk and snaps to the next recorded chunk offset when the
/// chunk's sample quota is spent.
///
/// The sequence is lazy, finite and forward-only; build a new resolver to
/// iterate again.
#[derive(Debug)]
pub struct FrameAddressResolver {
    sizes: SampleSizeTable,
    layout: ChunkLayoutTable,
    sample_index: usize,
    chunk_index: usize,
    samples_in_chunk: u32,
    byte_cursor: u64,
}

impl FrameAddressResolver {
    /// Validates that both tables describe the same track before any frame
    /// is produced: the chunk runs must cover exactly the sample count.
    pub fn new(sizes: SampleSizeTable, layout: ChunkLayoutTable) -> Result<Self, TableError> {
        let samples = sizes.len() as u64;
        let chunk_samples = layout.total_samples();
        if samples != chunk_samples {
            return Err(TableError::SampleCountMismatch {
                samples,
                chunk_samples,
            });
        }

        let byte_cursor = layout.offset_of(0).unwrap_or(0);
        Ok(Self {
            sizes,
            layout,
            sample_index: 0,
            chunk_index: 0,
            samples_in_chunk: 0,
            byte_cursor,
        })
    }

    /// Total number of frames the full sequence will yield.
    pub fn frame_count(&self) -> usize {
        self.sizes.len()
    }

    /// Total media bytes the full sequence will cover.
    pub fn media_bytes(&self) -> u64 {
        self.sizes.total_bytes()
    }
}

impl Iterator for FrameAddressResolver {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let size = self.sizes.size_of(self.sample_index)?;

        // Current chunk spent: snap the cursor to the next recorded offset.
        // Validation guarantees an offset exists while samples remain.
        if self.samples_in_chunk == self.layout.samples_in(self.chunk_index)? {
            self.chunk_index += 1;
            self.samples_in_chunk = 0;
            self.byte_cursor = self.layout.offset_of(self.chunk_index)?;
        }

        let frame = Frame {
            offset: self.byte_cursor,
            size: u64::from(size),
        };

        self.byte_cursor += u64::from(size);
        self.samples_in_chunk += 1;
        self.sample_index += 1;

        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sizes.len() - self.sample_index;
        (remaining, Some(remaining))
    }
}
