use crate::utils::errors::TableError;

/// One `stsc` run entry: `samples_per_chunk` applies to every chunk from
/// `first_chunk` (1-based, container convention) up to the next entry's
/// `first_chunk`, exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRun {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
}

/// Chunk start offsets plus the per-chunk sample counts.
///
/// Held in expanded form: exactly one sample count per physical chunk.
/// Compressed run ranges are expanded once at construction by
/// [`ChunkLayoutTable::from_runs`], so downstream consumers can index the
/// count table directly by chunk index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayoutTable {
    offsets: Vec<u64>,
    samples_per_chunk: Vec<u32>,
}

impl ChunkLayoutTable {
    /// Builds a table from pre-expanded, one-entry-per-chunk counts.
    pub fn new(offsets: Vec<u64>, samples_per_chunk: Vec<u32>) -> Result<Self, TableError> {
        if offsets.len() != samples_per_chunk.len() {
            return Err(TableError::RunCountMismatch {
                offsets: offsets.len(),
                runs: samples_per_chunk.len(),
            });
        }
        if let Some(chunk) = samples_per_chunk.iter().position(|&n| n == 0) {
            return Err(TableError::EmptyChunkRun { chunk });
        }
        Ok(Self {
            offsets,
            samples_per_chunk,
        })
    }

    /// Builds a table from compressed `stsc`-style run entries, expanding
    /// each range to one count per chunk.
    pub fn from_runs(offsets: Vec<u64>, runs: &[ChunkRun]) -> Result<Self, TableError> {
        let chunk_count = offsets.len();
        let mut expanded = vec![0u32; chunk_count];

        let mut prev_first = 0u32;
        for (index, run) in runs.iter().enumerate() {
            if run.first_chunk < 1 || run.first_chunk as usize > chunk_count {
                return Err(TableError::RunOutOfRange {
                    index,
                    first_chunk: run.first_chunk,
                    max: chunk_count,
                });
            }
            if run.first_chunk <= prev_first {
                return Err(TableError::RunNotIncreasing(run.first_chunk, prev_first));
            }
            if index == 0 && run.first_chunk != 1 {
                return Err(TableError::RunOutOfRange {
                    index,
                    first_chunk: run.first_chunk,
                    max: 1,
                });
            }
            prev_first = run.first_chunk;

            // A bogus next entry is rejected on its own iteration; clamp so
            // this one cannot index out of range before that happens.
            let start = run.first_chunk as usize - 1;
            let end = runs
                .get(index + 1)
                .map(|next| (next.first_chunk as usize).saturating_sub(1).clamp(start, chunk_count))
                .unwrap_or(chunk_count);
            expanded[start..end].fill(run.samples_per_chunk);
        }

        Self::new(offsets, expanded)
    }

    pub fn chunk_count(&self) -> usize {
        self.offsets.len()
    }

    /// Absolute byte offset of chunk `chunk`'s first sample.
    pub fn offset_of(&self, chunk: usize) -> Option<u64> {
        self.offsets.get(chunk).copied()
    }

    /// Sample count stored in chunk `chunk`.
    pub fn samples_in(&self, chunk: usize) -> Option<u32> {
        self.samples_per_chunk.get(chunk).copied()
    }

    /// Total sample count covered by all chunks.
    pub fn total_samples(&self) -> u64 {
        self.samples_per_chunk.iter().map(|&n| u64::from(n)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_run_ranges_to_one_entry_per_chunk() {
        let offsets = vec![100, 300, 500, 700];
        let runs = [
            ChunkRun {
                first_chunk: 1,
                samples_per_chunk: 2,
            },
            ChunkRun {
                first_chunk: 3,
                samples_per_chunk: 1,
            },
        ];

        let table = ChunkLayoutTable::from_runs(offsets, &runs).unwrap();
        assert_eq!(table.chunk_count(), 4);
        assert_eq!(table.samples_in(0), Some(2));
        assert_eq!(table.samples_in(1), Some(2));
        assert_eq!(table.samples_in(2), Some(1));
        assert_eq!(table.samples_in(3), Some(1));
        assert_eq!(table.total_samples(), 6);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = ChunkLayoutTable::new(vec![100, 200], vec![1]).unwrap_err();
        assert!(matches!(
            err,
            TableError::RunCountMismatch { offsets: 2, runs: 1 }
        ));
    }

    #[test]
    fn rejects_zero_sample_run() {
        let err = ChunkLayoutTable::new(vec![100, 200], vec![3, 0]).unwrap_err();
        assert!(matches!(err, TableError::EmptyChunkRun { chunk: 1 }));
    }

    #[test]
    fn rejects_run_not_starting_at_first_chunk() {
        let runs = [ChunkRun {
            first_chunk: 2,
            samples_per_chunk: 1,
        }];
        let err = ChunkLayoutTable::from_runs(vec![100, 200], &runs).unwrap_err();
        assert!(matches!(err, TableError::RunOutOfRange { .. }));
    }

    #[test]
    fn rejects_non_increasing_runs() {
        let runs = [
            ChunkRun {
                first_chunk: 1,
                samples_per_chunk: 1,
            },
            ChunkRun {
                first_chunk: 1,
                samples_per_chunk: 2,
            },
        ];
        let err = ChunkLayoutTable::from_runs(vec![100, 200], &runs).unwrap_err();
        assert!(matches!(err, TableError::RunNotIncreasing(1, 1)));
    }
}
