/// Per-sample byte lengths for one track, in decode order.
///
/// Mirrors the `stsz` box: either one explicit length per sample or a single
/// constant length applied to every sample. Indexing is zero-based even
/// though container tables count from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSizeTable {
    sizes: Vec<u32>,
}

impl SampleSizeTable {
    /// Builds a table from explicit per-sample sizes.
    pub fn from_sizes(sizes: Vec<u32>) -> Self {
        Self { sizes }
    }

    /// Builds a table for the constant-size encoding (`sample_size != 0`).
    pub fn constant(size: u32, count: u32) -> Self {
        Self {
            sizes: vec![size; count as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Byte length of the sample at `index`, if it exists.
    pub fn size_of(&self, index: usize) -> Option<u32> {
        self.sizes.get(index).copied()
    }

    /// Total media bytes covered by the track.
    pub fn total_bytes(&self) -> u64 {
        self.sizes.iter().map(|&s| u64::from(s)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.sizes.iter().copied()
    }
}
