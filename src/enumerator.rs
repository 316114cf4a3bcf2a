//! Enumeration of TM indices, raw or reduced, and their partitioning into worker chunks.
//!
//! Both sets are closed-form ranges of `u128` — unlike the project's own `EnumeratorBinary`,
//! which cycles permutation fields incrementally, decoding a canonical index (`encoder::decode`)
//! is `O(1)`, so chunk generation never needs to carry state between batches.

use std::ops::Range;

use crate::encoder::{base, raw_space_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationMode {
    Raw,
    Reduced,
}

/// Describes one of the contiguous index ranges that make up raw or reduced enumeration for a
/// given `n_states`, and splits it into batch-sized chunks for the parallel driver.
#[derive(Debug, Clone)]
pub struct Enumerator {
    n_states: usize,
    mode: EnumerationMode,
    /// The sub-ranges that together make up this enumeration. Raw enumeration is one range;
    /// reduced enumeration is the union of `2*(n-1)` subspaces (empty for n=1).
    ranges: Vec<Range<u128>>,
}

impl Enumerator {
    pub fn new(n_states: usize, mode: EnumerationMode) -> Self {
        let ranges = match mode {
            EnumerationMode::Raw => vec![0..raw_space_size(n_states)],
            EnumerationMode::Reduced => reduced_ranges(n_states),
        };
        Self {
            n_states,
            mode,
            ranges,
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn mode(&self) -> EnumerationMode {
        self.mode
    }

    /// Total number of machines covered by this enumeration.
    pub fn size(&self) -> u128 {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    /// Splits the enumeration into contiguous chunks of at most `batch_size`, skipping the
    /// first `skip` indices in enumeration order (used to resume from a checkpoint). No machine
    /// appears in two chunks, and a chunk never straddles a subspace boundary.
    pub fn chunks(&self, batch_size: u128, skip: u128) -> Vec<Range<u128>> {
        assert!(batch_size > 0, "batch_size must be positive");
        let mut remaining_skip = skip;
        let mut chunks = Vec::new();
        for range in &self.ranges {
            let len = range.end - range.start;
            if remaining_skip >= len {
                remaining_skip -= len;
                continue;
            }
            let start = range.start + remaining_skip;
            remaining_skip = 0;
            let mut lo = start;
            while lo < range.end {
                let hi = (lo + batch_size).min(range.end);
                chunks.push(lo..hi);
                lo = hi;
            }
        }
        chunks
    }
}

/// Subspace size `S = b^(2n-1)` for reduced enumeration. Multiplying `S` by the number of
/// allowed initial digits (`2*(n-1)`) yields `|reduced(n)|`.
pub fn subspace_size(n_states: usize) -> u128 {
    if n_states == 0 {
        return 0;
    }
    base(n_states).pow(2 * n_states as u32 - 1)
}

fn reduced_ranges(n_states: usize) -> Vec<Range<u128>> {
    if n_states <= 1 {
        return Vec::new();
    }
    let s = subspace_size(n_states);
    // Allowed initial digit codes: next_state in {2..=n}, write_idx in {0,1}, move = Right (move_idx=1).
    // digit_code = 2 + (next_state-1)*4 + write_idx*2 + 1, for next_state in 2..=n.
    let mut ranges = Vec::with_capacity(2 * (n_states - 1));
    for next_state in 2..=n_states as u32 {
        for write_idx in 0..2u32 {
            let code = 2 + (next_state - 1) * 4 + write_idx * 2 + 1;
            let offset = code as u128 * s;
            ranges.push(offset..offset + s);
        }
    }
    ranges
}
