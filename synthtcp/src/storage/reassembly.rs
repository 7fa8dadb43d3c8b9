use core::fmt;
use alloc::vec::Vec;

use crate::wire::{SeqNumber, seq_gt};

/// A contiguous range of received but not yet deliverable sequence space.
///
/// The data itself is never stored. Traffic is synthetic, only the range and whether it ends in a
/// FIN matter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// Sequence number of the first octet.
    pub seq: SeqNumber,
    /// Number of octets in the range.
    pub len: u32,
    /// If the range is terminated by a FIN.
    pub fin: bool,
}

/// The accounting of a single `Reassembly::insert`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Insertion {
    /// Number of merged segments that were entirely duplicate.
    pub dup_packs: u32,
    /// Octets of entirely duplicate segments.
    pub dup_bytes: u32,
    /// Number of merged segments that overlapped only partially.
    pub part_dup_packs: u32,
    /// Octets the partially overlapping segments added.
    pub part_dup_bytes: u32,
    /// The highest block evicted because the queue overflowed.
    pub dropped: Option<Block>,
    /// Length of the block now containing the inserted range, `0` if that was evicted.
    pub len: u32,
}

/// An ordered list of non-touching sequence ranges.
///
/// Blocks are sorted by their start and there is a gap of at least one octet between consecutive
/// ones, anything closer is merged on insertion. The number of blocks is bounded by a limit chosen
/// at construction; inserting beyond it evicts the block with the highest sequence number since it
/// is the one that will be needed last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reassembly {
    blocks: Vec<Block>,
    limit: usize,
    max_used: usize,
}

impl Block {
    /// The sequence number after the last octet.
    pub fn end(&self) -> SeqNumber {
        self.seq + self.len
    }

    /// Merge `next`, which must not start before `self`, into `self`.
    ///
    /// Returns `false` and leaves both untouched if there is a gap between them.
    fn merge(&mut self, next: &Block, insertion: &mut Insertion) -> bool {
        let diff = self.end() - next.seq;
        if diff < 0 {
            return false;
        }

        let diff = diff as u32;
        if diff > 0 {
            if diff >= next.len {
                insertion.dup_packs += 1;
                insertion.dup_bytes += next.len;
            } else {
                insertion.part_dup_packs += 1;
                insertion.part_dup_bytes += next.len - diff;
            }
        }

        if next.len >= diff {
            self.len += next.len - diff;
            self.fin |= next.fin;
        }

        true
    }
}

impl Reassembly {
    /// Create an empty queue holding at most `limit` blocks.
    ///
    /// A limit of `0` does not bound the queue.
    pub fn new(limit: usize) -> Self {
        Reassembly {
            blocks: Vec::with_capacity(limit.saturating_add(1).min(64)),
            limit,
            max_used: 0,
        }
    }

    /// The configured maximum number of blocks.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The current number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// If no block is queued.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The largest number of blocks that was held at any time.
    pub fn max_used(&self) -> usize {
        self.max_used
    }

    /// All blocks, sorted.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block with the lowest sequence number.
    pub fn front(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// Add a range to the queue, merging it with any range it overlaps or touches.
    pub fn insert(&mut self, block: Block) -> Insertion {
        let mut insertion = Insertion::default();

        if self.blocks.is_empty() {
            self.blocks.push(block);
            insertion.len = block.len;
            self.max_used = self.max_used.max(1);
            return insertion;
        }

        // First block starting strictly after the new one.
        let upper = self.blocks
            .iter()
            .position(|other| seq_gt(other.seq, block.seq))
            .unwrap_or(self.blocks.len());

        let at = if upper > 0 && self.blocks[upper - 1].merge(&block, &mut insertion) {
            upper - 1
        } else {
            self.blocks.insert(upper, block);
            upper
        };

        // Absorb all following blocks the grown one now reaches.
        let (head, tail) = self.blocks.split_at_mut(at + 1);
        let current = &mut head[at];
        let absorbed = tail
            .iter()
            .take_while(|next| current.merge(next, &mut insertion))
            .count();
        self.blocks.drain(at + 1..at + 1 + absorbed);

        insertion.len = self.blocks[at].len;

        if self.limit != 0 && self.blocks.len() > self.limit {
            let last = self.blocks.len() - 1;
            if at == last {
                insertion.len = 0;
            }
            insertion.dropped = self.blocks.pop();
            net_debug!("reassembly overflow, dropped {:?}", insertion.dropped);
        }

        self.max_used = self.max_used.max(self.blocks.len());
        insertion
    }

    /// Remove the lowest block if it starts exactly at `next`.
    ///
    /// Since blocks never touch, at most one block can be ready at a time.
    pub fn pop_ready(&mut self, next: SeqNumber) -> Option<Block> {
        if self.blocks.first().map_or(false, |block| block.seq == next) {
            Some(self.blocks.remove(0))
        } else {
            None
        }
    }
}

impl fmt::Display for Reassembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[ ")?;
        for block in self.blocks.iter() {
            write!(f, "{}+{}{} ", block.seq, block.len, if block.fin { "F" } else { "" })?;
        }
        write!(f, "]")
    }
}
