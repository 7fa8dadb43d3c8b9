//! Bounded storage used by connections.
//!
//! The only structure here is the [`Reassembly`] of out-of-order segments. It knows nothing of
//! connections: it stores sequence ranges, merges them, and reports how many octets turned out to
//! be duplicates so that the caller can account for them.
//!
//! [`Reassembly`]: struct.Reassembly.html
mod reassembly;

pub use self::reassembly::{Block, Insertion, Reassembly};
