/*! Low-level TCP header access and construction.

# An overview over packet representations

The `wire` module deals with the packet *representation*. It provides three levels of
functionality.

 * First, it provides functions to extract fields from sequences of octets, and to insert fields
   into sequences of octets. This happens in [`TcpPacket`] whose accessors read and write the
   header in place.
 * Second, it provides a compact, high-level representation of header data that can be created from
   parsing and emitted into a sequence of octets. This is [`TcpRepr`], which contains the
   options the engine negotiates as plain fields.
 * Third, the per-segment value consumed by the protocol engine, [`Segment`]. It is what remains
   of a header once the connection is known: sequence and acknowledgment numbers, flags, the raw
   window, the urgent pointer and the payload length. Options travel next to it as raw bytes since
   their interpretation depends on connection state.

[`TcpPacket`]: struct.TcpPacket.html
[`TcpRepr`]: struct.TcpRepr.html
[`Segment`]: struct.Segment.html

Sequence numbers live in a modular space and are compared by the helpers [`seq_lt`],
[`seq_leq`], [`seq_gt`] and [`seq_geq`] instead of `PartialOrd`, since such an order would not be
transitive. The difference of two sequence numbers is a signed distance.

[`seq_lt`]: fn.seq_lt.html
[`seq_leq`]: fn.seq_leq.html
[`seq_gt`]: fn.seq_gt.html
[`seq_geq`]: fn.seq_geq.html

The `TcpPacket` guarantees that, if `check_len()` returned `Ok(())`, then no field accessor or
setter will panic as long as the data offset is not changed. `TcpRepr::emit` never panics as long
as the underlying buffer is at least `TcpRepr::buffer_len()` octets long.

# Examples

To emit a header into an octet buffer, and then parse it back:

```rust
use synthtcp::wire::*;

let repr = TcpRepr {
    src_port: 1025,
    dst_port: 80,
    segment: Segment {
        seq: SeqNumber(1000),
        ack: SeqNumber(0),
        len: 0,
        flags: Flags::SYN,
        window: 65535,
        urgent: 0,
    },
    max_seg_size: Some(1460),
    window_scale: Some(7),
    timestamp: None,
};

let mut buffer = vec![0; repr.buffer_len()];
repr.emit(&mut TcpPacket::new_unchecked(&mut buffer[..]));

let packet = TcpPacket::new_checked(&buffer[..]).unwrap();
assert_eq!(TcpRepr::parse(&packet), Ok(repr));
```
*/
mod error;
pub mod tcp;

pub use self::error::{Error, Result};

pub use self::tcp::{
    Flags,
    OptionKind,
    Packet as TcpPacket,
    Repr as TcpRepr,
    Segment,
    SeqNumber,
    TcpOption,
    seq_geq,
    seq_gt,
    seq_leq,
    seq_lt,
    seq_max,
    seq_min,
};
