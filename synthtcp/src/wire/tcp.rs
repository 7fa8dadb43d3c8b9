use core::{fmt, ops};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

/// A TCP sequence number.
///
/// A sequence number is a monotonically advancing integer modulo 2<sup>32</sup>. Adding or
/// subtracting a length wraps around, the difference of two sequence numbers is their signed
/// distance. Use [`seq_lt`] and friends to order them.
///
/// [`seq_lt`]: fn.seq_lt.html
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SeqNumber(pub u32);

/// A set of tcp flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(pub u16);

/// A read/write wrapper around a Transmission Control Protocol packet buffer.
#[derive(Debug, PartialEq, Clone)]
pub struct Packet<T> {
    buffer: T,
}

/// The per-segment values the input path of a connection consumes.
///
/// Derived from a header by the receive path, consumed and discarded within one call into the
/// engine. `len` counts payload octets only, the SYN and FIN flags occupy sequence space on top of
/// it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Segment {
    /// The sequence number of the first octet.
    pub seq: SeqNumber,
    /// The acknowledgment number, only meaningful with the ACK flag.
    pub ack: SeqNumber,
    /// The number of payload octets.
    pub len: u32,
    /// The control flags.
    pub flags: Flags,
    /// The raw window field, not yet scaled.
    pub window: u16,
    /// The urgent pointer, only meaningful with the URG flag.
    pub urgent: u16,
}

/// A high-level representation of a Transmission Control Protocol header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    /// The source port.
    pub src_port: u16,
    /// The destination port.
    pub dst_port: u16,
    /// The segment values, `len` is the payload length following the header.
    pub segment: Segment,
    /// The offered maximum segment size.
    pub max_seg_size: Option<u16>,
    /// The requested window scale shift.
    pub window_scale: Option<u8>,
    /// A timestamp value and its echo reply.
    pub timestamp: Option<(u32, u32)>,
}

/// A representation of a single TCP option.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TcpOption<'a> {
    /// Marks the end of the option list.
    EndOfList,
    /// Padding between options.
    NoOperation,
    /// The largest segment the sender is willing to receive.
    MaxSegmentSize(u16),
    /// The shift count the sender applies to its own window field.
    WindowScale(u8),
    /// A timestamp and the echo of the latest timestamp received.
    Timestamp {
        /// The sender's clock.
        tsval: u32,
        /// The echoed timestamp of the peer.
        tsecr: u32,
    },
    /// Any other option, kept as opaque data.
    Unknown {
        /// The option kind.
        kind: u8,
        /// Data following the length byte.
        data: &'a [u8],
    },
}

enum_with_unknown! {
    /// The kind octet of a TCP option.
    pub enum OptionKind(u8) {
        /// End of the option list, no length follows.
        EndOfList = 0,
        /// One octet of padding, no length follows.
        NoOperation = 1,
        /// Maximum segment size, four octets.
        MaxSegmentSize = 2,
        /// Window scale shift, three octets.
        WindowScale = 3,
        /// Timestamps, ten octets.
        Timestamp = 8,
    }
}

mod field {
    #![allow(non_snake_case)]

    pub(crate) type Field = ::core::ops::Range<usize>;

    pub(crate) const SRC_PORT: Field = 0..2;
    pub(crate) const DST_PORT: Field = 2..4;
    pub(crate) const SEQ_NUM:  Field = 4..8;
    pub(crate) const ACK_NUM:  Field = 8..12;
    pub(crate) const FLAGS:    Field = 12..14;
    pub(crate) const WIN_SIZE: Field = 14..16;
    pub(crate) const CHECKSUM: Field = 16..18;
    pub(crate) const URGENT:   Field = 18..20;

    pub(crate) fn OPTIONS(length: u8) -> Field {
        URGENT.end..(length as usize)
    }

    pub(crate) const FLG_FIN: u16 = 0x001;
    pub(crate) const FLG_SYN: u16 = 0x002;
    pub(crate) const FLG_RST: u16 = 0x004;
    pub(crate) const FLG_PSH: u16 = 0x008;
    pub(crate) const FLG_ACK: u16 = 0x010;
    pub(crate) const FLG_URG: u16 = 0x020;

    /// The flags the engine interprets, everything else is masked on read.
    pub(crate) const FLG_MASK: u16 = 0x03f;

    pub(crate) const OPT_END: u8 = 0x00;
    pub(crate) const OPT_NOP: u8 = 0x01;
    pub(crate) const OPT_MSS: u8 = 0x02;
    pub(crate) const OPT_WS:  u8 = 0x03;
    pub(crate) const OPT_TS:  u8 = 0x08;
}

/// Is `a` strictly before `b` in sequence space.
#[inline]
pub fn seq_lt(a: SeqNumber, b: SeqNumber) -> bool {
    (a.0.wrapping_sub(b.0) as i32) < 0
}

/// Is `a` before or equal to `b` in sequence space.
#[inline]
pub fn seq_leq(a: SeqNumber, b: SeqNumber) -> bool {
    (a.0.wrapping_sub(b.0) as i32) <= 0
}

/// Is `a` strictly after `b` in sequence space.
#[inline]
pub fn seq_gt(a: SeqNumber, b: SeqNumber) -> bool {
    (a.0.wrapping_sub(b.0) as i32) > 0
}

/// Is `a` after or equal to `b` in sequence space.
#[inline]
pub fn seq_geq(a: SeqNumber, b: SeqNumber) -> bool {
    (a.0.wrapping_sub(b.0) as i32) >= 0
}

/// The later of two sequence numbers.
#[inline]
pub fn seq_max(a: SeqNumber, b: SeqNumber) -> SeqNumber {
    if seq_gt(a, b) { a } else { b }
}

/// The earlier of two sequence numbers.
#[inline]
pub fn seq_min(a: SeqNumber, b: SeqNumber) -> SeqNumber {
    if seq_lt(a, b) { a } else { b }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ops::Add<u32> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: u32) -> SeqNumber {
        SeqNumber(self.0.wrapping_add(rhs))
    }
}

impl ops::Sub<u32> for SeqNumber {
    type Output = SeqNumber;

    fn sub(self, rhs: u32) -> SeqNumber {
        SeqNumber(self.0.wrapping_sub(rhs))
    }
}

impl ops::AddAssign<u32> for SeqNumber {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

impl ops::SubAssign<u32> for SeqNumber {
    fn sub_assign(&mut self, rhs: u32) {
        *self = *self - rhs;
    }
}

/// The signed distance from `rhs` to `self`.
impl ops::Sub for SeqNumber {
    type Output = i32;

    fn sub(self, rhs: SeqNumber) -> i32 {
        self.0.wrapping_sub(rhs.0) as i32
    }
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Imbue a raw octet buffer with TCP packet structure.
    pub fn new_unchecked(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<Packet<T>> {
        let packet = Self::new_unchecked(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no header accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    /// Returns `Err(Error::Malformed)` if the header length field has a value smaller
    /// than the minimal header length.
    ///
    /// The result of this check is invalidated by calling [set_header_len].
    ///
    /// [set_header_len]: #method.set_header_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < field::URGENT.end {
            Err(Error::Truncated)
        } else {
            let header_len = self.header_len() as usize;
            if len < header_len {
                Err(Error::Truncated)
            } else if header_len < field::URGENT.end {
                Err(Error::Malformed)
            } else {
                Ok(())
            }
        }
    }

    /// Consume the packet, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Return the source port field.
    #[inline]
    pub fn src_port(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::SRC_PORT])
    }

    /// Return the destination port field.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::DST_PORT])
    }

    /// Return the sequence number field.
    #[inline]
    pub fn seq_number(&self) -> SeqNumber {
        let data = self.buffer.as_ref();
        SeqNumber(NetworkEndian::read_u32(&data[field::SEQ_NUM]))
    }

    /// Return the acknowledgement number field.
    #[inline]
    pub fn ack_number(&self) -> SeqNumber {
        let data = self.buffer.as_ref();
        SeqNumber(NetworkEndian::read_u32(&data[field::ACK_NUM]))
    }

    /// Read all flags at once.
    pub fn flags(&self) -> Flags {
        let data = self.buffer.as_ref();
        Flags(NetworkEndian::read_u16(&data[field::FLAGS]) & field::FLG_MASK)
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        let data = self.buffer.as_ref();
        let raw = NetworkEndian::read_u16(&data[field::FLAGS]);
        ((raw >> 12) * 4) as u8
    }

    /// Return the window size field.
    #[inline]
    pub fn window_len(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::WIN_SIZE])
    }

    /// Return the checksum field.
    ///
    /// It is not verified, checksums are expected to be offloaded to the interface.
    #[inline]
    pub fn checksum(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::CHECKSUM])
    }

    /// Return the urgent pointer field.
    #[inline]
    pub fn urgent_at(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::URGENT])
    }

    /// Return the raw option bytes.
    pub fn options(&self) -> &[u8] {
        let header_len = self.header_len();
        &self.buffer.as_ref()[field::OPTIONS(header_len)]
    }

    /// Return the payload following the header.
    pub fn payload(&self) -> &[u8] {
        let header_len = self.header_len() as usize;
        &self.buffer.as_ref()[header_len..]
    }

    /// Extract the values consumed by the connection input path.
    pub fn segment(&self) -> Segment {
        Segment {
            seq: self.seq_number(),
            ack: self.ack_number(),
            len: self.payload().len() as u32,
            flags: self.flags(),
            window: self.window_len(),
            urgent: self.urgent_at(),
        }
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the source port field.
    #[inline]
    pub fn set_src_port(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::SRC_PORT], value)
    }

    /// Set the destination port field.
    #[inline]
    pub fn set_dst_port(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::DST_PORT], value)
    }

    /// Set the sequence number field.
    #[inline]
    pub fn set_seq_number(&mut self, value: SeqNumber) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u32(&mut data[field::SEQ_NUM], value.0)
    }

    /// Set the acknowledgement number field.
    #[inline]
    pub fn set_ack_number(&mut self, value: SeqNumber) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u32(&mut data[field::ACK_NUM], value.0)
    }

    /// Set all flags at once, keeping the header length.
    #[inline]
    pub fn set_flags(&mut self, Flags(flags): Flags) {
        let data = self.buffer.as_mut();
        let raw = NetworkEndian::read_u16(&data[field::FLAGS]);
        let raw = (raw & !0x0fff) | (flags & 0x0fff);
        NetworkEndian::write_u16(&mut data[field::FLAGS], raw)
    }

    /// Set the header length, in octets.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        let data = self.buffer.as_mut();
        let raw = NetworkEndian::read_u16(&data[field::FLAGS]);
        let raw = (raw & !0xf000) | ((value as u16) / 4) << 12;
        NetworkEndian::write_u16(&mut data[field::FLAGS], raw)
    }

    /// Set the window size field.
    #[inline]
    pub fn set_window_len(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::WIN_SIZE], value)
    }

    /// Set the checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::CHECKSUM], value)
    }

    /// Set the urgent pointer field.
    #[inline]
    pub fn set_urgent_at(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::URGENT], value)
    }

    /// Return a mutable pointer to the options.
    #[inline]
    pub fn options_mut(&mut self) -> &mut [u8] {
        let header_len = self.header_len();
        let data = self.buffer.as_mut();
        &mut data[field::OPTIONS(header_len)]
    }

    /// Return a mutable pointer to the payload data.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let header_len = self.header_len() as usize;
        let data = self.buffer.as_mut();
        &mut data[header_len..]
    }
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for Packet<T> {
    fn as_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

impl Flags {
    /// No more data from sender.
    pub const FIN: Flags = Flags(field::FLG_FIN);
    /// Synchronize sequence numbers.
    pub const SYN: Flags = Flags(field::FLG_SYN);
    /// Reset the connection.
    pub const RST: Flags = Flags(field::FLG_RST);
    /// Push function.
    pub const PSH: Flags = Flags(field::FLG_PSH);
    /// Acknowledgment field significant.
    pub const ACK: Flags = Flags(field::FLG_ACK);
    /// Urgent pointer field significant.
    pub const URG: Flags = Flags(field::FLG_URG);

    /// Return the FIN flag.
    #[inline]
    pub fn fin(&self) -> bool {
        self.0 & field::FLG_FIN != 0
    }

    /// Return the SYN flag.
    #[inline]
    pub fn syn(&self) -> bool {
        self.0 & field::FLG_SYN != 0
    }

    /// Return the RST flag.
    #[inline]
    pub fn rst(&self) -> bool {
        self.0 & field::FLG_RST != 0
    }

    /// Return the PSH flag.
    #[inline]
    pub fn psh(&self) -> bool {
        self.0 & field::FLG_PSH != 0
    }

    /// Return the ACK flag.
    #[inline]
    pub fn ack(&self) -> bool {
        self.0 & field::FLG_ACK != 0
    }

    /// Return the URG flag.
    #[inline]
    pub fn urg(&self) -> bool {
        self.0 & field::FLG_URG != 0
    }

    /// Set the FIN flag.
    #[inline]
    pub fn set_fin(&mut self, value: bool) {
        self.set(field::FLG_FIN, value)
    }

    /// Set the SYN flag.
    #[inline]
    pub fn set_syn(&mut self, value: bool) {
        self.set(field::FLG_SYN, value)
    }

    /// Set the RST flag.
    #[inline]
    pub fn set_rst(&mut self, value: bool) {
        self.set(field::FLG_RST, value)
    }

    /// Set the PSH flag.
    #[inline]
    pub fn set_psh(&mut self, value: bool) {
        self.set(field::FLG_PSH, value)
    }

    /// Set the ACK flag.
    #[inline]
    pub fn set_ack(&mut self, value: bool) {
        self.set(field::FLG_ACK, value)
    }

    /// Set the URG flag.
    #[inline]
    pub fn set_urg(&mut self, value: bool) {
        self.set(field::FLG_URG, value)
    }

    /// Check that all flags of `other` are set.
    #[inline]
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check that no flag other than those of `other` is set.
    #[inline]
    pub fn only(self, other: Flags) -> bool {
        self.0 & !other.0 == 0
    }

    /// Return the length of the control flags in terms of sequence space.
    pub fn sequence_len(self) -> u32 {
        u32::from(self.syn()) + u32::from(self.fin())
    }

    fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

impl ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (self.syn(), "SYN"),
            (self.fin(), "FIN"),
            (self.rst(), "RST"),
            (self.psh(), "PSH"),
            (self.ack(), "ACK"),
            (self.urg(), "URG"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first { write!(f, "|")?; }
            write!(f, "{}", name)?;
            first = false;
        }
        if first {
            write!(f, "-")?;
        }
        Ok(())
    }
}

impl<'a> TcpOption<'a> {
    /// Parse one option strictly, returning the remaining buffer.
    ///
    /// Unlike the connection's own option walk this rejects known options of the wrong length.
    pub fn parse(buffer: &'a [u8]) -> Result<(&'a [u8], TcpOption<'a>)> {
        let (length, option);
        match *buffer.get(0).ok_or(Error::Truncated)? {
            field::OPT_END => {
                length = 1;
                option = TcpOption::EndOfList;
            }
            field::OPT_NOP => {
                length = 1;
                option = TcpOption::NoOperation;
            }
            kind => {
                length = *buffer.get(1).ok_or(Error::Truncated)? as usize;
                let data = buffer.get(2..length).ok_or(Error::Truncated)?;
                option = match (OptionKind::from(kind), length) {
                    (OptionKind::MaxSegmentSize, 4) =>
                        TcpOption::MaxSegmentSize(NetworkEndian::read_u16(data)),
                    (OptionKind::WindowScale, 3) =>
                        TcpOption::WindowScale(data[0]),
                    (OptionKind::Timestamp, 10) =>
                        TcpOption::Timestamp {
                            tsval: NetworkEndian::read_u32(&data[0..4]),
                            tsecr: NetworkEndian::read_u32(&data[4..8]),
                        },
                    (OptionKind::MaxSegmentSize, _)
                    | (OptionKind::WindowScale, _)
                    | (OptionKind::Timestamp, _) =>
                        return Err(Error::Malformed),
                    (_, _) =>
                        TcpOption::Unknown { kind, data },
                };
            }
        }
        Ok((&buffer[length..], option))
    }

    /// The number of octets this option occupies.
    pub fn buffer_len(&self) -> usize {
        match self {
            TcpOption::EndOfList => 1,
            TcpOption::NoOperation => 1,
            TcpOption::MaxSegmentSize(_) => 4,
            TcpOption::WindowScale(_) => 3,
            TcpOption::Timestamp { .. } => 10,
            TcpOption::Unknown { data, .. } => 2 + data.len()
        }
    }

    /// Write the option, returning the remaining buffer.
    ///
    /// An end of list fills all of the remaining buffer as padding.
    pub fn emit<'b>(&self, buffer: &'b mut [u8]) -> &'b mut [u8] {
        let length;
        match *self {
            TcpOption::EndOfList => {
                length = buffer.len().min(1);
                for p in buffer.iter_mut() {
                    *p = field::OPT_END;
                }
            }
            TcpOption::NoOperation => {
                length = 1;
                buffer[0] = field::OPT_NOP;
            }
            TcpOption::MaxSegmentSize(value) => {
                length = 4;
                buffer[0] = field::OPT_MSS;
                NetworkEndian::write_u16(&mut buffer[2..4], value);
            }
            TcpOption::WindowScale(value) => {
                length = 3;
                buffer[0] = field::OPT_WS;
                buffer[2] = value;
            }
            TcpOption::Timestamp { tsval, tsecr } => {
                length = 10;
                buffer[0] = field::OPT_TS;
                NetworkEndian::write_u32(&mut buffer[2..6], tsval);
                NetworkEndian::write_u32(&mut buffer[6..10], tsecr);
            }
            TcpOption::Unknown { kind, data } => {
                length = 2 + data.len();
                buffer[0] = kind;
                buffer[2..length].copy_from_slice(data);
            }
        }
        if length > 1 {
            buffer[1] = length as u8;
        }
        &mut buffer[length..]
    }
}

impl Repr {
    /// Parse a header with strictly validated options.
    pub fn parse<T: AsRef<[u8]>>(packet: &Packet<T>) -> Result<Repr> {
        packet.check_len()?;

        let mut repr = Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            segment: packet.segment(),
            max_seg_size: None,
            window_scale: None,
            timestamp: None,
        };

        let mut options = packet.options();
        while !options.is_empty() {
            let (next, option) = TcpOption::parse(options)?;
            match option {
                TcpOption::EndOfList => break,
                TcpOption::NoOperation => (),
                TcpOption::MaxSegmentSize(mss) => repr.max_seg_size = Some(mss),
                TcpOption::WindowScale(shift) => repr.window_scale = Some(shift),
                TcpOption::Timestamp { tsval, tsecr } => repr.timestamp = Some((tsval, tsecr)),
                TcpOption::Unknown { .. } => (),
            }
            options = next;
        }

        Ok(repr)
    }

    /// The length of the options, unpadded.
    fn options_len(&self) -> usize {
        let mut len = 0;
        if self.max_seg_size.is_some() {
            len += 4;
        }
        if self.window_scale.is_some() {
            // Preceded by a single no-op.
            len += 4;
        }
        if self.timestamp.is_some() {
            // Preceded by two no-ops.
            len += 12;
        }
        len
    }

    /// The length of the header including options, a multiple of four.
    pub fn header_len(&self) -> usize {
        let len = field::URGENT.end + self.options_len();
        (len + 3) & !3
    }

    /// The length of header and payload.
    pub fn buffer_len(&self) -> usize {
        self.header_len() + self.segment.len as usize
    }

    /// Emit the header into a packet, leaving the checksum and payload untouched.
    pub fn emit<T>(&self, packet: &mut Packet<T>)
        where T: AsRef<[u8]> + AsMut<[u8]>
    {
        packet.set_header_len(self.header_len() as u8);
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_seq_number(self.segment.seq);
        packet.set_ack_number(self.segment.ack);
        packet.set_flags(self.segment.flags);
        packet.set_window_len(self.segment.window);
        packet.set_urgent_at(self.segment.urgent);

        let mut options = packet.options_mut();
        if let Some(mss) = self.max_seg_size {
            options = TcpOption::MaxSegmentSize(mss).emit(options);
        }
        if let Some(shift) = self.window_scale {
            options = TcpOption::NoOperation.emit(options);
            options = TcpOption::WindowScale(shift).emit(options);
        }
        if let Some((tsval, tsecr)) = self.timestamp {
            options = TcpOption::NoOperation.emit(options);
            options = TcpOption::NoOperation.emit(options);
            options = TcpOption::Timestamp { tsval, tsecr }.emit(options);
        }
        if !options.is_empty() {
            TcpOption::EndOfList.emit(options);
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let segment = &self.segment;
        write!(f, "TCP src={} dst={} {} seq={}",
               self.src_port, self.dst_port, segment.flags, segment.seq)?;
        if segment.flags.ack() {
            write!(f, " ack={}", segment.ack)?;
        }
        write!(f, " win={}", segment.window)?;
        if segment.flags.urg() {
            write!(f, " urg={}", segment.urgent)?;
        }
        write!(f, " len={}", segment.len)?;
        if let Some(mss) = self.max_seg_size {
            write!(f, " mss={}", mss)?;
        }
        if let Some(shift) = self.window_scale {
            write!(f, " ws={}", shift)?;
        }
        if let Some((tsval, tsecr)) = self.timestamp {
            write!(f, " ts={}/{}", tsval, tsecr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static PACKET_BYTES: [u8; 28] =
        [0xbf, 0x00, 0x00, 0x50,
         0x01, 0x23, 0x45, 0x67,
         0x89, 0xab, 0xcd, 0xef,
         0x60, 0x35, 0x01, 0x23,
         0x01, 0xb6, 0x02, 0x01,
         0x03, 0x03, 0x0c, 0x01,
         0xaa, 0x00, 0x00, 0xff];

    static OPTION_BYTES: [u8; 4] =
        [0x03, 0x03, 0x0c, 0x01];

    static PAYLOAD_BYTES: [u8; 4] =
        [0xaa, 0x00, 0x00, 0xff];

    #[test]
    fn test_deconstruct() {
        let packet = Packet::new_checked(&PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.src_port(), 48896);
        assert_eq!(packet.dst_port(), 80);
        assert_eq!(packet.seq_number(), SeqNumber(0x01234567));
        assert_eq!(packet.ack_number(), SeqNumber(0x89abcdef));
        assert_eq!(packet.header_len(), 24);
        assert_eq!(packet.flags().fin(), true);
        assert_eq!(packet.flags().syn(), false);
        assert_eq!(packet.flags().rst(), true);
        assert_eq!(packet.flags().psh(), false);
        assert_eq!(packet.flags().ack(), true);
        assert_eq!(packet.flags().urg(), true);
        assert_eq!(packet.window_len(), 0x0123);
        assert_eq!(packet.urgent_at(), 0x0201);
        assert_eq!(packet.checksum(), 0x01b6);
        assert_eq!(packet.options(), &OPTION_BYTES[..]);
        assert_eq!(packet.payload(), &PAYLOAD_BYTES[..]);

        let segment = packet.segment();
        assert_eq!(segment.len, 4);
        assert_eq!(segment.flags, Flags::FIN | Flags::RST | Flags::ACK | Flags::URG);
    }

    #[test]
    fn test_construct() {
        let mut bytes = vec![0xa5; PACKET_BYTES.len()];
        let mut packet = Packet::new_unchecked(&mut bytes);
        packet.set_src_port(48896);
        packet.set_dst_port(80);
        packet.set_seq_number(SeqNumber(0x01234567));
        packet.set_ack_number(SeqNumber(0x89abcdef));
        packet.set_header_len(24);
        let mut flags = Flags::default();
        flags.set_fin(true);
        flags.set_syn(false);
        flags.set_rst(true);
        flags.set_psh(false);
        flags.set_ack(true);
        flags.set_urg(true);
        packet.set_flags(flags);
        packet.set_window_len(0x0123);
        packet.set_urgent_at(0x0201);
        packet.set_checksum(0x01b6);
        packet.options_mut().copy_from_slice(&OPTION_BYTES[..]);
        packet.payload_mut().copy_from_slice(&PAYLOAD_BYTES[..]);
        assert_eq!(&packet.into_inner()[..], &PACKET_BYTES[..]);
    }

    #[test]
    fn test_truncated() {
        let packet = Packet::new_checked(&PACKET_BYTES[..23]);
        assert_eq!(packet, Err(Error::Truncated));
    }

    #[test]
    fn test_impossible_len() {
        let mut bytes = vec![0; 20];
        let mut packet = Packet::new_unchecked(&mut bytes);
        packet.set_header_len(10);
        assert_eq!(packet.check_len(), Err(Error::Malformed));
    }

    fn syn_repr() -> Repr {
        Repr {
            src_port: 48896,
            dst_port: 80,
            segment: Segment {
                seq: SeqNumber(0x01234567),
                ack: SeqNumber(0),
                len: 0,
                flags: Flags::SYN,
                window: 0x0123,
                urgent: 0,
            },
            max_seg_size: Some(1460),
            window_scale: Some(7),
            timestamp: Some((17, 0)),
        }
    }

    #[test]
    fn test_emit_parse() {
        let repr = syn_repr();
        assert_eq!(repr.header_len(), 40);
        let mut bytes = vec![0xa5; repr.buffer_len()];
        let mut packet = Packet::new_unchecked(&mut bytes[..]);
        repr.emit(&mut packet);
        assert_eq!(packet.options(), &[
            0x02, 0x04, 0x05, 0xb4,
            0x01, 0x03, 0x03, 0x07,
            0x01, 0x01, 0x08, 0x0a,
            0x00, 0x00, 0x00, 0x11,
            0x00, 0x00, 0x00, 0x00,
        ][..]);
        assert_eq!(Repr::parse(&packet), Ok(repr));
    }

    #[test]
    fn test_header_len_multiple_of_4() {
        let mut repr = syn_repr();
        repr.window_scale = None;
        repr.timestamp = None;
        assert_eq!(repr.header_len(), 24);
        repr.max_seg_size = None;
        assert_eq!(repr.header_len(), 20);
    }

    macro_rules! assert_option_parses {
        ($opt:expr, $data:expr) => ({
            assert_eq!(TcpOption::parse($data), Ok((&[][..], $opt)));
            let buffer = &mut [0; 40][..$opt.buffer_len()];
            assert_eq!($opt.emit(buffer), &mut []);
            assert_eq!(&*buffer, $data);
        })
    }

    #[test]
    fn test_tcp_options() {
        assert_option_parses!(TcpOption::EndOfList,
                              &[0x00]);
        assert_option_parses!(TcpOption::NoOperation,
                              &[0x01]);
        assert_option_parses!(TcpOption::MaxSegmentSize(1500),
                              &[0x02, 0x04, 0x05, 0xdc]);
        assert_option_parses!(TcpOption::WindowScale(12),
                              &[0x03, 0x03, 0x0c]);
        assert_option_parses!(TcpOption::Timestamp { tsval: 0x01020304, tsecr: 5 },
                              &[0x08, 0x0a,
                                0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, 0x05]);
        assert_option_parses!(TcpOption::Unknown { kind: 12, data: &[1, 2, 3][..] },
                              &[0x0c, 0x05, 0x01, 0x02, 0x03])
    }

    #[test]
    fn test_malformed_tcp_options() {
        assert_eq!(TcpOption::parse(&[]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0xc]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0xc, 0x05, 0x01, 0x02]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0xc, 0x01]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0x2, 0x02]),
                   Err(Error::Malformed));
        assert_eq!(TcpOption::parse(&[0x3, 0x02]),
                   Err(Error::Malformed));
        assert_eq!(TcpOption::parse(&[0x8, 0x02]),
                   Err(Error::Malformed));
    }

    #[test]
    fn option_kinds() {
        assert_eq!(OptionKind::from(8), OptionKind::Timestamp);
        assert_eq!(OptionKind::from(30), OptionKind::Unknown(30));
        assert_eq!(u8::from(OptionKind::WindowScale), 3);
    }

    #[test]
    fn flags_set_and_clear() {
        let mut flags = Flags::ACK | Flags::FIN;
        flags.set_fin(false);
        assert_eq!(flags, Flags::ACK);
        flags.set_fin(false);
        assert_eq!(flags, Flags::ACK);

        let mut flags = Flags::SYN | Flags::ACK | Flags::PSH | Flags::URG;
        flags.set_syn(false);
        flags.set_psh(false);
        flags.set_urg(false);
        assert_eq!(flags, Flags::ACK);
        assert_eq!(flags.sequence_len(), 0);

        flags.set_rst(true);
        flags.set_ack(false);
        assert_eq!(flags, Flags::RST);
        assert!(flags.only(Flags::RST));
    }

    #[test]
    fn seq_compare_plain() {
        let (a, b) = (SeqNumber(100), SeqNumber(200));
        assert!(seq_lt(a, b));
        assert!(seq_leq(a, b));
        assert!(seq_leq(a, a));
        assert!(!seq_lt(a, a));
        assert!(seq_gt(b, a));
        assert!(seq_geq(b, b));
        assert_eq!(seq_max(a, b), b);
        assert_eq!(seq_min(a, b), a);
    }

    #[test]
    fn seq_compare_wrapping() {
        let before = SeqNumber(u32::max_value() - 10);
        let after = SeqNumber(5);
        assert!(seq_lt(before, after));
        assert!(seq_gt(after, before));
        assert!(!seq_geq(before, after));
        assert_eq!(seq_max(before, after), after);
        assert_eq!(after - before, 16);
        assert_eq!(before - after, -16);
        assert_eq!(before + 16, after);
        assert_eq!(after - 16u32, before);
    }

    #[test]
    fn seq_compare_half_space() {
        // Exactly half the space apart is ambiguous, both orders hold.
        let a = SeqNumber(0);
        let b = SeqNumber(0x8000_0000);
        assert!(seq_lt(a, b));
        assert!(seq_lt(b, a));
        // One less and the order is unique again.
        let c = SeqNumber(0x7fff_ffff);
        assert!(seq_lt(a, c));
        assert!(!seq_lt(c, a));
    }

    #[test]
    fn flag_display() {
        assert_eq!(format!("{}", Flags::SYN | Flags::ACK), "SYN|ACK");
        assert_eq!(format!("{}", Flags::default()), "-");
        assert_eq!((Flags::SYN | Flags::FIN).sequence_len(), 2);
        assert!((Flags::ACK | Flags::PSH).only(Flags::ACK | Flags::PSH | Flags::URG));
        assert!(!(Flags::ACK | Flags::SYN).only(Flags::ACK));
    }
}
