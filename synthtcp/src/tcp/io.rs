//! The collaborators of a connection.
//!
//! A connection does not own its buffers or its packet output. Instead every call into the engine
//! passes in a [`Socket`] (the application side byte buffers) and an [`Output`] (the segment
//! transmitter). Traffic of the generator is synthetic so the most common socket only counts
//! octets, that is [`ByteSocket`].
//!
//! [`Socket`]: trait.Socket.html
//! [`Output`]: trait.Output.html
//! [`ByteSocket`]: struct.ByteSocket.html
use core::fmt;

use crate::wire::{Flags, SeqNumber};
use super::context::Context;
use super::tcb::Tcb;

/// An error reported to the application of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoError {
    /// The peer refused the connection attempt.
    ConnectionRefused,
    /// The peer reset an established connection.
    ConnectionReset,
    /// The peer stopped answering.
    TimedOut,
}

/// The application side of a connection.
pub trait Socket {
    /// Append received in-order data to the receive buffer.
    fn append(&mut self, data: &[u8]) {
        self.append_bytes(data.len() as u32)
    }

    /// Append received in-order octets whose content does not matter.
    fn append_bytes(&mut self, len: u32);

    /// Release octets from the front of the send buffer after they were acknowledged.
    fn drop_bytes(&mut self, len: u32);

    /// Release the complete send buffer.
    fn drop_all(&mut self);

    /// The number of octets in the send buffer, sent or not.
    fn send_pending(&self) -> u32;

    /// The free space in the receive buffer.
    fn space_available(&self) -> u32;

    /// The total size of the receive buffer.
    fn receive_capacity(&self) -> u32;

    /// Notify the reader about new data.
    fn wake_readers(&mut self);

    /// Notify the writer about free space.
    fn wake_writers(&mut self);

    /// The peer will not send any more data.
    fn mark_cant_receive_more(&mut self);

    /// If `mark_cant_receive_more` was called.
    fn cant_receive_more(&self) -> bool;

    /// If the application closed its handle of the connection.
    fn app_closed(&self) -> bool;

    /// Report an error to the application.
    fn set_error(&mut self, error: SoError);
}

/// The transmitting side of a connection.
pub trait Output {
    /// Send all segments the connection state currently allows.
    ///
    /// Responsible for advancing the send sequence variables, timing the segments, arming the
    /// retransmission timer and recording the advertised window.
    fn emit(&mut self, ctx: &mut Context, tcb: &mut Tcb, socket: &mut dyn Socket);

    /// Send a single control segment that is not part of the connection's sequence space.
    fn respond(&mut self, ctx: &mut Context, tcb: &Tcb, seq: SeqNumber, ack: SeqNumber, flags: Flags);

    /// The connection closed regularly, release all resources held for it.
    fn close(&mut self, ctx: &mut Context, tcb: &Tcb);

    /// The connection was aborted, release all resources held for it.
    fn drop_now(&mut self, ctx: &mut Context, tcb: &Tcb, reason: SoError);
}

/// Fill state of one direction of a socket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SockBuf {
    /// Number of octets in the buffer.
    pub cc: u32,
    /// The buffer capacity.
    pub hiwat: u32,
}

/// A socket that counts octets instead of storing them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteSocket {
    /// The receive buffer.
    pub rcv: SockBuf,
    /// The send buffer.
    pub snd: SockBuf,
    /// Total octets ever received in order.
    pub received: u64,
    /// Total octets ever acknowledged by the peer.
    pub acknowledged: u64,
    /// The peer closed its side.
    pub cant_rcv_more: bool,
    /// The application closed its handle.
    pub closed: bool,
    /// The last reported error.
    pub error: Option<SoError>,
}

impl SoError {
    /// The conventional error number of the error.
    pub fn errno(self) -> i32 {
        match self {
            SoError::ConnectionRefused => libc::ECONNREFUSED,
            SoError::ConnectionReset => libc::ECONNRESET,
            SoError::TimedOut => libc::ETIMEDOUT,
        }
    }
}

impl fmt::Display for SoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SoError::ConnectionRefused => write!(f, "connection refused"),
            SoError::ConnectionReset => write!(f, "connection reset by peer"),
            SoError::TimedOut => write!(f, "connection timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SoError {}

impl SockBuf {
    /// An empty buffer of some capacity.
    pub fn with_capacity(hiwat: u32) -> Self {
        SockBuf { cc: 0, hiwat }
    }

    /// The free space.
    pub fn space(&self) -> u32 {
        self.hiwat.saturating_sub(self.cc)
    }
}

impl ByteSocket {
    /// Create a socket with buffers of the given sizes.
    pub fn new(rx_buffer: u32, tx_buffer: u32) -> Self {
        ByteSocket {
            rcv: SockBuf::with_capacity(rx_buffer),
            snd: SockBuf::with_capacity(tx_buffer),
            ..ByteSocket::default()
        }
    }

    /// The application writes up to `len` octets, returns how many fit.
    pub fn write(&mut self, len: u32) -> u32 {
        let len = len.min(self.snd.space());
        self.snd.cc += len;
        len
    }

    /// The application consumes everything received so far.
    pub fn read_all(&mut self) -> u32 {
        core::mem::replace(&mut self.rcv.cc, 0)
    }

    /// The application closes its handle.
    pub fn close_app(&mut self) {
        self.closed = true;
    }
}

impl Socket for ByteSocket {
    fn append_bytes(&mut self, len: u32) {
        self.rcv.cc = self.rcv.cc.saturating_add(len);
        self.received += u64::from(len);
    }

    fn drop_bytes(&mut self, len: u32) {
        let len = len.min(self.snd.cc);
        self.snd.cc -= len;
        self.acknowledged += u64::from(len);
    }

    fn drop_all(&mut self) {
        let cc = self.snd.cc;
        self.drop_bytes(cc);
    }

    fn send_pending(&self) -> u32 {
        self.snd.cc
    }

    fn space_available(&self) -> u32 {
        self.rcv.space()
    }

    fn receive_capacity(&self) -> u32 {
        self.rcv.hiwat
    }

    fn wake_readers(&mut self) { }

    fn wake_writers(&mut self) { }

    fn mark_cant_receive_more(&mut self) {
        self.cant_rcv_more = true;
    }

    fn cant_receive_more(&self) -> bool {
        self.cant_rcv_more
    }

    fn app_closed(&self) -> bool {
        self.closed
    }

    fn set_error(&mut self, error: SoError) {
        self.error = Some(error);
    }
}
