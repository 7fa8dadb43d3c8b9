use core::fmt;

use crate::wire::Flags;

/// State enum of the statemachine.
///
/// The variants are ordered as in the BSD kernel and the engine relies on that order: every state
/// from `SynReceived` onwards has seen the peer's SYN, every state from `Established` onwards is
/// synchronized, and every state after `CloseWait` belongs to a connection whose user has
/// closed its side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Marker state for a connection that does not exist (anymore).
    Closed,

    /// Waiting for a SYN to arrive.
    Listen,

    /// Sent a SYN on active open, waiting for the answer.
    SynSent,

    /// Received a SYN and sent our own, waiting for it to be acknowledged.
    SynReceived,

    /// Data can flow in both directions.
    Established,

    /// Received a FIN, waiting for the user to close.
    CloseWait,

    /// Closed by the user, waiting for our FIN to be acknowledged.
    FinWait1,

    /// Both sides closed simultaneously, waiting for the acknowledgment of our FIN.
    Closing,

    /// Closed by the user after a FIN had arrived, waiting for the final acknowledgment.
    LastAck,

    /// Our FIN is acknowledged, waiting for the FIN of the peer.
    FinWait2,

    /// Waiting for duplicate segments of the connection to die off.
    TimeWait,
}

impl State {
    /// If a SYN of the peer was received in this state or any state before it.
    pub fn have_rcvd_syn(self) -> bool {
        self >= State::SynReceived
    }

    /// If the handshake has completed.
    pub fn is_synchronized(self) -> bool {
        self >= State::Established
    }

    /// If the FIN of the peer was received in this state or any state before it.
    pub fn have_rcvd_fin(self) -> bool {
        match self {
            State::CloseWait | State::Closing | State::LastAck | State::TimeWait => true,
            _ => false,
        }
    }

    /// The flags that every segment sent in this state carries.
    pub fn out_flags(self) -> Flags {
        match self {
            State::Closed => Flags::RST | Flags::ACK,
            State::Listen => Flags::default(),
            State::SynSent => Flags::SYN,
            State::SynReceived => Flags::SYN | Flags::ACK,
            State::Established | State::CloseWait => Flags::ACK,
            State::FinWait1 | State::Closing | State::LastAck => Flags::FIN | Flags::ACK,
            State::FinWait2 | State::TimeWait => Flags::ACK,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::Closed
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            State::Closed => "CLOSED",
            State::Listen => "LISTEN",
            State::SynSent => "SYN_SENT",
            State::SynReceived => "SYN_RECEIVED",
            State::Established => "ESTABLISHED",
            State::CloseWait => "CLOSE_WAIT",
            State::FinWait1 => "FIN_WAIT_1",
            State::Closing => "CLOSING",
            State::LastAck => "LAST_ACK",
            State::FinWait2 => "FIN_WAIT_2",
            State::TimeWait => "TIME_WAIT",
        };
        f.write_str(name)
    }
}
