use core::fmt;

use crate::storage::Reassembly;
use crate::wire::SeqNumber;
use super::config::{TemplateId, Tunables};
use super::context::Context;
use super::io::{Output, Socket, SoError};
use super::state::State;
use super::timer::{self, Timer, Timers};

/// The largest window representable in the unscaled header field.
pub const TCP_MAXWIN: u32 = 65535;

/// The largest permitted window scale shift.
pub const TCP_MAX_WINSHIFT: u8 = 14;

/// The smallest maximum segment size a connection accepts.
pub const TCP_MIN_MSS: u32 = 32;

bitflags::bitflags! {
    /// Boolean state of a connection.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TcbFlags: u16 {
        /// Acknowledge immediately.
        const ACKNOW = 0x0001;
        /// An acknowledgment is owed but may wait for the fast timer.
        const DELACK = 0x0002;
        /// Do not coalesce small segments.
        const NODELAY = 0x0004;
        /// Do not send any options.
        const NOOPT = 0x0008;
        /// Our FIN has been sent.
        const SENTFIN = 0x0010;
        /// We requested window scaling.
        const REQ_SCALE = 0x0020;
        /// The peer requested window scaling.
        const RCVD_SCALE = 0x0040;
        /// We requested timestamps.
        const REQ_TSTMP = 0x0080;
        /// The peer sent timestamps on its SYN.
        const RCVD_TSTMP = 0x0100;
        /// Send even when the window is closed, used by the persist timer.
        const FORCE = 0x0200;
    }
}

/// The control block of a single connection.
///
/// Owned by exactly one worker. All sequence variables are named after their RFC 793
/// counterparts, timer values count slow ticks. The invariant `snd_una <= snd_nxt <= snd_max`
/// holds in the modular sequence space between any two calls into the engine.
#[derive(Clone, Debug)]
pub struct Tcb {
    /// The current state of the state machine.
    pub state: State,

    /// Boolean connection state.
    pub flags: TcbFlags,

    /// The soft timers, counting down in slow ticks.
    pub timers: Timers,

    /// Initial send sequence number.
    pub iss: SeqNumber,

    /// Oldest unacknowledged sequence number.
    pub snd_una: SeqNumber,

    /// Next sequence number to send.
    pub snd_nxt: SeqNumber,

    /// Highest sequence number sent.
    pub snd_max: SeqNumber,

    /// Send urgent pointer.
    pub snd_up: SeqNumber,

    /// Sequence number of the segment that last updated the send window.
    pub snd_wl1: SeqNumber,

    /// Acknowledgment number of the segment that last updated the send window.
    pub snd_wl2: SeqNumber,

    /// The send window offered by the peer, already scaled.
    pub snd_wnd: u32,

    /// The largest send window the peer ever offered.
    pub max_sndwnd: u32,

    /// The congestion window.
    pub snd_cwnd: u32,

    /// The slow start threshold.
    pub snd_ssthresh: u32,

    /// Consecutive duplicate acknowledgments.
    pub dupacks: u32,

    /// Initial receive sequence number.
    pub irs: SeqNumber,

    /// Next sequence number expected.
    pub rcv_nxt: SeqNumber,

    /// The receive window.
    pub rcv_wnd: u32,

    /// The right edge of the highest window ever advertised.
    pub rcv_adv: SeqNumber,

    /// Receive urgent pointer.
    pub rcv_up: SeqNumber,

    /// The acknowledgment number of the last segment sent.
    pub last_ack_sent: SeqNumber,

    /// Slow ticks since the last segment was received.
    pub idle: u32,

    /// Slow ticks since `rtseq` was sent, `0` when no segment is timed.
    pub rtt: u32,

    /// The sequence number being timed.
    pub rtseq: SeqNumber,

    /// Smoothed round trip time, in slow ticks scaled by 8.
    pub srtt: i32,

    /// Smoothed mean deviation of the round trip time, in slow ticks scaled by 4.
    pub rttvar: i32,

    /// The smallest allowed retransmission timeout.
    pub rttmin: u32,

    /// The current retransmission timeout.
    pub rxtcur: u32,

    /// The number of consecutive backoffs.
    pub rxtshift: u32,

    /// An error that explains the timeouts, reported if the connection times out.
    pub softerror: Option<SoError>,

    /// The effective maximum segment size.
    pub maxseg: u32,

    /// Window scale shift of the peer's window field.
    pub snd_scale: u8,

    /// Window scale shift of our window field.
    pub rcv_scale: u8,

    /// The scale the peer requested.
    pub requested_s_scale: u8,

    /// The scale we request.
    pub request_r_scale: u8,

    /// The timestamp to echo.
    pub ts_recent: u32,

    /// The timestamp clock when `ts_recent` was recorded.
    pub ts_recent_age: u32,

    /// Duplicate acknowledgments that trigger fast retransmit.
    pub rexmt_thresh: u32,

    /// Octets received in order after which an acknowledgment is not delayed, `0` to disable.
    pub delay_limit: u32,

    /// Octets received in order since the last forced acknowledgment.
    pub pkts_cnt: u32,

    /// Connection establishment timeout.
    pub keep_init: u32,

    /// Idle time before the first keepalive probe.
    pub keep_idle: u32,

    /// Time between keepalive probes.
    pub keep_intvl: u32,

    /// The idle time after which a closing connection is given up.
    pub max_idle: u32,

    /// Send keepalive probes.
    pub keepalive: bool,

    /// Upper bound on queued out-of-order blocks.
    pub reass_maxqlen: u32,

    /// Drop out-of-order data instead of queueing it.
    pub reass_disabled: bool,

    /// The template of the connection.
    pub template: Option<TemplateId>,

    /// The overrides of the template, resolved once.
    pub tune: Option<Tunables>,

    /// Out-of-order data, only allocated while there is some.
    pub(crate) reass: Option<Reassembly>,

    /// The initial send sequence number of a connection reopened from `TimeWait`.
    pub(crate) pending_iss: Option<SeqNumber>,
}

impl Tcb {
    /// Create the control block of a new, closed connection.
    pub fn new(ctx: &Context, template: Option<TemplateId>) -> Self {
        let tune = ctx.tunables(template).copied();
        let config = ctx.config.with(tune.as_ref());

        let mut flags = TcbFlags::empty();
        if config.rfc1323 {
            flags |= TcbFlags::REQ_SCALE | TcbFlags::REQ_TSTMP;
        }
        if config.no_delay {
            flags |= TcbFlags::NODELAY;
        }

        let keep_intvl = config.keepintvl * timer::PR_SLOWHZ;
        let max_window = TCP_MAXWIN << TCP_MAX_WINSHIFT;

        Tcb {
            state: State::Closed,
            flags,
            timers: Timers::default(),
            iss: SeqNumber::default(),
            snd_una: SeqNumber::default(),
            snd_nxt: SeqNumber::default(),
            snd_max: SeqNumber::default(),
            snd_up: SeqNumber::default(),
            snd_wl1: SeqNumber::default(),
            snd_wl2: SeqNumber::default(),
            snd_wnd: 0,
            max_sndwnd: 0,
            snd_cwnd: max_window,
            snd_ssthresh: max_window,
            dupacks: 0,
            irs: SeqNumber::default(),
            rcv_nxt: SeqNumber::default(),
            rcv_wnd: 0,
            rcv_adv: SeqNumber::default(),
            rcv_up: SeqNumber::default(),
            last_ack_sent: SeqNumber::default(),
            idle: 0,
            rtt: 0,
            rtseq: SeqNumber::default(),
            srtt: timer::TCPTV_SRTTBASE,
            rttvar: timer::TCPTV_SRTTDFLT << 2,
            rttmin: timer::TCPTV_MIN,
            rxtcur: timer::range_set(
                ((timer::TCPTV_SRTTBASE >> 2) + (timer::TCPTV_SRTTDFLT << 2)) >> 1,
                timer::TCPTV_MIN,
                timer::TCPTV_REXMTMAX),
            rxtshift: 0,
            softerror: None,
            maxseg: u32::from(config.mss),
            snd_scale: 0,
            rcv_scale: 0,
            requested_s_scale: 0,
            request_r_scale: 0,
            ts_recent: 0,
            ts_recent_age: 0,
            rexmt_thresh: config.rexmt_thresh,
            delay_limit: config.no_delay_counter,
            pkts_cnt: 0,
            keep_init: config.keepinit * timer::PR_SLOWHZ,
            keep_idle: config.keepidle * timer::PR_SLOWHZ,
            keep_intvl,
            max_idle: (config.keepcnt * keep_intvl).min(2 * timer::TCPTV_MSL),
            keepalive: config.keepalive,
            reass_maxqlen: config.reass_maxqlen,
            reass_disabled: config.reass_disabled,
            template,
            tune,
            reass: None,
            pending_iss: None,
        }
    }

    /// Wait for a connection request.
    pub fn listen(&mut self) {
        self.state = State::Listen;
    }

    /// Open a connection actively by sending a SYN.
    pub fn connect(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        self.request_scale(socket.receive_capacity());
        ctx.stats.connattempt += 1;
        self.set_state(State::SynSent);
        self.timers.set(Timer::Keepalive, self.keep_init);
        self.iss = ctx.next_iss();
        self.send_seq_init();
        output.emit(ctx, self, socket);
    }

    /// The user will not send any more data.
    ///
    /// Queues our FIN if the connection is synchronized and closes it immediately otherwise.
    pub fn shutdown(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        if self.user_closed(ctx, socket, output) {
            output.emit(ctx, self, socket);
        }
    }

    /// The user closed its handle of the connection.
    pub fn disconnect(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        if !self.state.is_synchronized() {
            self.close(ctx, output);
        } else {
            self.shutdown(ctx, socket, output);
        }
    }

    /// Close the connection and release its resources.
    pub fn close(&mut self, ctx: &mut Context, output: &mut dyn Output) {
        self.release(ctx);
        output.close(ctx, self);
    }

    /// Abort the connection, sending a reset if the peer knows about it.
    pub fn drop(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        error: SoError,
    ) {
        if self.state.have_rcvd_syn() {
            self.set_state(State::Closed);
            output.emit(ctx, self, socket);
            ctx.stats.drops += 1;
        } else {
            ctx.stats.conndrops += 1;
        }

        let error = match (error, self.softerror) {
            (SoError::TimedOut, Some(soft)) => soft,
            (error, _) => error,
        };

        net_debug!("tcp: dropping connection: {}", error);
        socket.set_error(error);
        self.release(ctx);
        output.drop_now(ctx, self, error);
    }

    /// If the connection is still open in any direction.
    pub fn is_open(&self) -> bool {
        self.state != State::Closed
    }

    /// Transition into a new state.
    pub(crate) fn set_state(&mut self, state: State) {
        if self.state != state {
            net_trace!("tcp: state {} -> {}", self.state, state);
        }
        self.state = state;
    }

    /// Choose the scale we request from the size of the receive buffer.
    pub(crate) fn request_scale(&mut self, capacity: u32) {
        while self.request_r_scale < TCP_MAX_WINSHIFT
            && (TCP_MAXWIN << self.request_r_scale) < capacity
        {
            self.request_r_scale += 1;
        }
    }

    /// Use the negotiated window scales if both sides requested them.
    pub(crate) fn apply_scale(&mut self) {
        let both = TcbFlags::RCVD_SCALE | TcbFlags::REQ_SCALE;
        if self.flags.contains(both) {
            self.snd_scale = self.requested_s_scale;
            self.rcv_scale = self.request_r_scale;
        }
    }

    pub(crate) fn send_seq_init(&mut self) {
        self.snd_una = self.iss;
        self.snd_nxt = self.iss;
        self.snd_max = self.iss;
        self.snd_up = self.iss;
    }

    pub(crate) fn rcv_seq_init(&mut self) {
        self.rcv_nxt = self.irs + 1;
        self.rcv_adv = self.rcv_nxt;
    }

    /// Apply a user close to the state machine.
    ///
    /// Returns `false` if the connection was closed as a result.
    fn user_closed(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) -> bool {
        match self.state {
            State::Closed | State::Listen | State::SynSent => {
                self.set_state(State::Closed);
                self.close(ctx, output);
                return false;
            },
            State::SynReceived | State::Established => self.set_state(State::FinWait1),
            State::CloseWait => self.set_state(State::LastAck),
            _ => (),
        }

        if self.state == State::FinWait2 && socket.cant_receive_more() {
            self.timers.set(Timer::TwoMsl, self.max_idle);
        }

        true
    }

    /// Forget the connection without notifying the output.
    pub(crate) fn release(&mut self, ctx: &mut Context) {
        self.release_reassembly(ctx);
        self.timers.cancel_all();
        self.set_state(State::Closed);
        ctx.stats.closed += 1;
    }

    /// Replace a connection in `TimeWait` by a new incarnation listening for its SYN.
    pub(crate) fn reincarnate(&mut self, ctx: &mut Context, iss: SeqNumber) {
        self.release(ctx);
        *self = Tcb::new(ctx, self.template);
        self.listen();
        self.pending_iss = Some(iss);
    }
}

impl fmt::Display for Tcb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} una={} nxt={} max={} wnd={} cwnd={} ssthresh={} rcv_nxt={} rcv_wnd={}",
            self.state,
            self.snd_una,
            self.snd_nxt,
            self.snd_max,
            self.snd_wnd,
            self.snd_cwnd,
            self.snd_ssthresh,
            self.rcv_nxt,
            self.rcv_wnd)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tcp::config::{Config, Templates};
    use alloc::sync::Arc;

    #[test]
    fn fresh_defaults() {
        let ctx = Context::new(Config::default());
        let tcb = Tcb::new(&ctx, None);
        assert_eq!(tcb.state, State::Closed);
        assert_eq!(tcb.maxseg, 1460);
        assert_eq!(tcb.srtt, 0);
        assert_eq!(tcb.rttvar, 24);
        assert_eq!(tcb.rxtcur, 12);
        assert_eq!(tcb.snd_cwnd, TCP_MAXWIN << 14);
        assert_eq!(tcb.snd_ssthresh, TCP_MAXWIN << 14);
        assert!(tcb.flags.contains(TcbFlags::REQ_SCALE | TcbFlags::REQ_TSTMP));
        assert!(!tcb.flags.contains(TcbFlags::NODELAY));
        assert_eq!(tcb.keep_init, 150);
        assert_eq!(tcb.max_idle, 120);
    }

    #[test]
    fn template_overrides() {
        let tune = Tunables {
            rfc1323: Some(false),
            no_delay: Some(true),
            rexmt_thresh: Some(2),
            ..Tunables::default()
        };
        let templates = Arc::new(Templates::new(vec![tune]));
        let ctx = Context::with_templates(Config::default(), templates);
        let tcb = Tcb::new(&ctx, Some(TemplateId(0)));
        assert_eq!(tcb.tune, Some(tune));
        assert!(tcb.flags.contains(TcbFlags::NODELAY));
        assert!(!tcb.flags.intersects(TcbFlags::REQ_SCALE | TcbFlags::REQ_TSTMP));
        assert_eq!(tcb.rexmt_thresh, 2);
    }

    #[test]
    fn scale_from_buffer() {
        let ctx = Context::new(Config::default());
        let mut tcb = Tcb::new(&ctx, None);
        tcb.request_scale(32 * 1024);
        assert_eq!(tcb.request_r_scale, 0);
        tcb.request_scale(1 << 20);
        assert_eq!(tcb.request_r_scale, 5);
        tcb.request_scale(u32::max_value());
        assert_eq!(tcb.request_r_scale, TCP_MAX_WINSHIFT);
    }
}
