//! A segment emitter encoding to wire bytes.
//!
//! The engine decides what it has to acknowledge and what it may retransmit, the emitter decides
//! what is actually sent. This one follows the classic BSD send decision, which is good enough to
//! drive a simulated peer and exercise every path of the input processing.
use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use crate::tcp::{Context, Output, Socket, SoError, State, Tcb, TcbFlags, Timer, TCP_MAXWIN};
use crate::wire::{seq_gt, seq_lt, Flags, Segment, SeqNumber, TcpPacket, TcpRepr};

/// The length of a header without options.
const HEADER_LEN: usize = 20;

/// How the connection of an emitter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finished {
    /// Closed regularly.
    Closed,
    /// Aborted with an error.
    Dropped(SoError),
}

/// An [`Output`] collecting encoded segments in a queue.
///
/// Segment payloads are zero filled, only their length matters to the engine.
///
/// [`Output`]: ../tcp/io/trait.Output.html
#[derive(Clone, Debug)]
pub struct SegmentOutput {
    /// The local port.
    pub src_port: u16,
    /// The remote port.
    pub dst_port: u16,
    /// How the connection ended, if it did.
    pub finished: Option<Finished>,
    frames: VecDeque<Vec<u8>>,
}

/// The outcome of one round of the send decision.
enum Send {
    /// Nothing is due.
    Idle,
    /// One segment is sent, there may be more.
    Segment {
        more: bool,
    },
}

impl SegmentOutput {
    /// An emitter for a connection between two ports.
    pub fn new(src_port: u16, dst_port: u16) -> Self {
        SegmentOutput {
            src_port,
            dst_port,
            finished: None,
            frames: VecDeque::new(),
        }
    }

    /// Take the oldest encoded segment.
    pub fn pop_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// The number of encoded segments not yet taken.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    fn push(&mut self, ctx: &mut Context, repr: &TcpRepr) {
        net_trace!("sim: send {}", repr);
        let mut buffer = vec![0; repr.buffer_len()];
        repr.emit(&mut TcpPacket::new_unchecked(&mut buffer[..]));
        ctx.stats.sndtotal += 1;
        self.frames.push_back(buffer);
    }

    fn repr(&self, segment: Segment) -> TcpRepr {
        TcpRepr {
            src_port: self.src_port,
            dst_port: self.dst_port,
            segment,
            max_seg_size: None,
            window_scale: None,
            timestamp: None,
        }
    }

    /// Decide about and possibly send one segment.
    fn send_one(&mut self, ctx: &mut Context, tcb: &mut Tcb, socket: &dyn Socket, idle: bool) -> Send {
        let mut flags = tcb.state.out_flags();
        let force = tcb.flags.contains(TcbFlags::FORCE);
        let pending = socket.send_pending();

        // The SYN is only ever sent from the initial sequence number.
        let syn = flags.syn();
        if syn && tcb.snd_nxt != tcb.iss && !tcb.flags.contains(TcbFlags::ACKNOW) {
            return Send::Idle;
        }

        let off = (tcb.snd_nxt - tcb.snd_una).max(0) as u32;
        let mut win = tcb.snd_wnd.min(tcb.snd_cwnd);
        if force {
            if win == 0 {
                if off < pending {
                    flags.set_fin(false);
                }
                win = 1;
            } else {
                tcb.timers.stop(Timer::Persist);
                tcb.rxtshift = 0;
            }
        }

        let mut more = false;
        let mut len = i64::from(win.min(pending)) - i64::from(off);
        if syn {
            len = 0;
        } else if len < 0 {
            len = 0;
            if win == 0 {
                tcb.timers.stop(Timer::Retransmit);
                tcb.snd_nxt = tcb.snd_una;
            }
        }
        let mut len = len as u32;
        if len > tcb.maxseg {
            len = tcb.maxseg;
            more = true;
        }
        if seq_lt(tcb.snd_nxt + len, tcb.snd_una + pending) {
            flags.set_fin(false);
        }

        if !syn && !should_send(tcb, socket, flags, len, off, idle, force) {
            if pending > 0
                && !tcb.timers.is_running(Timer::Retransmit)
                && !tcb.timers.is_running(Timer::Persist)
            {
                tcb.rxtshift = 0;
                tcb.set_persist();
            }
            return Send::Idle;
        }

        if syn {
            tcb.snd_nxt = tcb.iss;
        }

        let mut repr = self.repr(Segment::default());
        self.add_options(ctx, tcb, &mut repr, flags);
        let optlen = (repr.header_len() - HEADER_LEN) as u32;
        if len > tcb.maxseg.saturating_sub(optlen) {
            len = tcb.maxseg.saturating_sub(optlen);
            more = true;
            flags.set_fin(false);
        }

        if len > 0 {
            if force && len == 1 {
                ctx.stats.sndprobe += 1;
            } else if seq_lt(tcb.snd_nxt, tcb.snd_max) {
                ctx.stats.sndrexmitpack += 1;
                ctx.stats.sndrexmitbyte += u64::from(len);
            } else {
                ctx.stats.sndpack += 1;
                ctx.stats.sndbyte += u64::from(len);
            }
        } else if tcb.flags.contains(TcbFlags::ACKNOW) {
            ctx.stats.sndacks += 1;
        } else if flags.syn() || flags.fin() || flags.rst() {
            ctx.stats.sndctrl += 1;
        } else {
            ctx.stats.sndwinup += 1;
        }

        // A retransmitted FIN reuses its sequence number.
        if flags.fin() && tcb.flags.contains(TcbFlags::SENTFIN) && tcb.snd_nxt == tcb.snd_max {
            tcb.snd_nxt -= 1;
        }

        let persisting = tcb.timers.is_running(Timer::Persist);
        let seq = if len > 0 || flags.syn() || flags.fin() || persisting {
            tcb.snd_nxt
        } else {
            tcb.snd_max
        };

        let window = receive_window(tcb, socket);
        repr.segment = Segment {
            seq,
            ack: tcb.rcv_nxt,
            len,
            flags,
            window: advertised(window, tcb.rcv_scale, flags.syn()),
            urgent: 0,
        };

        if !force || !persisting {
            let start = tcb.snd_nxt;
            if flags.syn() {
                tcb.snd_nxt += 1;
            }
            if flags.fin() {
                tcb.snd_nxt += 1;
                tcb.flags.insert(TcbFlags::SENTFIN);
            }
            tcb.snd_nxt += len;
            if seq_gt(tcb.snd_nxt, tcb.snd_max) {
                tcb.snd_max = tcb.snd_nxt;
                if tcb.rtt == 0 {
                    tcb.rtt = 1;
                    tcb.rtseq = start;
                    ctx.stats.segstimed += 1;
                }
            }

            if !tcb.timers.is_running(Timer::Retransmit) && tcb.snd_nxt != tcb.snd_una {
                tcb.timers.set(Timer::Retransmit, tcb.rxtcur);
                if persisting {
                    tcb.timers.stop(Timer::Persist);
                    tcb.rxtshift = 0;
                }
            }
        } else if seq_gt(tcb.snd_nxt + len, tcb.snd_max) {
            tcb.snd_max = tcb.snd_nxt + len;
        }

        self.push(ctx, &repr);

        if window > 0 && seq_gt(tcb.rcv_nxt + window, tcb.rcv_adv) {
            tcb.rcv_adv = tcb.rcv_nxt + window;
        }
        tcb.last_ack_sent = tcb.rcv_nxt;
        tcb.flags.remove(TcbFlags::ACKNOW | TcbFlags::DELACK);

        Send::Segment { more }
    }

    fn add_options(&self, ctx: &Context, tcb: &Tcb, repr: &mut TcpRepr, flags: Flags) {
        if tcb.flags.contains(TcbFlags::NOOPT) {
            return;
        }

        if flags.syn() {
            let ours = ctx.config.with(tcb.tune.as_ref()).mss;
            repr.max_seg_size = Some(ours);
            let scale = TcbFlags::REQ_SCALE;
            if tcb.flags.contains(scale)
                && (!flags.ack() || tcb.flags.contains(TcbFlags::RCVD_SCALE))
            {
                repr.window_scale = Some(tcb.request_r_scale);
            }
        }

        let handshake = flags.syn() && !flags.ack();
        if tcb.flags.contains(TcbFlags::REQ_TSTMP)
            && !flags.rst()
            && (handshake || tcb.flags.contains(TcbFlags::RCVD_TSTMP))
        {
            repr.timestamp = Some((ctx.now, tcb.ts_recent));
        }
    }
}

impl Output for SegmentOutput {
    fn emit(&mut self, ctx: &mut Context, tcb: &mut Tcb, socket: &mut dyn Socket) {
        match tcb.state {
            State::Listen => return,
            State::Closed => {
                // An aborted connection, a single reset.
                let segment = Segment {
                    seq: tcb.snd_nxt,
                    ack: tcb.rcv_nxt,
                    flags: tcb.state.out_flags(),
                    ..Segment::default()
                };
                let repr = self.repr(segment);
                ctx.stats.sndctrl += 1;
                self.push(ctx, &repr);
                return;
            },
            _ => (),
        }

        let idle = tcb.snd_max == tcb.snd_una;
        if idle && tcb.idle >= tcb.rxtcur {
            // Restart from slow start after an idle period.
            tcb.snd_cwnd = tcb.maxseg;
        }

        while let Send::Segment { more: true } = self.send_one(ctx, tcb, socket, idle) {}
    }

    fn respond(&mut self, ctx: &mut Context, tcb: &Tcb, seq: SeqNumber, ack: SeqNumber, flags: Flags) {
        let window = if flags.rst() {
            0
        } else {
            advertised(tcb.rcv_wnd, tcb.rcv_scale, false)
        };
        let repr = self.repr(Segment {
            seq,
            ack,
            flags,
            window,
            ..Segment::default()
        });
        self.push(ctx, &repr);
    }

    fn close(&mut self, _: &mut Context, _: &Tcb) {
        self.finished = Some(Finished::Closed);
    }

    fn drop_now(&mut self, _: &mut Context, _: &Tcb, reason: SoError) {
        self.finished = Some(Finished::Dropped(reason));
    }
}

/// The BSD send decision for a segment without SYN.
fn should_send(
    tcb: &Tcb,
    socket: &dyn Socket,
    flags: Flags,
    len: u32,
    off: u32,
    idle: bool,
    force: bool,
) -> bool {
    if len > 0 {
        if len == tcb.maxseg {
            return true;
        }
        // Nagle, a small segment only goes out when nothing is in flight.
        let nodelay = tcb.flags.contains(TcbFlags::NODELAY);
        if (idle || nodelay) && len + off >= socket.send_pending() {
            return true;
        }
        if force {
            return true;
        }
        // Sender silly window avoidance.
        if len >= tcb.max_sndwnd / 2 {
            return true;
        }
        if seq_lt(tcb.snd_nxt, tcb.snd_max) {
            return true;
        }
    }

    let space = socket.space_available();
    if space > 0 {
        let limit = i64::from(space.min(TCP_MAXWIN << tcb.rcv_scale));
        let adv = limit - i64::from((tcb.rcv_adv - tcb.rcv_nxt).max(0));
        if adv >= 2 * i64::from(tcb.maxseg) {
            return true;
        }
        if 2 * adv >= i64::from(socket.receive_capacity()) {
            return true;
        }
    }

    if tcb.flags.contains(TcbFlags::ACKNOW) {
        return true;
    }
    if flags.syn() || flags.rst() {
        return true;
    }
    if seq_gt(tcb.snd_up, tcb.snd_una) {
        return true;
    }
    flags.fin() && (!tcb.flags.contains(TcbFlags::SENTFIN) || tcb.snd_nxt == tcb.snd_una)
}

/// The receive window in octets, avoiding silly window updates and never shrinking.
fn receive_window(tcb: &Tcb, socket: &dyn Socket) -> u32 {
    let mut win = socket.space_available();
    if win < socket.receive_capacity() / 4 && win < tcb.maxseg {
        win = 0;
    }
    win = win.min(TCP_MAXWIN << tcb.rcv_scale);
    win.max((tcb.rcv_adv - tcb.rcv_nxt).max(0) as u32)
}

/// The header field of a window, a SYN is never scaled.
fn advertised(window: u32, scale: u8, syn: bool) -> u16 {
    let field = if syn { window } else { window >> scale };
    field.min(TCP_MAXWIN) as u16
}
