//! Processing of a single inbound segment.
//!
//! The algorithm is the classic BSD receive path. It is split along its natural stages: header
//! prediction, the two unsynchronized states, the acceptability tests (timestamps, trimming to
//! the window, reset and stray SYNs), acknowledgment processing and finally the window update,
//! data and FIN processing. Every stage either continues or ends the segment with one of the exit
//! labels of [`Disposition`], which the entry point performs exactly once.
use crate::wire::{seq_gt, seq_leq, seq_lt, Flags, Segment, SeqNumber};
use super::context::{Context, ISS_INCR};
use super::io::{Output, Socket, SoError};
use super::options::Timestamp;
use super::state::State;
use super::tcb::{Tcb, TcbFlags};
use super::timer::{Timer, TCPTV_MSL, TCP_PAWS_IDLE};

/// How the processing of a segment ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disposition {
    /// Fully processed, send if requested or an acknowledgment is due.
    Continue {
        need_output: bool,
    },
    /// Discard silently.
    Drop(&'static str),
    /// Discard but acknowledge, unless the segment was a reset itself.
    DropAfterAck(&'static str),
    /// Discard and answer with a reset, unless the segment was a reset itself.
    DropWithReset(&'static str),
    /// A SYN reopened a connection in `TimeWait`, process it again for the new incarnation.
    Reopen(SeqNumber),
}

/// The mutable view of a segment while it is being trimmed.
struct Incoming<'a> {
    seq: SeqNumber,
    ack: SeqNumber,
    flags: Flags,
    /// The window, scaled unless the segment is a SYN.
    tiwin: u32,
    urgent: u32,
    len: u32,
    data: &'a [u8],
    ts: Option<Timestamp>,
    fin_processed: bool,
}

impl<'a> Incoming<'a> {
    fn new(segment: Segment, payload: &'a [u8]) -> Self {
        // A header claiming more than the buffer holds is truncated to it.
        let len = segment.len.min(payload.len() as u32);
        Incoming {
            seq: segment.seq,
            ack: segment.ack,
            flags: segment.flags,
            tiwin: u32::from(segment.window),
            urgent: u32::from(segment.urgent),
            len,
            data: &payload[..len as usize],
            ts: None,
            fin_processed: false,
        }
    }

    fn drop_front(&mut self, count: u32) {
        let count = count.min(self.len);
        self.data = &self.data[count as usize..];
        self.seq += count;
        self.len -= count;
    }

    fn drop_back(&mut self, count: u32) {
        let count = count.min(self.len);
        self.len -= count;
        self.data = &self.data[..self.len as usize];
    }

    /// Only ACK is set among the flags relevant to prediction.
    fn is_plain_ack(&self) -> bool {
        let flags = self.flags;
        flags.ack() && !flags.syn() && !flags.fin() && !flags.rst() && !flags.urg()
    }
}

fn ts_lt(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

fn ts_geq(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) >= 0
}

impl Tcb {
    /// Process one inbound segment of this connection.
    ///
    /// The `options` are the raw option octets of the header. The segment length is bounded by
    /// the payload, in-order payload is appended to the socket while out-of-order data is only
    /// accounted for. All responses are requested from `output` before returning.
    ///
    /// Returns `true` if the segment carried a FIN that was processed.
    pub fn input(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        segment: Segment,
        options: &[u8],
        payload: &[u8],
    ) -> bool {
        ctx.stats.rcvtotal += 1;

        loop {
            let mut seg = Incoming::new(segment, payload);
            match self.process(ctx, socket, output, &mut seg, options) {
                Disposition::Continue { need_output } => {
                    if need_output || self.flags.contains(TcbFlags::ACKNOW) {
                        output.emit(ctx, self, socket);
                    }
                    return seg.fin_processed;
                },
                Disposition::Drop(reason) => {
                    net_trace!("tcp: drop {} seq={}: {}", seg.flags, seg.seq, reason);
                    return false;
                },
                Disposition::DropAfterAck(reason) => {
                    net_trace!("tcp: drop {} seq={} after ack: {}", seg.flags, seg.seq, reason);
                    if !seg.flags.rst() {
                        self.flags.insert(TcbFlags::ACKNOW);
                        output.emit(ctx, self, socket);
                    }
                    return false;
                },
                Disposition::DropWithReset(reason) => {
                    net_trace!("tcp: reset {} seq={}: {}", seg.flags, seg.seq, reason);
                    self.reset(ctx, output, &seg);
                    return false;
                },
                Disposition::Reopen(iss) => {
                    net_debug!("tcp: SYN reopens connection in TIME_WAIT, iss {}", iss);
                    self.reincarnate(ctx, iss);
                },
            }
        }
    }

    /// Answer a segment with a reset that the peer will accept.
    fn reset(&self, ctx: &mut Context, output: &mut dyn Output, seg: &Incoming) {
        if seg.flags.rst() {
            return;
        }

        if seg.flags.ack() {
            output.respond(ctx, self, seg.ack, SeqNumber(0), Flags::RST);
        } else {
            let ack = seg.seq + seg.len + seg.flags.sequence_len();
            output.respond(ctx, self, SeqNumber(0), ack, Flags::RST | Flags::ACK);
        }
    }

    fn process(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        seg: &mut Incoming,
        options: &[u8],
    ) -> Disposition {
        if self.state == State::Closed {
            return Disposition::Drop("no connection");
        }

        if !seg.flags.syn() {
            seg.tiwin <<= self.snd_scale;
        }

        self.idle = 0;
        if self.state.is_synchronized() {
            self.timers.set(Timer::Keepalive, self.keep_idle);
        }

        if self.state != State::Listen {
            seg.ts = self.process_options(ctx, options, seg.flags.syn());
            let negotiated = TcbFlags::REQ_TSTMP | TcbFlags::RCVD_TSTMP;
            if !self.flags.contains(negotiated) {
                seg.ts = None;
            }
        }

        if let Some(ts) = seg.ts.as_mut() {
            // An echo from the future was not sent by us.
            if ts_lt(ctx.now, ts.ecr) {
                ts.ecr = 0;
            }
        }

        if let Some(done) = self.predict(ctx, socket, seg) {
            return done;
        }

        let space = socket.space_available();
        self.rcv_wnd = space.max((self.rcv_adv - self.rcv_nxt).max(0) as u32);

        match self.state {
            State::Listen => self.listen_input(ctx, socket, seg, options),
            State::SynSent => self.syn_sent_input(ctx, socket, output, seg),
            _ => self.synchronized_input(ctx, socket, output, seg),
        }
    }

    /// Header prediction for the two common cases of a one-way transfer.
    ///
    /// Returns `None` if the segment needs the complete processing.
    fn predict(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        seg: &Incoming,
    ) -> Option<Disposition> {
        let predictable = self.state == State::Established
            && seg.is_plain_ack()
            && seg.ts.map_or(true, |ts| ts_geq(ts.val, self.ts_recent))
            && seg.seq == self.rcv_nxt
            && seg.tiwin != 0
            && seg.tiwin == self.snd_wnd
            && self.snd_nxt == self.snd_max;

        if !predictable {
            return None;
        }

        if let Some(ts) = seg.ts {
            if seq_leq(seg.seq, self.last_ack_sent) {
                self.ts_recent_age = ctx.now;
                self.ts_recent = ts.val;
            }
        }

        if seg.len == 0 {
            if seq_gt(seg.ack, self.snd_una)
                && seq_leq(seg.ack, self.snd_max)
                && self.snd_cwnd >= self.snd_wnd
            {
                ctx.stats.predack += 1;
                self.ack_rtt(ctx, seg);

                let acked = (seg.ack - self.snd_una) as u32;
                ctx.stats.rcvackpack += 1;
                ctx.stats.rcvackbyte += u64::from(acked);
                socket.drop_bytes(acked);
                self.snd_una = seg.ack;

                if self.snd_una == self.snd_max {
                    self.timers.stop(Timer::Retransmit);
                } else if !self.timers.is_running(Timer::Persist) {
                    self.timers.set(Timer::Retransmit, self.rxtcur);
                }

                socket.wake_writers();
                return Some(Disposition::Continue { need_output: socket.send_pending() > 0 });
            }
        } else if seg.ack == self.snd_una
            && self.reass.is_none()
            && seg.len <= socket.space_available()
        {
            ctx.stats.preddat += 1;
            self.rcv_nxt += seg.len;
            ctx.stats.rcvpack += 1;
            ctx.stats.rcvbyte += u64::from(seg.len);
            if !socket.cant_receive_more() {
                socket.append(seg.data);
            }
            socket.wake_readers();

            if self.delay_ack(seg.flags.psh(), seg.len) {
                self.flags.insert(TcbFlags::DELACK);
            } else {
                self.flags.insert(TcbFlags::ACKNOW);
            }
            return Some(Disposition::Continue { need_output: false });
        }

        None
    }

    /// Time the acknowledgment, from its echoed timestamp if there is one.
    fn ack_rtt(&mut self, ctx: &mut Context, seg: &Incoming) {
        match seg.ts {
            Some(ts) if ts.ecr != 0 => {
                let rtt = (ctx.now.wrapping_sub(ts.ecr) as i32).saturating_add(1);
                self.record_rtt_sample(ctx, rtt);
            },
            _ => if self.rtt != 0 && seq_gt(seg.ack, self.rtseq) {
                let rtt = self.rtt as i32;
                self.record_rtt_sample(ctx, rtt);
            },
        }
    }

    fn listen_input(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        seg: &mut Incoming,
        options: &[u8],
    ) -> Disposition {
        if seg.flags.rst() {
            return Disposition::Drop("reset while listening");
        }
        if seg.flags.ack() {
            return Disposition::DropWithReset("ack while listening");
        }
        if !seg.flags.syn() {
            return Disposition::Drop("no SYN while listening");
        }

        self.request_scale(socket.receive_capacity());
        seg.ts = self.process_options(ctx, options, true);
        if !self.flags.contains(TcbFlags::REQ_TSTMP) {
            seg.ts = None;
        }

        let fresh = ctx.next_iss();
        self.iss = self.pending_iss.take().unwrap_or(fresh);
        self.irs = seg.seq;
        self.send_seq_init();
        self.rcv_seq_init();
        self.flags.insert(TcbFlags::ACKNOW);
        self.set_state(State::SynReceived);
        self.timers.set(Timer::Keepalive, self.keep_init);
        ctx.stats.accepts += 1;

        self.trim_then_step6(ctx, socket, seg)
    }

    fn syn_sent_input(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        seg: &mut Incoming,
    ) -> Disposition {
        let ack = seg.flags.ack();
        if ack && (seq_leq(seg.ack, self.iss) || seq_gt(seg.ack, self.snd_max)) {
            return Disposition::DropWithReset("ack outside of our SYN");
        }
        if seg.flags.rst() {
            if ack {
                self.drop(ctx, socket, output, SoError::ConnectionRefused);
            }
            return Disposition::Drop("reset in SYN_SENT");
        }
        if !seg.flags.syn() {
            return Disposition::Drop("no SYN in SYN_SENT");
        }

        if ack {
            self.snd_una = seg.ack;
            if seq_lt(self.snd_nxt, self.snd_una) {
                self.snd_nxt = self.snd_una;
            }
        }
        self.timers.stop(Timer::Retransmit);
        self.irs = seg.seq;
        self.rcv_seq_init();
        self.flags.insert(TcbFlags::ACKNOW);

        if ack && seq_gt(self.snd_una, self.iss) {
            ctx.stats.connects += 1;
            self.set_state(State::Established);
            self.apply_scale();
            self.deliver_queued(ctx, socket);
            if self.rtt != 0 {
                let rtt = self.rtt as i32;
                self.record_rtt_sample(ctx, rtt);
            }
        } else {
            // Simultaneous open.
            self.set_state(State::SynReceived);
        }

        self.trim_then_step6(ctx, socket, seg)
    }

    /// Skip the SYN, trim data beyond the window and continue with the window update.
    fn trim_then_step6(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        seg: &mut Incoming,
    ) -> Disposition {
        seg.seq += 1;
        if seg.len > self.rcv_wnd {
            let todrop = seg.len - self.rcv_wnd;
            seg.drop_back(todrop);
            seg.flags.set_fin(false);
            ctx.stats.rcvpackafterwin += 1;
            ctx.stats.rcvbyteafterwin += u64::from(todrop);
        }
        self.snd_wl1 = seg.seq - 1;
        self.rcv_up = seg.seq;

        self.step6(ctx, socket, seg, false)
    }

    /// The acceptability tests and everything after for the synchronized states and
    /// `SynReceived`.
    fn synchronized_input(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        seg: &mut Incoming,
    ) -> Disposition {
        if let Some(ts) = seg.ts {
            if !seg.flags.rst() && self.ts_recent != 0 && ts_lt(ts.val, self.ts_recent) {
                if ctx.now.wrapping_sub(self.ts_recent_age) as i32 > TCP_PAWS_IDLE as i32 {
                    // Too old to compare against, take the next one.
                    self.ts_recent = 0;
                } else {
                    ctx.stats.rcvduppack += 1;
                    ctx.stats.rcvdupbyte += u64::from(seg.len);
                    ctx.stats.pawsdrop += 1;
                    return Disposition::DropAfterAck("timestamp older than ts_recent");
                }
            }
        }

        let todrop = self.rcv_nxt - seg.seq;
        if todrop > 0 {
            self.trim_front(ctx, seg, todrop as u32);
        }

        if socket.app_closed() && self.state > State::CloseWait && seg.len > 0 {
            self.close(ctx, output);
            ctx.stats.rcvafterclose += 1;
            return Disposition::DropWithReset("data after close");
        }

        let todrop = (seg.seq + seg.len) - (self.rcv_nxt + self.rcv_wnd);
        if todrop > 0 {
            let todrop = todrop as u32;
            ctx.stats.rcvpackafterwin += 1;
            if todrop >= seg.len {
                ctx.stats.rcvbyteafterwin += u64::from(seg.len);
                if seg.flags.syn()
                    && self.state == State::TimeWait
                    && seq_gt(seg.seq, self.rcv_nxt)
                {
                    return Disposition::Reopen(self.rcv_nxt + ISS_INCR);
                }

                if self.rcv_wnd == 0 && seg.seq == self.rcv_nxt {
                    self.flags.insert(TcbFlags::ACKNOW);
                    ctx.stats.rcvwinprobe += 1;
                } else {
                    return Disposition::DropAfterAck("beyond the window");
                }
            } else {
                ctx.stats.rcvbyteafterwin += u64::from(todrop);
            }
            seg.drop_back(todrop);
            seg.flags.set_psh(false);
            seg.flags.set_fin(false);
        }

        if let Some(ts) = seg.ts {
            let end = seg.seq + seg.len + u32::from(seg.flags.syn() || seg.flags.fin());
            if seq_leq(seg.seq, self.last_ack_sent) && seq_leq(self.last_ack_sent, end) {
                self.ts_recent_age = ctx.now;
                self.ts_recent = ts.val;
            }
        }

        if seg.flags.rst() {
            return self.reset_received(ctx, socket, output);
        }

        if seg.flags.syn() {
            self.drop(ctx, socket, output, SoError::ConnectionReset);
            return Disposition::DropWithReset("SYN in window");
        }

        if !seg.flags.ack() {
            return Disposition::Drop("no ACK");
        }

        match self.process_ack(ctx, socket, output, seg) {
            Disposition::Continue { need_output } => self.step6(ctx, socket, seg, need_output),
            exit => exit,
        }
    }

    /// Drop the octets in front of `rcv_nxt` that were already received.
    fn trim_front(&mut self, ctx: &mut Context, seg: &mut Incoming, mut todrop: u32) {
        if seg.flags.syn() {
            seg.flags.set_syn(false);
            seg.seq += 1;
            if seg.urgent > 1 {
                seg.urgent -= 1;
            } else {
                seg.flags.set_urg(false);
            }
            todrop -= 1;
        }

        if todrop > seg.len || (todrop == seg.len && !seg.flags.fin()) {
            // Entirely old, a FIN in it must be a duplicate as well.
            seg.flags.set_fin(false);
            self.flags.insert(TcbFlags::ACKNOW);
            todrop = seg.len;
            ctx.stats.rcvduppack += 1;
            ctx.stats.rcvdupbyte += u64::from(todrop);
        } else {
            ctx.stats.rcvpartduppack += 1;
            ctx.stats.rcvpartdupbyte += u64::from(todrop);
        }

        seg.drop_front(todrop);
        if seg.urgent > todrop {
            seg.urgent -= todrop;
        } else {
            seg.flags.set_urg(false);
            seg.urgent = 0;
        }
    }

    fn reset_received(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
    ) -> Disposition {
        let error = match self.state {
            State::SynReceived => Some(SoError::ConnectionRefused),
            State::Established | State::FinWait1 | State::FinWait2 | State::CloseWait => {
                Some(SoError::ConnectionReset)
            },
            _ => None,
        };

        if let Some(error) = error {
            socket.set_error(error);
            self.set_state(State::Closed);
            ctx.stats.drops += 1;
        }
        self.close(ctx, output);
        Disposition::Drop("connection reset")
    }

    fn process_ack(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        seg: &mut Incoming,
    ) -> Disposition {
        if self.state == State::SynReceived {
            if seq_gt(self.snd_una, seg.ack) || seq_gt(seg.ack, self.snd_max) {
                return Disposition::DropWithReset("ack outside of our SYN");
            }
            ctx.stats.connects += 1;
            self.set_state(State::Established);
            self.apply_scale();
            // A queued FIN is ignored here, the peer retransmits it.
            self.deliver_queued(ctx, socket);
            self.snd_wl1 = seg.seq - 1;
        }

        if seq_leq(seg.ack, self.snd_una) {
            if seg.len == 0 && seg.tiwin == self.snd_wnd {
                if self.duplicate_ack(ctx, socket, output, seg.ack) {
                    return Disposition::Drop("duplicate ack consumed");
                }
            } else {
                self.dupacks = 0;
            }
            return Disposition::Continue { need_output: false };
        }

        self.end_recovery();
        if seq_gt(seg.ack, self.snd_max) {
            ctx.stats.rcvacktoomuch += 1;
            return Disposition::DropAfterAck("ack for unsent data");
        }

        let acked = (seg.ack - self.snd_una) as u32;
        ctx.stats.rcvackpack += 1;
        ctx.stats.rcvackbyte += u64::from(acked);
        self.ack_rtt(ctx, seg);

        let mut need_output = false;
        if seg.ack == self.snd_max {
            self.timers.stop(Timer::Retransmit);
            need_output = true;
        } else if !self.timers.is_running(Timer::Persist) {
            self.timers.set(Timer::Retransmit, self.rxtcur);
        }

        self.open_cwnd();

        // Our SYN occupies sequence space but not the send buffer.
        let data_acked = if self.snd_una == self.iss { acked - 1 } else { acked };
        let pending = socket.send_pending();
        let our_fin_acked = if data_acked > pending {
            self.snd_wnd = self.snd_wnd.saturating_sub(pending);
            socket.drop_all();
            true
        } else {
            socket.drop_bytes(data_acked);
            self.snd_wnd = self.snd_wnd.saturating_sub(data_acked);
            false
        };
        socket.wake_writers();

        self.snd_una = seg.ack;
        if seq_lt(self.snd_nxt, self.snd_una) {
            self.snd_nxt = self.snd_una;
        }

        match self.state {
            State::FinWait1 if our_fin_acked => {
                if socket.cant_receive_more() {
                    self.timers.set(Timer::TwoMsl, self.max_idle);
                }
                self.set_state(State::FinWait2);
            },
            State::Closing if our_fin_acked => {
                self.enter_time_wait();
            },
            State::LastAck if our_fin_acked => {
                self.close(ctx, output);
                return Disposition::Drop("connection closed");
            },
            State::TimeWait => {
                self.timers.set(Timer::TwoMsl, 2 * TCPTV_MSL);
                return Disposition::DropAfterAck("retransmitted FIN in TIME_WAIT");
            },
            _ => (),
        }

        Disposition::Continue { need_output }
    }

    /// Window update, urgent pointer, data and FIN.
    fn step6(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        seg: &mut Incoming,
        mut need_output: bool,
    ) -> Disposition {
        let newer = seq_lt(self.snd_wl1, seg.seq)
            || (self.snd_wl1 == seg.seq
                && (seq_lt(self.snd_wl2, seg.ack)
                    || (self.snd_wl2 == seg.ack && seg.tiwin > self.snd_wnd)));

        if seg.flags.ack() && newer {
            if seg.len == 0 && self.snd_wl2 == seg.ack && seg.tiwin > self.snd_wnd {
                ctx.stats.rcvwinupd += 1;
            }
            self.snd_wnd = seg.tiwin;
            self.snd_wl1 = seg.seq;
            self.snd_wl2 = seg.ack;
            self.max_sndwnd = self.max_sndwnd.max(self.snd_wnd);
            need_output = true;
        }

        if seg.flags.urg() && seg.urgent != 0 && !self.state.have_rcvd_fin() {
            let up = seg.seq + seg.urgent;
            if seq_gt(up, self.rcv_up) {
                self.rcv_up = up;
            }
        } else if seq_gt(self.rcv_nxt, self.rcv_up) {
            self.rcv_up = self.rcv_nxt;
        }

        let mut fin = false;
        if (seg.len > 0 || seg.flags.fin()) && !self.state.have_rcvd_fin() {
            fin = self.receive_data(ctx, socket, seg);
        }

        if fin {
            self.receive_fin(socket);
            seg.fin_processed = true;
        }

        Disposition::Continue { need_output }
    }

    /// Deliver the segment in order or queue it, returns if a FIN became visible.
    fn receive_data(&mut self, ctx: &mut Context, socket: &mut dyn Socket, seg: &Incoming) -> bool {
        if seg.seq == self.rcv_nxt && self.reass.is_none() && self.state.is_synchronized() {
            if self.delay_ack(seg.flags.psh(), seg.len) {
                self.flags.insert(TcbFlags::DELACK);
            } else {
                self.flags.insert(TcbFlags::ACKNOW);
            }
            self.rcv_nxt += seg.len;
            ctx.stats.rcvpack += 1;
            ctx.stats.rcvbyte += u64::from(seg.len);
            if !socket.cant_receive_more() {
                socket.append(seg.data);
            }
            socket.wake_readers();
            seg.flags.fin()
        } else {
            let fin = self.reassemble(ctx, socket, seg.seq, seg.len, seg.flags.fin());
            self.flags.insert(TcbFlags::ACKNOW);
            fin
        }
    }

    fn receive_fin(&mut self, socket: &mut dyn Socket) {
        if !self.state.have_rcvd_fin() {
            socket.mark_cant_receive_more();
            self.flags.insert(TcbFlags::ACKNOW);
            self.rcv_nxt += 1;
        }

        match self.state {
            State::SynReceived | State::Established => self.set_state(State::CloseWait),
            State::FinWait1 => self.set_state(State::Closing),
            State::FinWait2 => self.enter_time_wait(),
            State::TimeWait => self.timers.set(Timer::TwoMsl, 2 * TCPTV_MSL),
            _ => (),
        }
    }

    fn enter_time_wait(&mut self) {
        self.set_state(State::TimeWait);
        self.timers.cancel_all();
        self.timers.set(Timer::TwoMsl, 2 * TCPTV_MSL);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamp_order() {
        assert!(ts_lt(1, 2));
        assert!(ts_lt(u32::max_value(), 1));
        assert!(!ts_lt(2, 2));
        assert!(ts_geq(2, 2));
        assert!(ts_geq(5, u32::max_value() - 5));
    }

    #[test]
    fn incoming_trims() {
        let payload = [1u8, 2, 3, 4, 5, 6];
        let segment = Segment {
            seq: SeqNumber(100),
            len: 10,
            ..Segment::default()
        };
        let mut seg = Incoming::new(segment, &payload);
        assert_eq!(seg.len, 6);
        seg.drop_front(2);
        assert_eq!(seg.seq, SeqNumber(102));
        assert_eq!(seg.data, &[3, 4, 5, 6][..]);
        seg.drop_back(3);
        assert_eq!(seg.data, &[3][..]);
        seg.drop_back(3);
        assert_eq!(seg.len, 0);
        assert!(seg.data.is_empty());
    }
}
