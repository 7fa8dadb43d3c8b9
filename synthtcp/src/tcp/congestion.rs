//! Reno congestion control, driven by the acknowledgment processing of the input path.
//!
//! Slow start below `snd_ssthresh`, congestion avoidance at and above it, fast retransmit after
//! `rexmt_thresh` duplicate acknowledgments and fast recovery by inflating the window for every
//! further duplicate.
use crate::wire::{seq_gt, SeqNumber};
use super::context::Context;
use super::io::{Output, Socket};
use super::tcb::{Tcb, TCP_MAXWIN};
use super::timer::Timer;

impl Tcb {
    /// Set the slow start threshold to half of the current flight, at least two segments.
    pub(crate) fn reduce_ssthresh(&mut self) {
        let maxseg = self.maxseg.max(1);
        let win = (self.snd_wnd.min(self.snd_cwnd) / 2 / maxseg).max(2);
        self.snd_ssthresh = win * maxseg;
    }

    /// Account a duplicate acknowledgment.
    ///
    /// Only counts while a retransmission is outstanding and the acknowledgment is exactly
    /// `snd_una`, anything else resets the count. Returns `true` if the acknowledgment triggered
    /// a retransmission or inflated the window, in which case the segment is consumed.
    pub(crate) fn duplicate_ack(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        ack: SeqNumber,
    ) -> bool {
        ctx.stats.rcvdupack += 1;

        if !self.timers.is_running(Timer::Retransmit) || ack != self.snd_una {
            self.dupacks = 0;
            return false;
        }

        self.dupacks += 1;
        if self.dupacks == self.rexmt_thresh {
            self.fast_retransmit(ctx, socket, output, ack);
            true
        } else if self.dupacks > self.rexmt_thresh {
            self.snd_cwnd = self.snd_cwnd.saturating_add(self.maxseg);
            output.emit(ctx, self, socket);
            true
        } else {
            false
        }
    }

    /// Retransmit the segment at `ack` and enter fast recovery.
    fn fast_retransmit(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        output: &mut dyn Output,
        ack: SeqNumber,
    ) {
        let onxt = self.snd_nxt;
        self.reduce_ssthresh();
        self.timers.stop(Timer::Retransmit);
        self.rtt = 0;
        self.snd_nxt = ack;
        self.snd_cwnd = self.maxseg;
        ctx.stats.sndrexmitfast += 1;
        net_debug!("tcp: fast retransmit at {}, ssthresh {}", ack, self.snd_ssthresh);

        output.emit(ctx, self, socket);

        // The peer holds `dupacks` segments beyond the hole.
        self.snd_cwnd = self.snd_ssthresh + self.maxseg * self.dupacks;
        if seq_gt(onxt, self.snd_nxt) {
            self.snd_nxt = onxt;
        }
    }

    /// Leave fast recovery on an acknowledgment of new data.
    pub(crate) fn end_recovery(&mut self) {
        if self.dupacks > self.rexmt_thresh && self.snd_cwnd > self.snd_ssthresh {
            self.snd_cwnd = self.snd_ssthresh;
        }
        self.dupacks = 0;
    }

    /// Open the congestion window for an acknowledgment of new data.
    pub(crate) fn open_cwnd(&mut self) {
        let cw = self.snd_cwnd;
        let incr = if cw >= self.snd_ssthresh {
            (u64::from(self.maxseg) * u64::from(self.maxseg) / u64::from(cw.max(1))) as u32
        } else {
            self.maxseg
        };
        self.snd_cwnd = cw.saturating_add(incr).min(TCP_MAXWIN << self.snd_scale);
    }
}
