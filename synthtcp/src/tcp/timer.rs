//! Round trip estimation and the cooperative soft timers.
//!
//! Every connection has four timers counting down in slow ticks (500ms). The worker calls
//! [`Tcb::slow_timeout`] on each tick for each of its connections and [`Tcb::fast_timeout`] every
//! 200ms for delayed acknowledgments. Firing a timer is processed exactly like an incoming
//! segment: it mutates the state and may request output, nothing happens asynchronously.
//!
//! The round trip time is measured for one segment at a time, or from echoed timestamps when
//! these were negotiated, and smoothed with the Jacobson/Karels estimator. Both the smoothed value
//! and its deviation are kept as fixed point numbers, scaled by 8 and 4 respectively.
//!
//! [`Tcb::slow_timeout`]: ../struct.Tcb.html#method.slow_timeout
//! [`Tcb::fast_timeout`]: ../struct.Tcb.html#method.fast_timeout
use crate::wire::Flags;
use super::context::Context;
use super::io::{Output, Socket, SoError};
use super::state::State;
use super::tcb::{Tcb, TcbFlags};

/// Slow ticks per second.
pub const PR_SLOWHZ: u32 = 2;

/// Fast ticks per second.
pub const PR_FASTHZ: u32 = 5;

/// Maximum segment lifetime.
pub const TCPTV_MSL: u32 = 30 * PR_SLOWHZ;

/// The smoothed round trip time of a connection without measurement.
pub const TCPTV_SRTTBASE: i32 = 0;

/// The assumed round trip time before the first measurement.
pub const TCPTV_SRTTDFLT: i32 = 3 * PR_SLOWHZ as i32;

/// Minimum persist interval.
pub const TCPTV_PERSMIN: u32 = 5 * PR_SLOWHZ;

/// Maximum persist interval.
pub const TCPTV_PERSMAX: u32 = 60 * PR_SLOWHZ;

/// Minimum retransmission timeout.
pub const TCPTV_MIN: u32 = PR_SLOWHZ;

/// Maximum retransmission timeout.
pub const TCPTV_REXMTMAX: u32 = 64 * PR_SLOWHZ;

/// A `ts_recent` older than this is invalid, 24 days.
pub const TCP_PAWS_IDLE: u32 = 24 * 24 * 60 * 60 * PR_SLOWHZ;

/// Largest round trip sample the estimator accepts, about 97 days.
pub const TCP_RTT_MAX: i32 = 1 << 24;

/// Maximum number of retransmissions of one segment.
pub const TCP_MAXRXTSHIFT: u32 = 5;

const BACKOFF: [u32; TCP_MAXRXTSHIFT as usize + 1] = [1, 2, 4, 8, 16, 32];

/// Gentler backoff while the handshake is still in progress.
const SYN_BACKOFF: [u32; TCP_MAXRXTSHIFT as usize + 1] = [1, 1, 1, 2, 2, 3];

/// The soft timers of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Retransmit unacknowledged data.
    Retransmit = 0,
    /// Probe a closed send window.
    Persist = 1,
    /// Connection establishment, keepalive probes.
    Keepalive = 2,
    /// `TimeWait` and the idle limit of `FinWait2`.
    TwoMsl = 3,
}

/// Remaining slow ticks of each timer, `0` when stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Timers([u32; 4]);

impl Timer {
    /// All timers in the order they are checked on each tick.
    pub const ALL: [Timer; 4] = [Timer::Retransmit, Timer::Persist, Timer::Keepalive, Timer::TwoMsl];
}

impl Timers {
    /// Remaining ticks of a timer.
    pub fn get(&self, timer: Timer) -> u32 {
        self.0[timer as usize]
    }

    /// Arm a timer, `0` stops it.
    pub fn set(&mut self, timer: Timer, ticks: u32) {
        self.0[timer as usize] = ticks;
    }

    /// Stop a timer.
    pub fn stop(&mut self, timer: Timer) {
        self.set(timer, 0)
    }

    /// If the timer is armed.
    pub fn is_running(&self, timer: Timer) -> bool {
        self.get(timer) != 0
    }

    /// Stop all timers.
    pub fn cancel_all(&mut self) {
        self.0 = [0; 4];
    }

    /// Count down an armed timer, returns if it expired.
    fn tick(&mut self, timer: Timer) -> bool {
        let ticks = &mut self.0[timer as usize];
        if *ticks == 0 {
            return false;
        }
        *ticks -= 1;
        *ticks == 0
    }
}

/// Bound a timer value.
pub fn range_set(value: i32, min: u32, max: u32) -> u32 {
    if value < 0 {
        return min;
    }
    (value as u32).max(min).min(max)
}

impl Tcb {
    /// The unbounded retransmission timeout of the current estimate.
    pub fn rexmtval(&self) -> i32 {
        (self.srtt >> 3) + 4 * (self.rttvar >> 2)
    }

    /// Update the estimator with one measured round trip, in slow ticks.
    pub fn record_rtt_sample(&mut self, ctx: &mut Context, rtt: i32) {
        ctx.stats.rttupdated += 1;
        let rtt = rtt.max(1).min(TCP_RTT_MAX);

        if self.srtt != 0 {
            let delta = rtt - 1 - (self.srtt >> 3);
            self.srtt += delta;
            if self.srtt <= 0 {
                self.srtt = 1;
            }

            let delta = delta.abs() - (self.rttvar >> 2);
            self.rttvar += delta;
            if self.rttvar <= 0 {
                self.rttvar = 1;
            }
        } else {
            self.srtt = rtt << 3;
            self.rttvar = rtt << 1;
        }

        self.rtt = 0;
        self.rxtshift = 0;
        self.rxtcur = range_set(self.rexmtval(), self.rttmin, TCPTV_REXMTMAX);
        self.softerror = None;
    }

    /// Arm the persist timer with the backed off interval.
    pub fn set_persist(&mut self) {
        let base = ((self.srtt >> 2) + self.rttvar) >> 1;
        let backoff = BACKOFF[self.rxtshift as usize] as i32;
        let ticks = range_set(base.saturating_mul(backoff), TCPTV_PERSMIN, TCPTV_PERSMAX);
        self.timers.set(Timer::Persist, ticks);
        if self.rxtshift < TCP_MAXRXTSHIFT {
            self.rxtshift += 1;
        }
    }

    /// Process one slow tick.
    pub fn slow_timeout(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        for &timer in Timer::ALL.iter() {
            if self.timers.tick(timer) {
                self.expire(ctx, socket, output, timer);
                if self.state == State::Closed {
                    return;
                }
            }
        }

        self.idle = self.idle.saturating_add(1);
        if self.rtt != 0 {
            self.rtt += 1;
        }
    }

    /// Process one fast tick, sending a delayed acknowledgment.
    pub fn fast_timeout(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        if self.flags.contains(TcbFlags::DELACK) {
            self.flags.remove(TcbFlags::DELACK);
            self.flags.insert(TcbFlags::ACKNOW);
            ctx.stats.delack += 1;
            output.emit(ctx, self, socket);
        }
    }

    fn expire(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output, timer: Timer) {
        match timer {
            Timer::Retransmit => self.retransmit_timeout(ctx, socket, output),
            Timer::Persist => self.persist_timeout(ctx, socket, output),
            Timer::Keepalive => self.keepalive_timeout(ctx, socket, output),
            Timer::TwoMsl => self.two_msl_timeout(ctx, output),
        }
    }

    fn retransmit_timeout(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        self.rxtshift += 1;
        if self.rxtshift > TCP_MAXRXTSHIFT {
            self.rxtshift = TCP_MAXRXTSHIFT;
            ctx.stats.timeoutdrop += 1;
            let error = self.softerror.unwrap_or(SoError::TimedOut);
            self.drop(ctx, socket, output, error);
            return;
        }

        ctx.stats.rexmttimeo += 1;
        let backoff = if self.state.is_synchronized() {
            &BACKOFF
        } else {
            ctx.stats.rexmttimeo_syn += 1;
            &SYN_BACKOFF
        };

        let rexmt = self.rexmtval() * backoff[self.rxtshift as usize] as i32;
        self.rxtcur = range_set(rexmt, self.rttmin, TCPTV_REXMTMAX);
        self.timers.set(Timer::Retransmit, self.rxtcur);
        net_debug!("tcp: retransmit timeout, shift {} rto {}", self.rxtshift, self.rxtcur);

        // After a few backoffs the estimate is likely wrong, fold it into the deviation.
        if self.rxtshift > TCP_MAXRXTSHIFT / 4 {
            self.rttvar += self.srtt >> 3;
            self.srtt = 0;
        }

        self.snd_nxt = self.snd_una;
        self.rtt = 0;
        self.reduce_ssthresh();
        self.snd_cwnd = self.maxseg;
        self.dupacks = 0;
        output.emit(ctx, self, socket);
    }

    fn persist_timeout(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        ctx.stats.persisttimeo += 1;
        self.set_persist();
        self.flags.insert(TcbFlags::FORCE);
        output.emit(ctx, self, socket);
        self.flags.remove(TcbFlags::FORCE);
    }

    fn keepalive_timeout(&mut self, ctx: &mut Context, socket: &mut dyn Socket, output: &mut dyn Output) {
        ctx.stats.keeptimeo += 1;
        if !self.state.is_synchronized() {
            ctx.stats.keepdrops += 1;
            self.drop(ctx, socket, output, SoError::TimedOut);
            return;
        }

        if self.keepalive && self.state <= State::CloseWait {
            if self.idle >= self.keep_idle + self.max_idle {
                ctx.stats.keepdrops += 1;
                self.drop(ctx, socket, output, SoError::TimedOut);
                return;
            }

            ctx.stats.keepprobe += 1;
            output.respond(ctx, self, self.snd_una - 1, self.rcv_nxt, Flags::ACK);
            self.timers.set(Timer::Keepalive, self.keep_intvl);
        } else {
            self.timers.set(Timer::Keepalive, self.keep_idle);
        }
    }

    fn two_msl_timeout(&mut self, ctx: &mut Context, output: &mut dyn Output) {
        if self.state != State::TimeWait && self.idle <= self.max_idle {
            self.timers.set(Timer::TwoMsl, self.keep_intvl);
        } else {
            self.close(ctx, output);
        }
    }
}
