//! Interpretation of the options of a received segment.
//!
//! The walk is deliberately permissive. Options of a known kind but an unexpected length are
//! skipped as if unknown, only a length that can not be right (shorter than two octets or running
//! past the end of the buffer) ends the walk. Nothing here is ever reported as an error.
use byteorder::{ByteOrder, NetworkEndian};

use crate::wire::OptionKind;
use super::context::Context;
use super::tcb::{Tcb, TcbFlags, TCP_MAX_WINSHIFT, TCP_MIN_MSS};

const LEN_MAXSEG: usize = 4;
const LEN_WINDOW: usize = 3;
const LEN_TIMESTAMP: usize = 10;

/// A timestamp option of a received segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// The sender's clock.
    pub val: u32,
    /// Our clock value echoed by the sender.
    pub ecr: u32,
}

/// The congestion window for the first flight.
pub fn initial_window(mss: u32, factor: u32) -> u32 {
    mss.saturating_mul(factor)
}

impl Tcb {
    /// Walk the options of a segment, applying those that configure the connection.
    ///
    /// The maximum segment size and the window scale are only honored on a SYN. A SYN without a
    /// maximum segment size falls back to the default size. Returns the timestamp if the segment
    /// had one.
    pub fn process_options(&mut self, ctx: &Context, options: &[u8], syn: bool) -> Option<Timestamp> {
        let mut timestamp = None;
        let mut saw_mss = false;
        let mut rest = options;

        while let Some(&kind) = rest.first() {
            let len = match OptionKind::from(kind) {
                OptionKind::EndOfList => break,
                OptionKind::NoOperation => 1,
                _ => match rest.get(1) {
                    Some(&len) if len >= 2 && usize::from(len) <= rest.len() => usize::from(len),
                    _ => break,
                },
            };

            let (option, next) = rest.split_at(len);
            rest = next;

            match OptionKind::from(kind) {
                OptionKind::MaxSegmentSize if len == LEN_MAXSEG && syn => {
                    let mss = NetworkEndian::read_u16(&option[2..4]);
                    self.negotiate_mss(ctx, mss);
                    saw_mss = true;
                },
                OptionKind::WindowScale if len == LEN_WINDOW && syn => {
                    self.flags.insert(TcbFlags::RCVD_SCALE);
                    self.requested_s_scale = option[2].min(TCP_MAX_WINSHIFT);
                },
                OptionKind::Timestamp if len == LEN_TIMESTAMP => {
                    let ts = Timestamp {
                        val: NetworkEndian::read_u32(&option[2..6]),
                        ecr: NetworkEndian::read_u32(&option[6..10]),
                    };
                    if syn {
                        self.flags.insert(TcbFlags::RCVD_TSTMP);
                        self.ts_recent = ts.val;
                        self.ts_recent_age = ctx.now;
                    }
                    timestamp = Some(ts);
                },
                _ => {
                    net_trace!("tcp: ignoring option {} of length {}", kind, len);
                },
            }
        }

        if syn && !saw_mss {
            self.negotiate_mss(ctx, 0);
        }

        timestamp
    }

    /// Choose the maximum segment size and the initial congestion window.
    ///
    /// An `offer` of `0` means the peer did not announce a size. Our own size and the initial
    /// window come from the template overrides when present, else from the process defaults.
    pub fn negotiate_mss(&mut self, ctx: &Context, offer: u16) {
        let config = &ctx.config;
        let (mss, factor) = match self.tune {
            None => {
                self.flags.set(TcbFlags::NODELAY, config.no_delay);
                (config.mss, config.initwnd)
            },
            Some(tune) => {
                if let Some(no_delay) = tune.no_delay {
                    self.flags.set(TcbFlags::NODELAY, no_delay);
                }
                (tune.mss.unwrap_or(config.mss), tune.initwnd.unwrap_or(config.initwnd))
            },
        };

        let mut mss = u32::from(mss);
        if offer != 0 {
            mss = mss.min(u32::from(offer));
        }
        let mss = mss.max(TCP_MIN_MSS);

        self.maxseg = mss;
        self.snd_cwnd = initial_window(mss, factor);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tcp::config::{Config, Tunables};

    fn tcb() -> (Context, Tcb) {
        let mut ctx = Context::new(Config::default());
        ctx.now = 77;
        let tcb = Tcb::new(&ctx, None);
        (ctx, tcb)
    }

    static SYN_OPTIONS: [u8; 20] = [
        0x02, 0x04, 0x02, 0x18,
        0x01, 0x03, 0x03, 0x07,
        0x01, 0x01, 0x08, 0x0a, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn syn_options() {
        let (ctx, mut tcb) = tcb();
        let ts = tcb.process_options(&ctx, &SYN_OPTIONS, true);
        assert_eq!(ts, Some(Timestamp { val: 256, ecr: 0 }));
        assert_eq!(tcb.maxseg, 536);
        assert_eq!(tcb.snd_cwnd, 5360);
        assert!(tcb.flags.contains(TcbFlags::RCVD_SCALE | TcbFlags::RCVD_TSTMP));
        assert_eq!(tcb.requested_s_scale, 7);
        assert_eq!(tcb.ts_recent, 256);
        assert_eq!(tcb.ts_recent_age, 77);
    }

    #[test]
    fn only_timestamp_without_syn() {
        let (ctx, mut tcb) = tcb();
        let ts = tcb.process_options(&ctx, &SYN_OPTIONS, false);
        assert_eq!(ts, Some(Timestamp { val: 256, ecr: 0 }));
        assert_eq!(tcb.maxseg, 1460);
        assert!(!tcb.flags.intersects(TcbFlags::RCVD_SCALE | TcbFlags::RCVD_TSTMP));
        assert_eq!(tcb.ts_recent, 0);
    }

    #[test]
    fn scale_is_capped() {
        let (ctx, mut tcb) = tcb();
        tcb.process_options(&ctx, &[0x03, 0x03, 20], true);
        assert_eq!(tcb.requested_s_scale, TCP_MAX_WINSHIFT);
    }

    #[test]
    fn wrong_length_is_skipped() {
        let (ctx, mut tcb) = tcb();
        // An mss option of length 3, then a window scale.
        tcb.process_options(&ctx, &[0x02, 0x03, 0x10, 0x03, 0x03, 0x02], true);
        assert_eq!(tcb.maxseg, 1460);
        assert_eq!(tcb.requested_s_scale, 2);
    }

    #[test]
    fn malformed_stops() {
        let (ctx, mut tcb) = tcb();
        // Length zero.
        tcb.process_options(&ctx, &[0x22, 0x00, 0x03, 0x03, 0x02], true);
        assert!(!tcb.flags.contains(TcbFlags::RCVD_SCALE));
        // Length beyond the buffer.
        tcb.process_options(&ctx, &[0x03, 0x04, 0x02], true);
        assert!(!tcb.flags.contains(TcbFlags::RCVD_SCALE));
        // Kind without length.
        tcb.process_options(&ctx, &[0x01, 0x03], true);
        assert!(!tcb.flags.contains(TcbFlags::RCVD_SCALE));
    }

    #[test]
    fn end_of_list_stops() {
        let (ctx, mut tcb) = tcb();
        tcb.process_options(&ctx, &[0x00, 0x03, 0x03, 0x02], true);
        assert!(!tcb.flags.contains(TcbFlags::RCVD_SCALE));
    }

    #[test]
    fn unknown_is_skipped() {
        let (ctx, mut tcb) = tcb();
        tcb.process_options(&ctx, &[0x04, 0x02, 0x1e, 0x04, 0xaa, 0xbb, 0x03, 0x03, 0x05], true);
        assert_eq!(tcb.requested_s_scale, 5);
    }

    #[test]
    fn default_mss_on_syn() {
        let (ctx, mut tcb) = tcb();
        tcb.maxseg = 0;
        tcb.process_options(&ctx, &[], true);
        assert_eq!(tcb.maxseg, 1460);
        assert_eq!(tcb.snd_cwnd, 14600);
    }

    #[test]
    fn mss_floor() {
        let (ctx, mut tcb) = tcb();
        tcb.negotiate_mss(&ctx, 8);
        assert_eq!(tcb.maxseg, TCP_MIN_MSS);
    }

    #[test]
    fn tunables_override_present_fields() {
        let (ctx, mut tcb) = tcb();
        tcb.tune = Some(Tunables {
            mss: Some(1000),
            no_delay: Some(true),
            ..Tunables::default()
        });
        tcb.negotiate_mss(&ctx, 0);
        assert_eq!(tcb.maxseg, 1000);
        assert_eq!(tcb.snd_cwnd, 10_000);
        assert!(tcb.flags.contains(TcbFlags::NODELAY));

        tcb.tune = Some(Tunables { initwnd: Some(2), ..Tunables::default() });
        tcb.negotiate_mss(&ctx, 1200);
        assert_eq!(tcb.maxseg, 1200);
        assert_eq!(tcb.snd_cwnd, 2400);
        assert!(tcb.flags.contains(TcbFlags::NODELAY));
    }
}
