//! Out-of-order data of a connection.
//!
//! The queue itself is a [`Reassembly`]; this adds the connection side: the queue is allocated on
//! the first segment that can not be delivered in order, accounted in the statistics and released
//! as soon as it drains.
//!
//! [`Reassembly`]: ../../storage/struct.Reassembly.html
use crate::storage::{Block, Reassembly};
use crate::wire::SeqNumber;
use super::context::Context;
use super::io::Socket;
use super::state::State;
use super::tcb::Tcb;

impl Tcb {
    /// Queue a segment that can not take the in-order fast path, then deliver whatever became
    /// contiguous.
    ///
    /// Returns whether a FIN is now visible to the state machine.
    pub fn reassemble(
        &mut self,
        ctx: &mut Context,
        socket: &mut dyn Socket,
        seq: SeqNumber,
        len: u32,
        fin: bool,
    ) -> bool {
        if self.reass_disabled {
            ctx.stats.rcvoopackdrop += 1;
            ctx.stats.rcvoobytesdrop += u64::from(len);
            return false;
        }

        if self.reass.is_none() {
            // A bare FIN at the edge needs no queue.
            if fin && len == 0 && seq == self.rcv_nxt && self.state > State::Established {
                ctx.stats.rcvpack += 1;
                return true;
            }
            self.alloc_reassembly(ctx, socket);
        }

        ctx.stats.rcvoopack += 1;
        ctx.stats.rcvoobyte += u64::from(len);

        if let Some(queue) = self.reass.as_mut() {
            let insertion = queue.insert(Block { seq, len, fin });
            let stats = &mut ctx.stats;
            stats.rcvduppack += u64::from(insertion.dup_packs);
            stats.rcvdupbyte += u64::from(insertion.dup_bytes);
            stats.rcvpartduppack += u64::from(insertion.part_dup_packs);
            stats.rcvpartdupbyte += u64::from(insertion.part_dup_bytes);
            if let Some(dropped) = insertion.dropped {
                stats.rcvoopackdrop += 1;
                stats.rcvoobytesdrop += u64::from(dropped.len);
            }
        }

        self.deliver_queued(ctx, socket)
    }

    /// Deliver the lowest queued block if it starts at `rcv_nxt`.
    ///
    /// Returns whether the delivered block ended in a FIN. Releases the queue when it drained.
    pub fn deliver_queued(&mut self, ctx: &mut Context, socket: &mut dyn Socket) -> bool {
        if !self.state.have_rcvd_syn() {
            return false;
        }

        let rcv_nxt = self.rcv_nxt;
        let block = match self.reass.as_mut().and_then(|queue| queue.pop_ready(rcv_nxt)) {
            Some(block) => block,
            None => return false,
        };

        self.rcv_nxt += block.len;
        ctx.stats.rcvpack += 1;
        ctx.stats.rcvbyte += u64::from(block.len);
        if !socket.cant_receive_more() {
            socket.append_bytes(block.len);
        }
        socket.wake_readers();

        if self.reass.as_ref().map_or(false, Reassembly::is_empty) {
            self.release_reassembly(ctx);
        }

        block.fin
    }

    /// Free the queue, accounting how many blocks it needed at most.
    pub fn release_reassembly(&mut self, ctx: &mut Context) {
        if let Some(queue) = self.reass.take() {
            ctx.stats.reassembly_released(queue.max_used());
        }
    }

    /// The number of queued out-of-order blocks.
    pub fn reassembly_len(&self) -> usize {
        self.reass.as_ref().map_or(0, Reassembly::len)
    }

    /// The queued out-of-order blocks.
    pub fn reassembly(&self) -> Option<&Reassembly> {
        self.reass.as_ref()
    }

    fn alloc_reassembly(&mut self, ctx: &mut Context, socket: &dyn Socket) {
        ctx.stats.reasalloc += 1;
        let mut limit = self.reass_maxqlen;
        if self.maxseg != 0 {
            limit = limit.min(socket.receive_capacity() / self.maxseg + 1);
        }
        self.reass = Some(Reassembly::new(limit as usize));
    }

    /// Decide whether an in-order segment may be acknowledged later.
    pub(crate) fn delay_ack(&mut self, psh: bool, len: u32) -> bool {
        !psh && len <= self.maxseg && !self.check_no_delay(len)
    }

    /// Count received octets towards the delayed acknowledgment limit.
    ///
    /// Returns `true` when the limit was reached and the acknowledgment should be sent now.
    pub(crate) fn check_no_delay(&mut self, len: u32) -> bool {
        if self.delay_limit == 0 {
            return false;
        }

        let count = self.pkts_cnt.saturating_add(len);
        if count >= self.delay_limit {
            self.pkts_cnt = count - self.delay_limit;
            if self.pkts_cnt >= self.delay_limit {
                self.pkts_cnt = 0;
            }
            true
        } else {
            self.pkts_cnt = count;
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tcp::config::Config;
    use crate::tcp::io::ByteSocket;

    fn established() -> (Context, Tcb, ByteSocket) {
        let ctx = Context::new(Config::default());
        let mut tcb = Tcb::new(&ctx, None);
        tcb.state = State::Established;
        tcb.rcv_nxt = SeqNumber(500);
        (ctx, tcb, ByteSocket::new(32 * 1024, 32 * 1024))
    }

    #[test]
    fn out_of_order_counters() {
        let (mut ctx, mut tcb, mut socket) = established();
        assert!(!tcb.reassemble(&mut ctx, &mut socket, SeqNumber(1000), 20, false));
        assert!(!tcb.reassemble(&mut ctx, &mut socket, SeqNumber(2000), 20, false));
        assert_eq!(tcb.reassembly_len(), 2);
        assert_eq!(ctx.stats.rcvoopack, 2);
        assert_eq!(ctx.stats.rcvoobyte, 40);
        assert_eq!(ctx.stats.rcvduppack, 0);
        assert_eq!(ctx.stats.reasalloc, 1);
        // 32KiB / 1460 + 1
        assert_eq!(tcb.reassembly().map(Reassembly::limit), Some(23));
    }

    #[test]
    fn duplicate_counters() {
        let (mut ctx, mut tcb, mut socket) = established();
        tcb.reassemble(&mut ctx, &mut socket, SeqNumber(1000), 20, false);
        tcb.reassemble(&mut ctx, &mut socket, SeqNumber(1000), 20, false);
        assert_eq!(tcb.reassembly_len(), 1);
        assert_eq!(ctx.stats.rcvduppack, 1);
        assert_eq!(ctx.stats.rcvdupbyte, 20);

        tcb.reassemble(&mut ctx, &mut socket, SeqNumber(1001), 20, false);
        assert_eq!(ctx.stats.rcvpartduppack, 1);
        assert_eq!(ctx.stats.rcvpartdupbyte, 1);
    }

    #[test]
    fn overflow_counters() {
        let (mut ctx, mut tcb, mut socket) = established();
        tcb.reass_maxqlen = 4;
        for &seq in [1000, 2000, 3000, 4000, 5000].iter() {
            tcb.reassemble(&mut ctx, &mut socket, SeqNumber(seq), 20, false);
        }
        assert_eq!(tcb.reassembly_len(), 4);
        assert_eq!(ctx.stats.rcvoopackdrop, 1);
        assert_eq!(ctx.stats.rcvoobytesdrop, 20);
    }

    #[test]
    fn fills_hole_and_releases() {
        let (mut ctx, mut tcb, mut socket) = established();
        tcb.reassemble(&mut ctx, &mut socket, SeqNumber(520), 30, true);
        assert_eq!(tcb.rcv_nxt, SeqNumber(500));
        assert!(tcb.reassemble(&mut ctx, &mut socket, SeqNumber(500), 20, false));
        assert_eq!(tcb.rcv_nxt, SeqNumber(550));
        assert_eq!(socket.received, 50);
        assert_eq!(tcb.reassembly_len(), 0);
        assert!(tcb.reassembly().is_none());
        assert_eq!(ctx.stats.reasfree, 1);
        assert_eq!(ctx.stats.reas_hist_4, 1);
        assert_eq!(ctx.stats.rcvpack, 1);
        assert_eq!(ctx.stats.rcvbyte, 50);
        // Once drained nothing more is delivered.
        assert!(!tcb.deliver_queued(&mut ctx, &mut socket));
        assert_eq!(tcb.rcv_nxt, SeqNumber(550));
    }

    #[test]
    fn nothing_before_syn() {
        let (mut ctx, mut tcb, mut socket) = established();
        tcb.state = State::SynSent;
        tcb.reassemble(&mut ctx, &mut socket, SeqNumber(500), 20, false);
        assert_eq!(tcb.rcv_nxt, SeqNumber(500));
        assert_eq!(tcb.reassembly_len(), 1);
    }

    #[test]
    fn bare_fin_without_queue() {
        let (mut ctx, mut tcb, mut socket) = established();
        tcb.state = State::FinWait1;
        assert!(tcb.reassemble(&mut ctx, &mut socket, SeqNumber(500), 0, true));
        assert_eq!(ctx.stats.reasalloc, 0);
        assert_eq!(ctx.stats.rcvpack, 1);
    }

    #[test]
    fn disabled() {
        let (mut ctx, mut tcb, mut socket) = established();
        tcb.reass_disabled = true;
        assert!(!tcb.reassemble(&mut ctx, &mut socket, SeqNumber(1000), 20, true));
        assert_eq!(tcb.reassembly_len(), 0);
        assert_eq!(ctx.stats.rcvoopackdrop, 1);
        assert_eq!(ctx.stats.rcvoobytesdrop, 20);
    }

    #[test]
    fn no_delay_counter() {
        let (_, mut tcb, _) = established();
        assert!(!tcb.check_no_delay(1000));

        tcb.delay_limit = 2000;
        assert!(!tcb.check_no_delay(1000));
        assert!(tcb.check_no_delay(1460));
        assert_eq!(tcb.pkts_cnt, 460);
        assert!(tcb.check_no_delay(5000));
        assert_eq!(tcb.pkts_cnt, 0);

        assert!(tcb.delay_ack(false, 100));
        assert!(!tcb.delay_ack(true, 100));
        assert!(!tcb.delay_ack(false, 1461));
    }
}
