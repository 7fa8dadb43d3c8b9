//! Simulation helpers.
//!
//! The engine only processes input, so a peer needs something that produces segments. The
//! [`SegmentOutput`] here is a compact version of the BSD output routine that encodes real headers
//! with zero filled payload. Two [`Host`]s joined by lossy [`Link`]s then make a complete,
//! deterministic transfer in simulated time, which is what the end-to-end tests and the
//! `synthtcp-sim` tool run.
//!
//! [`SegmentOutput`]: struct.SegmentOutput.html
//! [`Host`]: struct.Host.html
//! [`Link`]: struct.Link.html
mod host;
mod loss;
mod output;

pub use self::host::{
    Application,
    Host,
    Link,
    Outcome,
    Setup,
    Simulation};

pub use self::loss::{
    PrngLoss,
    Xoroshiro256};

pub use self::output::{
    Finished,
    SegmentOutput};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::{Socket, SoError, State, TcbFlags};
    use crate::time::Duration;
    use crate::wire::SeqNumber;

    const LIMIT: Duration = Duration::from_secs(600);

    #[test]
    fn lossless_transfer() {
        let mut sim = Simulation::new(Setup {
            bytes: 10_000,
            ..Setup::default()
        });
        let outcome = sim.run(LIMIT);

        assert!(outcome.finished);
        assert_eq!(outcome.received, 10_000);
        assert_eq!(outcome.client, Some(Finished::Closed));
        assert_eq!(outcome.server, Some(Finished::Closed));
        assert_eq!(outcome.lost, 0);
        assert_eq!(sim.client.socket.acknowledged, 10_000);

        let client = sim.client.stats();
        assert_eq!(client.connattempt, 1);
        assert_eq!(client.connects, 1);
        assert_eq!(client.rexmttimeo, 0);
        assert_eq!(client.sndrexmitpack, 0);
        assert_eq!(client.sndbyte, 10_000);

        let server = sim.server.stats();
        assert_eq!(server.accepts, 1);
        assert_eq!(server.connects, 1);
        assert_eq!(server.rcvbyte, 10_000);
        assert_eq!(server.rcvoopack, 0);
        assert_eq!(server.drops, 0);
    }

    #[test]
    fn handshake_negotiates() {
        let mut sim = Simulation::new(Setup::default());
        // SYN, SYN-ACK and ACK each take two steps of the link delay.
        for _ in 0..4 {
            sim.step();
        }
        assert_eq!(sim.client.tcb.state, State::Established);
        assert_eq!(sim.server.tcb.state, State::SynReceived);
        sim.step();
        sim.step();
        assert_eq!(sim.server.tcb.state, State::Established);

        assert_eq!(sim.client.tcb.irs, SeqNumber(900_000));
        assert_eq!(sim.server.tcb.irs, SeqNumber(1000));
        assert_eq!(sim.client.tcb.maxseg, 1460);
        assert_eq!(sim.server.tcb.maxseg, 1460);
        let negotiated = TcbFlags::RCVD_TSTMP | TcbFlags::RCVD_SCALE;
        assert!(sim.client.tcb.flags.contains(negotiated));
        assert!(sim.server.tcb.flags.contains(negotiated));
    }

    #[test]
    fn pulsed_loss_transfer() {
        let mut sim = Simulation::new(Setup {
            bytes: 200 * 1024,
            loss_to_server: PrngLoss::pulsed(1, 10),
            ..Setup::default()
        });

        let end = sim.now + LIMIT;
        while !sim.is_done() && sim.now < end {
            sim.step();
            // The client's FIN may only follow its last octet.
            if sim.server.socket.cant_rcv_more {
                assert_eq!(sim.server.socket.received, 200 * 1024);
                assert_eq!(sim.client.socket.send_pending(), 0);
            }
        }
        let outcome = sim.outcome();

        assert!(outcome.finished);
        assert_eq!(outcome.client, Some(Finished::Closed));
        assert_eq!(outcome.received, 200 * 1024);
        assert!(outcome.lost > 0);
        let client = sim.client.stats();
        assert!(client.sndrexmitpack > 0);
        // The gaps were filled out of order.
        assert!(sim.server.stats().rcvoopack > 0);
        assert_eq!(sim.server.tcb.reassembly_len(), 0);
    }

    #[test]
    fn uniform_loss_transfer() {
        let mut sim = Simulation::new(Setup {
            bytes: 64 * 1024,
            loss_to_server: PrngLoss::with_fraction(0.02, 1),
            loss_to_client: PrngLoss::with_fraction(0.02, 2),
            ..Setup::default()
        });
        let outcome = sim.run(LIMIT);
        assert!(outcome.finished);
        assert_eq!(outcome.received, 64 * 1024);
    }

    #[test]
    fn unanswered_syn_times_out() {
        let mut sim = Simulation::new(Setup {
            loss_to_server: PrngLoss::pulsed(1, 1),
            ..Setup::default()
        });
        let outcome = sim.run(LIMIT);
        assert_eq!(outcome.client, Some(Finished::Dropped(SoError::TimedOut)));
        assert_eq!(sim.client.socket.error, Some(SoError::TimedOut));
        assert_eq!(sim.server.tcb.state, State::Listen);
        assert_eq!(outcome.received, 0);
    }
}
