use core::fmt;

use synthtcp::sim::Simulation;
use synthtcp::time::Duration;

/// The result of running a simulated transfer.
pub struct Score {
    /// The amount of data the server application received.
    pub(crate) data_len: u64,
    /// Simulated duration from the first SYN until both ends closed.
    pub(crate) time: Duration,
    /// Number of segments that made it across either link.
    pub(crate) packet_count: u64,
    /// The number of segments that were sent on either link.
    pub(crate) total_count: u64,
    /// Segments the client sent again.
    pub(crate) retransmits: u64,
    /// Both connections closed before the time limit.
    pub(crate) finished: bool,
}

impl Score {
    fn total_kb(&self) -> u64 {
        self.data_len / 1024
    }

    fn effective_rate(&self) -> f32 {
        (self.data_len as f32) / self.elapsed_secs().max(0.001)
    }

    fn elapsed_secs(&self) -> f32 {
        self.time.as_millis() as f32 / 1000.0
    }

    fn loss_rate(&self) -> f32 {
        if self.total_count == 0 {
            return 0.0;
        }
        ((self.total_count.max(self.packet_count) - self.packet_count) as f32)
            / (self.total_count as f32)
    }

    /// Both connections closed before the time limit.
    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl<'a> From<&'a Simulation> for Score {
    fn from(sim: &'a Simulation) -> Score {
        let outcome = sim.outcome();
        Score {
            data_len: outcome.received,
            time: outcome.elapsed,
            packet_count: outcome.segments - outcome.lost,
            total_count: outcome.segments,
            retransmits: sim.client.stats().sndrexmitpack,
            finished: outcome.finished,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // In the style of iperf:
        //
        // ```text
        // [  3]  0.0- 1.0 sec   131 KBytes  1.05 Mbits/sec   0.000 ms    0/   91 (0%)
        // ```
        write!(
            f,
            "[{ts}] {begin}-{end} sec\t{total} KBytes\t{rate} Byte/sec\t\
            {lost}/{packets} ({loss_percent}%)\t{retransmits} retransmits",
            ts = 3,
            begin = 0.0,
            end = self.elapsed_secs(),
            total = self.total_kb(),
            rate = self.effective_rate(),
            lost = self.total_count - self.packet_count,
            packets = self.total_count,
            loss_percent = self.loss_rate() * 100.0,
            retransmits = self.retransmits,
        )?;

        if !self.finished {
            write!(f, "\t(unfinished)")?;
        }
        Ok(())
    }
}
