/// Counters of a worker's TCP engine.
///
/// Named after the classic `tcps_*` statistics. The engine only ever increments them, exporting
/// and summing them over workers is left to the user.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    // Connection lifecycle.
    pub connattempt: u64,
    pub accepts: u64,
    pub connects: u64,
    pub drops: u64,
    pub conndrops: u64,
    pub closed: u64,

    // Timers.
    pub segstimed: u64,
    pub rttupdated: u64,
    pub delack: u64,
    pub timeoutdrop: u64,
    pub rexmttimeo: u64,
    pub rexmttimeo_syn: u64,
    pub persisttimeo: u64,
    pub keeptimeo: u64,
    pub keepprobe: u64,
    pub keepdrops: u64,

    // Output.
    pub sndtotal: u64,
    pub sndpack: u64,
    pub sndbyte: u64,
    pub sndrexmitpack: u64,
    pub sndrexmitbyte: u64,
    pub sndrexmitfast: u64,
    pub sndacks: u64,
    pub sndprobe: u64,
    pub sndwinup: u64,
    pub sndctrl: u64,

    // Input.
    pub rcvtotal: u64,
    pub rcvpack: u64,
    pub rcvbyte: u64,
    pub rcvduppack: u64,
    pub rcvdupbyte: u64,
    pub rcvpartduppack: u64,
    pub rcvpartdupbyte: u64,
    pub rcvoopack: u64,
    pub rcvoobyte: u64,
    pub rcvoopackdrop: u64,
    pub rcvoobytesdrop: u64,
    pub rcvpackafterwin: u64,
    pub rcvbyteafterwin: u64,
    pub rcvafterclose: u64,
    pub rcvwinprobe: u64,
    pub rcvdupack: u64,
    pub rcvacktoomuch: u64,
    pub rcvackpack: u64,
    pub rcvackbyte: u64,
    pub rcvwinupd: u64,
    pub pawsdrop: u64,
    pub predack: u64,
    pub preddat: u64,

    // Reassembly queue lifetime.
    pub reasalloc: u64,
    pub reasfree: u64,
    pub reas_hist_4: u64,
    pub reas_hist_16: u64,
    pub reas_hist_100: u64,
    pub reas_hist_other: u64,
}

impl Stats {
    /// Account the largest number of blocks a released reassembly queue held.
    pub fn reassembly_released(&mut self, max_used: usize) {
        self.reasfree += 1;
        match max_used {
            0..=4 => self.reas_hist_4 += 1,
            5..=16 => self.reas_hist_16 += 1,
            17..=100 => self.reas_hist_100 += 1,
            _ => self.reas_hist_other += 1,
        }
    }
}
