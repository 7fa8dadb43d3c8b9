use std::fmt;
use std::str::FromStr;

use structopt::StructOpt;

use synthtcp::sim::{PrngLoss, Setup};
use synthtcp::tcp::{self, Tunables};
use synthtcp::time::{Duration, SLOW_TICK};

/// Lose `high` out of every `length` segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pulse {
    pub high: u32,
    pub length: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PulseError(String);

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "synthtcp-sim", about = "Transfer data between two emulated endpoints")]
pub struct Config {
    /// Octets sent from the client to the server.
    #[structopt(short = "n", long = "bytes", default_value = "1048576")]
    pub bytes: u64,

    /// The maximum segment size both endpoints offer.
    #[structopt(long = "mss")]
    pub mss: Option<u16>,

    /// Fraction of segments lost uniformly, on each link.
    #[structopt(long = "loss", default_value = "0")]
    pub loss: f64,

    /// Lose segments to the server in bursts, as `high/length`.
    #[structopt(long = "pulse")]
    pub pulse: Option<Pulse>,

    /// Seed of the loss decisions.
    #[structopt(long = "seed", default_value = "1")]
    pub seed: u64,

    /// One-way delay of the links, in milliseconds.
    #[structopt(long = "delay", default_value = "20")]
    pub delay: u64,

    /// Bound on the out-of-order blocks queued per connection.
    #[structopt(long = "reass-maxqlen")]
    pub reass_maxqlen: Option<u32>,

    /// Disable Nagle's algorithm.
    #[structopt(long = "no-delay")]
    pub no_delay: bool,

    /// Give up after this many slow ticks of simulated time.
    #[structopt(long = "ticks", default_value = "1200")]
    pub ticks: u32,
}

impl Config {
    pub fn from_args() -> Self {
        StructOpt::from_args()
    }

    /// The engine configuration of both endpoints.
    pub fn engine(&self) -> tcp::Config {
        let tune = Tunables {
            mss: self.mss,
            no_delay: Some(self.no_delay).filter(|&set| set),
            ..Tunables::default()
        };

        let mut config = tcp::Config::default();
        config.update(&tune);
        if let Some(maxqlen) = self.reass_maxqlen {
            config.reass_maxqlen = maxqlen;
        }
        config
    }

    pub fn setup(&self) -> Setup {
        let (to_server, to_client) = match self.pulse {
            Some(Pulse { high, length }) => (PrngLoss::pulsed(high, length), PrngLoss::none()),
            None => (
                PrngLoss::with_fraction(self.loss, self.seed),
                // Decorrelate the two directions.
                PrngLoss::with_fraction(self.loss, self.seed.wrapping_add(1)),
            ),
        };

        Setup {
            config: self.engine(),
            bytes: self.bytes,
            delay: Duration::from_millis(self.delay),
            loss_to_server: to_server,
            loss_to_client: to_client,
            ..Setup::default()
        }
    }

    /// The limit of simulated time.
    pub fn limit(&self) -> Duration {
        SLOW_TICK * self.ticks
    }
}

impl FromStr for Pulse {
    type Err = PulseError;

    fn from_str(pulse: &str) -> Result<Self, PulseError> {
        let mut parts = pulse.splitn(2, '/');
        let high = parts.next().and_then(|high| high.trim().parse().ok());
        let length = parts.next().and_then(|length| length.trim().parse().ok());
        match (high, length) {
            (Some(high), Some(length)) if high <= length && length > 0 => Ok(Pulse { high, length }),
            _ => Err(PulseError(pulse.to_string())),
        }
    }
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected a pulse as `high/length` with high <= length, got `{}`", self.0)
    }
}

impl std::error::Error for PulseError {}
