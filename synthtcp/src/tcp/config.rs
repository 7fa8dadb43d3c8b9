//! Process-wide defaults and per-template overrides.
//!
//! The generator runs many connections from a small number of traffic templates. Each template
//! may override some of the process-wide [`Config`] with its [`Tunables`], where any field that
//! is `None` keeps the default. Templates are resolved exactly once, when a connection control
//! block is created, and never consulted per packet.
//!
//! [`Config`]: struct.Config.html
//! [`Tunables`]: struct.Tunables.html
use alloc::vec::Vec;

/// The default, process-wide configuration of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    /// The maximum segment size used when no smaller one is offered.
    pub mss: u16,

    /// Initial congestion window in segments.
    pub initwnd: u32,

    /// Number of duplicate acknowledgments that trigger a fast retransmit.
    pub rexmt_thresh: u32,

    /// Request window scaling and timestamps (RFC 1323).
    pub rfc1323: bool,

    /// Disable the Nagle algorithm.
    pub no_delay: bool,

    /// Acknowledge immediately after receiving this many octets in order, `0` to disable.
    pub no_delay_counter: u32,

    /// Size of the receive buffer in octets.
    pub rx_buffer: u32,

    /// Size of the send buffer in octets.
    pub tx_buffer: u32,

    /// Time in seconds to wait for a connection to establish.
    pub keepinit: u32,

    /// Idle time in seconds before the first keepalive probe.
    pub keepidle: u32,

    /// Time in seconds between two keepalive probes.
    pub keepintvl: u32,

    /// Number of unanswered keepalive probes before dropping.
    pub keepcnt: u32,

    /// Send keepalive probes on idle connections.
    pub keepalive: bool,

    /// Upper bound on the number of out-of-order blocks per connection.
    pub reass_maxqlen: u32,

    /// Drop all out-of-order data instead of queueing it.
    pub reass_disabled: bool,
}

/// Overrides of the defaults for the connections of one template.
///
/// Every field that is `Some` replaces the corresponding field of `Config`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tunables {
    /// Overrides `Config::mss`.
    pub mss: Option<u16>,
    /// Overrides `Config::initwnd`.
    pub initwnd: Option<u32>,
    /// Overrides `Config::no_delay`.
    pub no_delay: Option<bool>,
    /// Overrides `Config::no_delay_counter`.
    pub no_delay_counter: Option<u32>,
    /// Overrides `Config::rexmt_thresh`.
    pub rexmt_thresh: Option<u32>,
    /// Overrides `Config::rfc1323`.
    pub rfc1323: Option<bool>,
    /// Overrides `Config::keepinit`.
    pub keepinit: Option<u32>,
    /// Overrides `Config::keepidle`.
    pub keepidle: Option<u32>,
    /// Overrides `Config::keepintvl`.
    pub keepintvl: Option<u32>,
    /// Overrides `Config::rx_buffer`.
    pub rx_buffer: Option<u32>,
    /// Overrides `Config::tx_buffer`.
    pub tx_buffer: Option<u32>,
}

/// Identifies the template of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(pub u16);

/// The immutable table of all template overrides.
///
/// Built once at startup and then shared between all workers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Templates {
    entries: Vec<Tunables>,
}

impl Config {
    /// Apply all overrides of a profile.
    pub fn update(&mut self, tune: &Tunables) {
        if let Some(mss) = tune.mss {
            self.mss = mss;
        }
        if let Some(initwnd) = tune.initwnd {
            self.initwnd = initwnd;
        }
        if let Some(no_delay) = tune.no_delay {
            self.no_delay = no_delay;
        }
        if let Some(counter) = tune.no_delay_counter {
            self.no_delay_counter = counter;
        }
        if let Some(thresh) = tune.rexmt_thresh {
            self.rexmt_thresh = thresh;
        }
        if let Some(rfc1323) = tune.rfc1323 {
            self.rfc1323 = rfc1323;
        }
        if let Some(keepinit) = tune.keepinit {
            self.keepinit = keepinit;
        }
        if let Some(keepidle) = tune.keepidle {
            self.keepidle = keepidle;
        }
        if let Some(keepintvl) = tune.keepintvl {
            self.keepintvl = keepintvl;
        }
        if let Some(rx_buffer) = tune.rx_buffer {
            self.rx_buffer = rx_buffer;
        }
        if let Some(tx_buffer) = tune.tx_buffer {
            self.tx_buffer = tx_buffer;
        }
    }

    /// The configuration with all overrides of a profile applied.
    pub fn with(&self, tune: Option<&Tunables>) -> Config {
        let mut config = *self;
        if let Some(tune) = tune {
            config.update(tune);
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mss: 1460,
            initwnd: 10,
            rexmt_thresh: 3,
            rfc1323: true,
            no_delay: false,
            no_delay_counter: 0,
            rx_buffer: 32 * 1024,
            tx_buffer: 32 * 1024,
            keepinit: 75,
            keepidle: 7200,
            keepintvl: 75,
            keepcnt: 8,
            keepalive: false,
            reass_maxqlen: 31,
            reass_disabled: false,
        }
    }
}

impl Templates {
    /// Create a table from the overrides of each template, in order of their ids.
    pub fn new(entries: Vec<Tunables>) -> Self {
        Templates { entries }
    }

    /// Lookup the overrides of a template.
    pub fn get(&self, id: TemplateId) -> Option<&Tunables> {
        self.entries.get(usize::from(id.0))
    }

    /// The number of templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// If the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absent_fields_keep_defaults() {
        let tune = Tunables {
            mss: Some(536),
            no_delay: Some(true),
            ..Tunables::default()
        };

        let config = Config::default().with(Some(&tune));
        assert_eq!(config.mss, 536);
        assert!(config.no_delay);
        assert_eq!(config.initwnd, 10);
        assert_eq!(config.rx_buffer, 32 * 1024);
        assert_eq!(Config::default().with(None), Config::default());
    }

    #[test]
    fn lookup() {
        let templates = Templates::new(vec![
            Tunables::default(),
            Tunables { initwnd: Some(2), ..Tunables::default() },
        ]);
        assert_eq!(templates.len(), 2);
        assert_eq!(templates.get(TemplateId(1)).and_then(|t| t.initwnd), Some(2));
        assert_eq!(templates.get(TemplateId(7)), None);
    }
}
