use alloc::sync::Arc;

use crate::wire::SeqNumber;
use super::config::{Config, Templates, TemplateId, Tunables};
use super::stats::Stats;
use super::timer::PR_SLOWHZ;

/// Increment of the initial send sequence generator.
///
/// Advanced by half of it for every new connection and spread over a second of slow ticks.
pub const ISS_INCR: u32 = 125 * 1024;

/// The state one worker shares between all of its connections.
///
/// There is exactly one per worker, passed by mutable reference into every call of the engine.
/// Nothing in here is shared with other workers except the read-only templates.
#[derive(Clone, Debug)]
pub struct Context {
    /// The process-wide defaults.
    pub config: Config,

    /// The per-template overrides.
    pub templates: Arc<Templates>,

    /// Counters of everything that happened on this worker.
    pub stats: Stats,

    /// The next initial send sequence number.
    pub iss: SeqNumber,

    /// The timestamp clock, in slow ticks.
    pub now: u32,
}

impl Context {
    /// Create a context without any template.
    pub fn new(config: Config) -> Self {
        Context::with_templates(config, Arc::new(Templates::default()))
    }

    /// Create a context sharing a template table.
    pub fn with_templates(config: Config, templates: Arc<Templates>) -> Self {
        Context {
            config,
            templates,
            stats: Stats::default(),
            iss: SeqNumber(1),
            now: 1,
        }
    }

    /// Choose a different start for initial sequence numbers.
    pub fn seed_iss(&mut self, seed: u32) {
        self.iss = SeqNumber(seed);
    }

    /// Lookup the overrides of a template.
    pub fn tunables(&self, template: Option<TemplateId>) -> Option<&Tunables> {
        template.and_then(|id| self.templates.get(id))
    }

    /// Take an initial send sequence number for a new connection.
    pub fn next_iss(&mut self) -> SeqNumber {
        let iss = self.iss;
        self.iss += ISS_INCR / 2;
        iss
    }

    /// Advance the clocks by one slow tick.
    ///
    /// Called once per worker and tick, in addition to the per-connection timeouts.
    pub fn slow_tick(&mut self) {
        self.iss += ISS_INCR / PR_SLOWHZ;
        self.now = self.now.wrapping_add(1);
    }
}
