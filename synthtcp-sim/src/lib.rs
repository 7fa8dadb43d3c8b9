//! Scores the engine on a simulated link.
//!
//! A client transfers a configurable amount of data to a server over two lossy one-way links,
//! both endpoints running the synthtcp engine. The transfer runs in simulated time so results are
//! exactly reproducible for a given seed.
mod score;

pub mod config;
pub use score::Score;

use synthtcp::sim::Simulation;

/// Run the transfer described by the command line until it ends or times out.
pub fn simulate(config: &config::Config) -> Simulation {
    let mut sim = Simulation::new(config.setup());
    sim.run(config.limit());
    sim
}
