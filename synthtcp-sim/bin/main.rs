//! A simulated transfer between two engine endpoints.
//!
//! Call example, losing one out of every ten segments towards the server:
//!
//! * `synthtcp-sim --bytes 1000000 --pulse 1/10`
pub use synthtcp_sim::config;

use synthtcp::tcp::Stats;

fn main() {
    let config = config::Config::from_args();

    println!("[+] Transferring {} bytes", config.bytes);
    let sim = synthtcp_sim::simulate(&config);
    let result = synthtcp_sim::Score::from(&sim);

    println!("[+] Done\n");
    println!("{}", result);

    println!("\n[+] Client");
    print_stats(sim.client.stats());
    println!("\n[+] Server");
    print_stats(sim.server.stats());

    if !result.finished() {
        std::process::exit(1);
    }
}

fn print_stats(stats: &Stats) {
    let counters = [
        ("segments sent", stats.sndtotal),
        ("data segments", stats.sndpack),
        ("data bytes", stats.sndbyte),
        ("retransmitted segments", stats.sndrexmitpack),
        ("fast retransmits", stats.sndrexmitfast),
        ("retransmit timeouts", stats.rexmttimeo),
        ("pure acks sent", stats.sndacks),
        ("delayed acks", stats.delack),
        ("segments received", stats.rcvtotal),
        ("in-order bytes received", stats.rcvbyte),
        ("duplicate segments", stats.rcvduppack),
        ("out-of-order segments", stats.rcvoopack),
        ("out-of-order drops", stats.rcvoopackdrop),
        ("duplicate acks", stats.rcvdupack),
        ("predicted acks", stats.predack),
        ("predicted data", stats.preddat),
        ("rtt updates", stats.rttupdated),
        ("reassembly queues", stats.reasalloc),
    ];

    for (name, value) in counters.iter() {
        println!("\t{:<24} {}", name, value);
    }
}
