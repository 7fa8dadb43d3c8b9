//! The TCP engine.
//!
//! A connection is a [`Tcb`], the control block, and nothing else. It does not own its buffers,
//! it does not know how its segments are encoded and it has no timers of its own that could fire
//! asynchronously. All of that is provided by the caller on each call: the per-worker
//! [`Context`], the application side of the connection as a [`Socket`] and the transmitting side
//! as an [`Output`]. This keeps a control block small enough to have hundreds of thousands of them
//! on a single worker.
//!
//! [`Tcb`]: struct.Tcb.html
//! [`Context`]: struct.Context.html
//! [`Socket`]: io/trait.Socket.html
//! [`Output`]: io/trait.Output.html
//!
//! ## Input processing
//!
//! Every inbound segment is handed to [`Tcb::input`] together with its raw option octets and its
//! payload. Processing follows the 4.4BSD receive path closely, as the emulated endpoints are
//! supposed to be indistinguishable from real hosts:
//!
//! * Header prediction short-cuts the two common cases of a one-way transfer, a pure
//!   acknowledgment of new data and a pure in-order data segment.
//! * A listening connection accepts a SYN by itself, there is no separate listen socket. The
//!   `SynSent` state completes an active open.
//! * The acceptability tests: timestamps protect against wrapped sequence numbers, the segment is
//!   trimmed to the receive window, resets and stray SYNs end the connection.
//! * Acknowledgments are processed, feeding the round trip estimator and the Reno congestion
//!   control, and drive the closing states.
//! * Finally the send window is updated, data is delivered in order or queued for reassembly and
//!   a FIN is processed.
//!
//! A segment is never rejected with an error. It either completes or ends in one of the classic
//! exit labels: it is dropped silently, dropped but acknowledged, or answered with a reset. Each of
//! them is counted in [`Stats`] and traced when the `log` feature is enabled.
//!
//! [`Tcb::input`]: struct.Tcb.html#method.input
//! [`Stats`]: struct.Stats.html
//!
//! ## Timers
//!
//! There are four soft timers per connection (retransmit, persist, keepalive and 2MSL) that count
//! slow ticks of 500ms, plus a delayed acknowledgment flag that is checked on fast ticks of 200ms.
//! The worker drives them by calling [`Tcb::slow_timeout`] and [`Tcb::fast_timeout`] for each of
//! its connections and [`Context::slow_tick`] once, for example with a [`Ticker`]. Expiry is
//! handled synchronously within these calls.
//!
//! [`Tcb::slow_timeout`]: struct.Tcb.html#method.slow_timeout
//! [`Tcb::fast_timeout`]: struct.Tcb.html#method.fast_timeout
//! [`Context::slow_tick`]: struct.Context.html#method.slow_tick
//! [`Ticker`]: ../time/struct.Ticker.html
//!
//! ## Deviations
//!
//! Selective acknowledgments and explicit congestion notification are not supported and never
//! negotiated. Urgent data is tracked through `rcv_up` only, it is not delivered out of band.
mod congestion;
pub mod config;
mod context;
mod input;
pub mod io;
mod options;
mod reass;
mod state;
mod stats;
mod tcb;
pub mod timer;


pub use config::{
    Config,
    Templates,
    TemplateId,
    Tunables};

pub use context::{
    Context,
    ISS_INCR};

pub use io::{
    ByteSocket,
    Output,
    SockBuf,
    Socket,
    SoError};

pub use options::{
    initial_window,
    Timestamp};

pub use state::State;

pub use stats::Stats;

pub use tcb::{
    Tcb,
    TcbFlags,
    TCP_MAXWIN,
    TCP_MAX_WINSHIFT,
    TCP_MIN_MSS};

pub use timer::{
    Timer,
    Timers};
