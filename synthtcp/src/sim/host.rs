//! Two endpoints connected by lossy links.
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::tcp::{ByteSocket, Config, Context, Output, Stats, Tcb};
use crate::time::{Duration, Instant, Ticker};
use crate::wire::TcpPacket;
use super::loss::PrngLoss;
use super::output::{Finished, SegmentOutput};

/// The application behavior of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Application {
    /// Octets still to be written.
    pub to_send: u64,
    /// Shut down once everything was written, without waiting for the peer.
    pub close_first: bool,
    /// The application shut down its side.
    pub shut: bool,
}

/// A connection with its socket, emitter and worker context.
#[derive(Clone, Debug)]
pub struct Host {
    /// The worker context, private to this host.
    pub ctx: Context,
    /// The single connection of the host.
    pub tcb: Tcb,
    /// The byte counting socket of the connection.
    pub socket: ByteSocket,
    /// The emitter of the connection.
    pub output: SegmentOutput,
    /// What the application does.
    pub app: Application,
}

/// A one-way link delaying and sometimes losing segments.
#[derive(Clone, Debug)]
pub struct Link {
    /// The one-way delay.
    pub delay: Duration,
    /// The loss decision of each segment.
    pub loss: PrngLoss,
    /// Number of segments delivered.
    pub delivered: u64,
    /// Number of segments lost.
    pub lost: u64,
    in_flight: VecDeque<(Instant, Vec<u8>)>,
}

/// The parameters of a simulated transfer.
#[derive(Clone, Copy, Debug)]
pub struct Setup {
    /// The configuration of both hosts.
    pub config: Config,
    /// Octets the client sends to the server.
    pub bytes: u64,
    /// The one-way delay of both links.
    pub delay: Duration,
    /// Loss of segments from client to server.
    pub loss_to_server: PrngLoss,
    /// Loss of segments from server to client.
    pub loss_to_client: PrngLoss,
    /// The granularity of the simulated clock.
    pub step: Duration,
}

/// A client transferring data to a server.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// The active opener and sender.
    pub client: Host,
    /// The passive opener and receiver.
    pub server: Host,
    /// Segments from the client.
    pub to_server: Link,
    /// Segments from the server.
    pub to_client: Link,
    /// The simulated time.
    pub now: Instant,
    step: Duration,
    ticker: Ticker,
}

/// The result of a simulated transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Both connections ended before the time limit.
    pub finished: bool,
    /// How the client connection ended.
    pub client: Option<Finished>,
    /// How the server connection ended.
    pub server: Option<Finished>,
    /// Octets the server application received.
    pub received: u64,
    /// The simulated time at the end.
    pub elapsed: Duration,
    /// Segments delivered or lost on both links.
    pub segments: u64,
    /// Segments lost on both links.
    pub lost: u64,
}

impl Application {
    /// Send some octets, then shut down.
    pub fn sender(bytes: u64) -> Self {
        Application { to_send: bytes, close_first: true, shut: false }
    }

    /// Receive everything and shut down after the peer did.
    pub fn receiver() -> Self {
        Application { to_send: 0, close_first: false, shut: false }
    }
}

impl Host {
    /// A host with one closed connection.
    pub fn new(config: Config, iss: u32, src_port: u16, dst_port: u16, app: Application) -> Self {
        let mut ctx = Context::new(config);
        ctx.seed_iss(iss);
        let tcb = Tcb::new(&ctx, None);
        Host {
            socket: ByteSocket::new(config.rx_buffer, config.tx_buffer),
            output: SegmentOutput::new(src_port, dst_port),
            tcb,
            ctx,
            app,
        }
    }

    /// Open the connection actively.
    pub fn connect(&mut self) {
        self.tcb.connect(&mut self.ctx, &mut self.socket, &mut self.output);
    }

    /// Process one received frame.
    ///
    /// Frames that are not valid segments are ignored.
    pub fn receive(&mut self, frame: &[u8]) {
        let packet = match TcpPacket::new_checked(frame) {
            Ok(packet) => packet,
            Err(err) => {
                net_debug!("sim: ignoring frame: {}", err);
                return;
            },
        };

        self.tcb.input(
            &mut self.ctx,
            &mut self.socket,
            &mut self.output,
            packet.segment(),
            packet.options(),
            packet.payload());
    }

    /// Let the application read and write.
    ///
    /// Like a blocking socket the application waits for the handshake to complete.
    pub fn poll_app(&mut self) {
        if !self.tcb.state.is_synchronized() {
            return;
        }

        let mut need_output = false;
        if self.socket.read_all() > 0 {
            // A window update may be due.
            need_output = true;
        }

        if self.app.to_send > 0 {
            let chunk = self.app.to_send.min(u64::from(u32::max_value())) as u32;
            let written = self.socket.write(chunk);
            self.app.to_send -= u64::from(written);
            need_output |= written > 0;
        }

        if need_output {
            self.output.emit(&mut self.ctx, &mut self.tcb, &mut self.socket);
        }

        let peer_done = self.socket.cant_rcv_more;
        if !self.app.shut && self.app.to_send == 0 && (self.app.close_first || peer_done) {
            self.app.shut = true;
            if self.app.close_first {
                self.tcb.shutdown(&mut self.ctx, &mut self.socket, &mut self.output);
            } else {
                // Everything was read, the receiver is done with its handle.
                self.socket.close_app();
                self.tcb.disconnect(&mut self.ctx, &mut self.socket, &mut self.output);
            }
        }
    }

    /// Process elapsed timer ticks.
    pub fn tick(&mut self, slow: u32, fast: u32) {
        for _ in 0..fast {
            if self.tcb.is_open() {
                self.tcb.fast_timeout(&mut self.ctx, &mut self.socket, &mut self.output);
            }
        }
        for _ in 0..slow {
            self.ctx.slow_tick();
            if self.tcb.is_open() {
                self.tcb.slow_timeout(&mut self.ctx, &mut self.socket, &mut self.output);
            }
        }
    }

    /// The counters of the host's worker.
    pub fn stats(&self) -> &Stats {
        &self.ctx.stats
    }
}

impl Link {
    /// A link with some delay and loss.
    pub fn new(delay: Duration, loss: PrngLoss) -> Self {
        Link {
            delay,
            loss,
            delivered: 0,
            lost: 0,
            in_flight: VecDeque::new(),
        }
    }

    /// Put a frame onto the link, unless it is lost.
    pub fn send(&mut self, now: Instant, frame: Vec<u8>) {
        if self.loss.lose() {
            net_trace!("sim: lost frame of {} bytes", frame.len());
            self.lost += 1;
            return;
        }
        self.in_flight.push_back((now + self.delay, frame));
    }

    /// Take the next frame that arrived until `now`.
    pub fn receive(&mut self, now: Instant) -> Option<Vec<u8>> {
        match self.in_flight.front() {
            Some((arrival, _)) if *arrival <= now => (),
            _ => return None,
        }
        self.delivered += 1;
        self.in_flight.pop_front().map(|(_, frame)| frame)
    }

    /// If no frame is in flight.
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

impl Default for Setup {
    fn default() -> Self {
        Setup {
            config: Config::default(),
            bytes: 100 * 1024,
            delay: Duration::from_millis(20),
            loss_to_server: PrngLoss::none(),
            loss_to_client: PrngLoss::none(),
            step: Duration::from_millis(10),
        }
    }
}

impl Simulation {
    /// Prepare a transfer, the server is listening and the client sent its SYN.
    pub fn new(setup: Setup) -> Self {
        let mut client = Host::new(setup.config, 1000, 40000, 5001, Application::sender(setup.bytes));
        let mut server = Host::new(setup.config, 900_000, 5001, 40000, Application::receiver());
        server.tcb.listen();
        client.connect();

        let now = Instant::from_millis(0);
        let mut sim = Simulation {
            client,
            server,
            to_server: Link::new(setup.delay, setup.loss_to_server),
            to_client: Link::new(setup.delay, setup.loss_to_client),
            now,
            step: setup.step,
            ticker: Ticker::new(now),
        };
        sim.transmit();
        sim
    }

    /// Advance the simulated time by one step.
    pub fn step(&mut self) {
        self.now += self.step;

        while let Some(frame) = self.to_server.receive(self.now) {
            self.server.receive(&frame);
        }
        while let Some(frame) = self.to_client.receive(self.now) {
            self.client.receive(&frame);
        }

        let ticks = self.ticker.advance(self.now);
        self.client.tick(ticks.slow, ticks.fast);
        self.server.tick(ticks.slow, ticks.fast);

        self.client.poll_app();
        self.server.poll_app();

        self.transmit();
    }

    /// If both connections ended.
    pub fn is_done(&self) -> bool {
        !self.client.tcb.is_open() && !self.server.tcb.is_open()
    }

    /// Step until both connections ended or the time limit passed.
    pub fn run(&mut self, limit: Duration) -> Outcome {
        let end = self.now + limit;
        while !self.is_done() && self.now < end {
            self.step();
        }
        self.outcome()
    }

    /// Summarize the transfer so far.
    pub fn outcome(&self) -> Outcome {
        let lost = self.to_server.lost + self.to_client.lost;
        Outcome {
            finished: self.is_done(),
            client: self.client.output.finished,
            server: self.server.output.finished,
            received: self.server.socket.received,
            elapsed: self.now - Instant::from_millis(0),
            segments: self.to_server.delivered + self.to_client.delivered + lost,
            lost,
        }
    }

    fn transmit(&mut self) {
        while let Some(frame) = self.client.output.pop_frame() {
            self.to_server.send(self.now, frame);
        }
        while let Some(frame) = self.server.output.pop_frame() {
            self.to_client.send(self.now, frame);
        }
    }
}
