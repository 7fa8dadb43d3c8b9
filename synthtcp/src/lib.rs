//! A user-space TCP engine for emulating large numbers of real TCP endpoints.
//!
//! ## Table of contents
//!
//! 1. [Design](#design)
//! 2. [The wire module](wire/index.html)
//! 3. [The tcp engine](tcp/index.html)
//!    1. [Input processing](tcp/index.html#input-processing)
//!    1. [Timers](tcp/index.html#timers)
//!    1. [Collaborators](tcp/io/index.html)
//! 4. [Reassembly storage](storage/index.html)
//! 5. [Simulation helpers](sim/index.html)
//!
//! ## Design
//!
//! The engine is the receive side of a BSD-derived TCP: a connection control block ([`Tcb`]) is
//! fed one inbound segment at a time and mutates its state, the attached socket buffers and
//! requests output. Traffic is synthetic so the socket buffers are usually byte counters and not
//! byte queues. Everything outside of the protocol itself, packet buffers, the NIC, flow tables,
//! the application, is reached through the narrow traits in [`tcp::io`].
//!
//! There is no global state. Every worker owns a [`tcp::Context`] holding its configuration,
//! counters, and clocks and passes it by reference into every call. Connections are owned by
//! exactly one worker and nothing in here blocks or synchronizes.
//!
//! Memory for out-of-order data is bounded per connection and released as soon as the queue
//! drains, so that idle connections do not hold any reassembly storage.
//!
//! [`Tcb`]: tcp/struct.Tcb.html
//! [`tcp::io`]: tcp/io/index.html
//! [`tcp::Context`]: tcp/struct.Context.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

// tests should be able to use `std`
#![cfg_attr(all(
    not(feature = "std"),
    not(test)),
no_std)]

extern crate alloc;

#[macro_use] mod macros;
pub mod sim;
pub mod storage;
pub mod tcp;
pub mod time;
pub mod wire;
