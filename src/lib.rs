// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The subscription engine of an OPC UA server.
//!
//! Clients create subscriptions holding monitored items. Sampled values and events become
//! notifications that are queued per item and per subscription, and are delivered in
//! sequence numbered notification messages in response to the client's publish requests.
//! Sent messages stay in a retransmission queue until the client acknowledges them.
//!
//! All time is expressed through ticks of a [`server::scheduler::Scheduler`], so the engine
//! can be driven deterministically by [`server::scheduler::TickScheduler`].

#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::float_cmp)]
#![allow(clippy::result_unit_err)]
#![allow(clippy::too_many_arguments)]

#[cfg(feature = "console-logging")]
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[cfg(test)]
extern crate tempdir;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate serde_derive;
#[cfg(test)]
extern crate serde_json;

#[cfg(feature = "console-logging")]
pub mod console_logging;
pub mod core;
pub mod server;
pub mod types;

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::server::prelude::*;
    pub use crate::types::*;
}
