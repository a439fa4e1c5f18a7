// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The OPC UA data types used by the subscription engine. Only the decoded form of each
//! message is modelled, wire encoding belongs to the transport.

pub mod data_value;
pub mod date_time;
pub mod node_id;
pub mod notification_message;
pub mod service_types;
pub mod status_code;
#[rustfmt::skip]
pub mod status_codes;
pub mod variant;

pub use self::{
    data_value::*, date_time::*, node_id::*, service_types::*, status_code::StatusCode,
    variant::*,
};
