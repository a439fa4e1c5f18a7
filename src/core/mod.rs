// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Functionality shared by the rest of the crate: handle factories, configuration persistence
//! and the messages handed back to the transport.

/// Unwraps a `SupportedMessage` into the message it holds, panicking on any other kind. Meant
/// for tests and code that already checked the variant.
#[macro_export]
macro_rules! supported_message_as {
    ($v: expr, $i: ident) => {
        if let $crate::core::supported_message::SupportedMessage::$i(value) = $v {
            *value
        } else {
            panic!("Cannot convert to {:?}", stringify!($i));
        }
    };
}

pub mod config;
pub mod handle;
pub mod supported_message;

pub mod prelude {
    pub use super::{config::Config, handle::Handle, supported_message::*};
    pub use crate::types::{status_code::StatusCode, *};
}
