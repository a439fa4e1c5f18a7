// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Messages the subscription engine hands back to the transport. Publish requests are answered
//! either with a `PublishResponse` or, when they cannot be served, a `ServiceFault`.

use crate::types::{
    service_types::{PublishResponse, ResponseHeader, ServiceFault},
    status_code::StatusCode,
};

macro_rules! supported_messages {
    [ $( $x:ident, ) * ] => (supported_messages![ $( $x ),* ];);
    [ $( $x:ident ), * ] => {
        #[derive(Debug, PartialEq, Clone, Serialize)]
        pub enum SupportedMessage {
            $( $x(Box<$x>), )*
        }

        $(
        impl From<$x> for SupportedMessage {
            fn from(value: $x) -> Self {
                SupportedMessage::$x(Box::new(value))
            }
        }
        )*

        impl SupportedMessage {
            pub fn response_header(&self) -> &ResponseHeader {
                match self {
                    $( SupportedMessage::$x(value) => &value.response_header, )*
                }
            }
        }
    }
}

supported_messages![ServiceFault, PublishResponse,];

impl SupportedMessage {
    /// The handle of the request this message answers
    pub fn request_handle(&self) -> u32 {
        self.response_header().request_handle
    }

    pub fn service_result(&self) -> StatusCode {
        self.response_header().service_result
    }
}
