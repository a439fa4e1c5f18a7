// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

use std::fmt;

use crate::types::{date_time::DateTime, status_code::StatusCode};

/// A value of one of the scalar types a monitored attribute or an event field can hold.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub enum Variant {
    /// Empty type has no value. It is equivalent to a Null value (part 6 5.1.6)
    #[default]
    Empty,
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    DateTime(Box<DateTime>),
    StatusCode(StatusCode),
}

macro_rules! from_scalar {
    ($t: ty, $v: ident) => {
        impl From<$t> for Variant {
            fn from(v: $t) -> Self {
                Variant::$v(v)
            }
        }
    };
}

from_scalar!(bool, Boolean);
from_scalar!(i32, Int32);
from_scalar!(u32, UInt32);
from_scalar!(i64, Int64);
from_scalar!(u64, UInt64);
from_scalar!(f64, Double);
from_scalar!(String, String);
from_scalar!(StatusCode, StatusCode);

impl<'a> From<&'a str> for Variant {
    fn from(v: &'a str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<DateTime> for Variant {
    fn from(v: DateTime) -> Self {
        Variant::DateTime(Box::new(v))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => write!(f, "Empty"),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::String(v) => write!(f, "{}", v),
            Variant::DateTime(v) => write!(f, "{}", v),
            Variant::StatusCode(v) => write!(f, "{}", v),
        }
    }
}

impl Variant {
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }
}
