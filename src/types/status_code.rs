// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the hand implemented part of the StatusCode type. The other file, `status_codes.rs`
//! contains the table of codes.

use std::{error::Error, fmt, fmt::Formatter};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

pub use crate::types::status_codes::StatusCode;

// bitflags! derives Debug, which prints a combination of flags. Display prints the name.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let bits = self.bitflags();
        if bits.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}+{:?}", self.name(), bits)
        }
    }
}

impl Error for StatusCode {}

impl StatusCode {
    /// Returns the bit flags of the status code, i.e. it masks out the actual status code value
    pub fn bitflags(&self) -> StatusCode {
        *self & StatusCode::BIT_MASK
    }

    /// Returns the status only, i.e. it masks out any bit flags that come with the status code
    pub fn status(&self) -> StatusCode {
        *self & StatusCode::STATUS_MASK
    }

    /// Tests if the status code is bad
    pub fn is_bad(&self) -> bool {
        self.contains(StatusCode::IS_ERROR)
    }

    /// Tests if the status code is uncertain
    pub fn is_uncertain(&self) -> bool {
        self.contains(StatusCode::IS_UNCERTAIN)
    }

    /// Tests if the status code is good (i.e. not bad or uncertain)
    pub fn is_good(&self) -> bool {
        !self.is_bad() && !self.is_uncertain()
    }

    /// Sets or clears the overflow bit. Setting it also marks the info bits as belonging to a
    /// data value, which is the only place the overflow bit has a meaning.
    pub fn set_overflow(self, overflow: bool) -> StatusCode {
        if overflow {
            self | StatusCode::INFO_TYPE_DATA_VALUE | StatusCode::OVERFLOW
        } else {
            self - StatusCode::OVERFLOW
        }
    }

    pub fn overflow(&self) -> bool {
        self.contains(StatusCode::INFO_TYPE_DATA_VALUE | StatusCode::OVERFLOW)
    }
}

// Serialize / Deserialize are manually implemented because bitflags! doesn't do it.

impl Serialize for StatusCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

struct StatusCodeVisitor;

impl<'de> Visitor<'de> for StatusCodeVisitor {
    type Value = u32;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an unsigned 32-bit integer")
    }

    fn visit_u32<E>(self, value: u32) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u32::try_from(value).map_err(|_| E::custom(format!("status code {} is out of range", value)))
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(StatusCode::from_bits_truncate(
            deserializer.deserialize_u32(StatusCodeVisitor)?,
        ))
    }
}

#[test]
fn status_code() {
    assert!(StatusCode::Good.is_good());
    assert!(!StatusCode::Good.is_bad());
    assert!(!StatusCode::Good.is_uncertain());

    assert!(StatusCode::UncertainLastUsableValue.is_uncertain());
    assert!(!StatusCode::UncertainLastUsableValue.is_bad());
    assert!(!StatusCode::UncertainLastUsableValue.is_good());

    assert!(StatusCode::BadSequenceNumberUnknown.is_bad());
    assert!(!StatusCode::BadSequenceNumberUnknown.is_uncertain());
    assert!(!StatusCode::BadSequenceNumberUnknown.is_good());
}

#[test]
fn status_code_overflow() {
    let status = StatusCode::Good.set_overflow(true);
    assert!(status.overflow());
    assert!(status.is_good());
    assert_eq!(status.status(), StatusCode::Good);
    assert_eq!(
        status.bitflags(),
        StatusCode::INFO_TYPE_DATA_VALUE | StatusCode::OVERFLOW
    );
    assert_eq!(status.to_string(), format!("Good+{:?}", status.bitflags()));
    assert!(!status.set_overflow(false).overflow());
    assert_eq!(StatusCode::BadTimeout.to_string(), "BadTimeout");
}
