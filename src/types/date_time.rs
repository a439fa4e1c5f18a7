// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `DateTime`.

use std::{
    fmt,
    ops::{Add, Sub},
};

use chrono::{Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type DateTimeUtc = chrono::DateTime<Utc>;

/// A UTC timestamp, used for source / server timestamps of values and for the publish time of
/// notification messages.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash, Default)]
pub struct DateTime {
    date_time: DateTimeUtc,
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.date_time.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        DateTimeUtc::deserialize(deserializer).map(DateTime::from)
    }
}

impl Add<Duration> for DateTime {
    type Output = Self;

    fn add(self, duration: Duration) -> Self {
        DateTime::from(self.date_time + duration)
    }
}

impl Sub<DateTime> for DateTime {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.date_time - other.date_time
    }
}

impl From<DateTimeUtc> for DateTime {
    fn from(date_time: DateTimeUtc) -> Self {
        Self { date_time }
    }
}

impl From<DateTime> for DateTimeUtc {
    fn from(value: DateTime) -> Self {
        value.date_time
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date_time.to_rfc3339())
    }
}

impl DateTime {
    pub fn now() -> DateTime {
        DateTime::from(Utc::now())
    }

    /// The start of the unix epoch, also the default value.
    pub fn epoch() -> DateTime {
        DateTime::default()
    }

    pub fn as_chrono(&self) -> DateTimeUtc {
        self.date_time
    }
}
