// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

use crate::types::{date_time::DateTime, status_code::StatusCode, variant::Variant};

/// A sampled attribute value together with its status and timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValue {
    /// The value. BaseDataType
    pub value: Option<Variant>,
    /// The status associated with the value. Absent means Good.
    pub status: Option<StatusCode>,
    /// The source timestamp associated with the value.
    pub source_timestamp: Option<DateTime>,
    /// The number of 10 picosecond intervals for the source timestamp.
    pub source_picoseconds: Option<u16>,
    /// The server timestamp associated with the value.
    pub server_timestamp: Option<DateTime>,
    /// The number of 10 picosecond intervals for the server timestamp.
    pub server_picoseconds: Option<u16>,
}

impl DataValue {
    /// Creates a data value with a value and both timestamps set to now.
    pub fn new_now<V>(value: V) -> DataValue
    where
        V: Into<Variant>,
    {
        Self::new_at(value, DateTime::now())
    }

    /// Creates a data value with a value and both timestamps set to `time`.
    pub fn new_at<V>(value: V, time: DateTime) -> DataValue
    where
        V: Into<Variant>,
    {
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(time),
            source_picoseconds: None,
            server_timestamp: Some(time),
            server_picoseconds: None,
        }
    }

    /// Creates a data value with only a value, no status or timestamps.
    pub fn value_only<V>(value: V) -> DataValue
    where
        V: Into<Variant>,
    {
        DataValue {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// The status of the value, Good when none is set.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Good)
    }

    pub fn is_valid(&self) -> bool {
        self.status().is_good()
    }
}
