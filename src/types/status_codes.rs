// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The table of status codes that can be produced by the subscription services.

#![allow(non_upper_case_globals)]

bitflags! {
    pub struct StatusCode: u32 {
        // Masks
        const STATUS_MASK = 0xffff_0000;
        const BIT_MASK = 0x0000_ffff;

        // Severity bits
        const IS_ERROR = 0x8000_0000;
        const IS_UNCERTAIN = 0x4000_0000;

        // Info bits
        const STRUCTURE_CHANGED = 0x8000;
        const SEMANTICS_CHANGED = 0x4000;
        const INFO_TYPE_DATA_VALUE = 0x0400;
        const LIMIT_LOW = 0x0100;
        const LIMIT_HIGH = 0x0200;
        const LIMIT_CONSTANT = 0x0300;
        const OVERFLOW = 0x0080;

        const Good = 0;
        const GoodNoData = 0x00A5_0000;
        const UncertainLastUsableValue = 0x4090_0000;
        const BadUnexpectedError = 0x8001_0000;
        const BadInternalError = 0x8002_0000;
        const BadOutOfMemory = 0x8003_0000;
        const BadTimeout = 0x800A_0000;
        const BadNothingToDo = 0x800F_0000;
        const BadTooManyOperations = 0x8010_0000;
        const BadSessionClosed = 0x8026_0000;
        const BadSubscriptionIdInvalid = 0x8028_0000;
        const BadWaitingForInitialData = 0x8032_0000;
        const BadNodeIdInvalid = 0x8033_0000;
        const BadAttributeIdInvalid = 0x8035_0000;
        const BadTimestampsToReturnInvalid = 0x802B_0000;
        const BadMonitoringModeInvalid = 0x8041_0000;
        const BadMonitoredItemIdInvalid = 0x8042_0000;
        const BadTooManySubscriptions = 0x8077_0000;
        const BadTooManyPublishRequests = 0x8078_0000;
        const BadNoSubscription = 0x8079_0000;
        const BadSequenceNumberUnknown = 0x807A_0000;
        const BadMessageNotAvailable = 0x807B_0000;
        const BadSequenceNumberInvalid = 0x8088_0000;
        const BadInvalidArgument = 0x80AB_0000;
        const BadTooManyMonitoredItems = 0x80DB_0000;
    }
}

impl StatusCode {
    /// Returns the name of the status part of the code, ignoring any info bits.
    pub fn name(&self) -> &'static str {
        match self.status() {
            StatusCode::Good => "Good",
            StatusCode::GoodNoData => "GoodNoData",
            StatusCode::UncertainLastUsableValue => "UncertainLastUsableValue",
            StatusCode::BadUnexpectedError => "BadUnexpectedError",
            StatusCode::BadInternalError => "BadInternalError",
            StatusCode::BadOutOfMemory => "BadOutOfMemory",
            StatusCode::BadTimeout => "BadTimeout",
            StatusCode::BadNothingToDo => "BadNothingToDo",
            StatusCode::BadTooManyOperations => "BadTooManyOperations",
            StatusCode::BadSessionClosed => "BadSessionClosed",
            StatusCode::BadSubscriptionIdInvalid => "BadSubscriptionIdInvalid",
            StatusCode::BadWaitingForInitialData => "BadWaitingForInitialData",
            StatusCode::BadNodeIdInvalid => "BadNodeIdInvalid",
            StatusCode::BadAttributeIdInvalid => "BadAttributeIdInvalid",
            StatusCode::BadTimestampsToReturnInvalid => "BadTimestampsToReturnInvalid",
            StatusCode::BadMonitoringModeInvalid => "BadMonitoringModeInvalid",
            StatusCode::BadMonitoredItemIdInvalid => "BadMonitoredItemIdInvalid",
            StatusCode::BadTooManySubscriptions => "BadTooManySubscriptions",
            StatusCode::BadTooManyPublishRequests => "BadTooManyPublishRequests",
            StatusCode::BadNoSubscription => "BadNoSubscription",
            StatusCode::BadSequenceNumberUnknown => "BadSequenceNumberUnknown",
            StatusCode::BadMessageNotAvailable => "BadMessageNotAvailable",
            StatusCode::BadSequenceNumberInvalid => "BadSequenceNumberInvalid",
            StatusCode::BadInvalidArgument => "BadInvalidArgument",
            StatusCode::BadTooManyMonitoredItems => "BadTooManyMonitoredItems",
            _ => "Unrecognized",
        }
    }
}
