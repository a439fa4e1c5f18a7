// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Decoded request / response structures of the subscription and monitored item service sets.

use crate::types::{
    data_value::DataValue, date_time::DateTime, node_id::ReadValueId, status_code::StatusCode,
    variant::Variant,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitoringMode {
    Disabled = 0,
    Sampling = 1,
    Reporting = 2,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimestampsToReturn {
    Source = 0,
    Server = 1,
    Both = 2,
    Neither = 3,
    Invalid = 4,
}

/// Decides which changes of a sampled value produce a notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataChangeTrigger {
    Status = 0,
    #[default]
    StatusValue = 1,
    StatusValueTimestamp = 2,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataChangeFilter {
    pub trigger: DataChangeTrigger,
}

impl DataChangeFilter {
    /// Compares two values according to the trigger, returning `true` if they count as equal.
    pub fn compare(&self, v1: &DataValue, v2: &DataValue) -> bool {
        let status_equal = v1.status() == v2.status();
        match self.trigger {
            DataChangeTrigger::Status => status_equal,
            DataChangeTrigger::StatusValue => status_equal && v1.value == v2.value,
            DataChangeTrigger::StatusValueTimestamp => {
                status_equal
                    && v1.value == v2.value
                    && v1.source_timestamp == v2.source_timestamp
                    && v1.source_picoseconds == v2.source_picoseconds
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestHeader {
    pub timestamp: DateTime,
    pub request_handle: u32,
}

impl RequestHeader {
    pub fn new(request_handle: u32) -> RequestHeader {
        RequestHeader {
            timestamp: DateTime::now(),
            request_handle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub timestamp: DateTime,
    pub request_handle: u32,
    pub service_result: StatusCode,
}

impl ResponseHeader {
    pub fn new_good(request_header: &RequestHeader) -> ResponseHeader {
        ResponseHeader::new_service_result(request_header, StatusCode::Good)
    }

    pub fn new_service_result(
        request_header: &RequestHeader,
        service_result: StatusCode,
    ) -> ResponseHeader {
        ResponseHeader::new_timestamped_service_result(
            DateTime::now(),
            request_header,
            service_result,
        )
    }

    pub fn new_timestamped_service_result(
        timestamp: DateTime,
        request_header: &RequestHeader,
        service_result: StatusCode,
    ) -> ResponseHeader {
        ResponseHeader {
            timestamp,
            request_handle: request_header.request_handle,
            service_result,
        }
    }
}

/// The response sent in place of the expected one when a service fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFault {
    pub response_header: ResponseHeader,
}

impl ServiceFault {
    pub fn new(request_header: &RequestHeader, service_result: StatusCode) -> ServiceFault {
        ServiceFault {
            response_header: ResponseHeader::new_service_result(request_header, service_result),
        }
    }
}

// Notifications

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemNotification {
    pub client_handle: u32,
    pub value: DataValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFieldList {
    pub client_handle: u32,
    pub event_fields: Option<Vec<Variant>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChangeNotification {
    pub monitored_items: Option<Vec<MonitoredItemNotification>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNotificationList {
    pub events: Option<Vec<EventFieldList>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeNotification {
    pub status: StatusCode,
}

/// One element of the notification data of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationData {
    DataChange(DataChangeNotification),
    Events(EventNotificationList),
    StatusChange(StatusChangeNotification),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub sequence_number: u32,
    pub publish_time: DateTime,
    pub notification_data: Option<Vec<NotificationData>>,
}

// Subscription services

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub request_header: RequestHeader,
    pub requested_publishing_interval: f64,
    pub requested_lifetime_count: u32,
    pub requested_max_keep_alive_count: u32,
    pub max_notifications_per_publish: u32,
    pub publishing_enabled: bool,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionResponse {
    pub response_header: ResponseHeader,
    pub subscription_id: u32,
    pub revised_publishing_interval: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifySubscriptionRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub requested_publishing_interval: f64,
    pub requested_lifetime_count: u32,
    pub requested_max_keep_alive_count: u32,
    pub max_notifications_per_publish: u32,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifySubscriptionResponse {
    pub response_header: ResponseHeader,
    pub revised_publishing_interval: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPublishingModeRequest {
    pub request_header: RequestHeader,
    pub publishing_enabled: bool,
    pub subscription_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPublishingModeResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionAcknowledgement {
    pub subscription_id: u32,
    pub sequence_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub request_header: RequestHeader,
    pub subscription_acknowledgements: Option<Vec<SubscriptionAcknowledgement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub response_header: ResponseHeader,
    pub subscription_id: u32,
    pub available_sequence_numbers: Option<Vec<u32>>,
    pub more_notifications: bool,
    pub notification_message: NotificationMessage,
    /// Results of the acknowledgements carried by the request
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepublishRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub retransmit_sequence_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepublishResponse {
    pub response_header: ResponseHeader,
    pub notification_message: NotificationMessage,
}

// Monitored item services

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringParameters {
    pub client_handle: u32,
    /// Milliseconds. Negative means use the publishing interval of the subscription.
    pub sampling_interval: f64,
    pub filter: Option<DataChangeFilter>,
    pub queue_size: u32,
    pub discard_oldest: bool,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        Self {
            client_handle: 0,
            sampling_interval: -1.0,
            filter: None,
            queue_size: 1,
            discard_oldest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateRequest {
    pub item_to_monitor: ReadValueId,
    pub monitoring_mode: MonitoringMode,
    pub requested_parameters: MonitoringParameters,
}

impl MonitoredItemCreateRequest {
    pub fn new(
        item_to_monitor: ReadValueId,
        monitoring_mode: MonitoringMode,
        requested_parameters: MonitoringParameters,
    ) -> Self {
        Self {
            item_to_monitor,
            monitoring_mode,
            requested_parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateResult {
    pub status_code: StatusCode,
    pub monitored_item_id: u32,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemModifyRequest {
    pub monitored_item_id: u32,
    pub requested_parameters: MonitoringParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemModifyResult {
    pub status_code: StatusCode,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
}
