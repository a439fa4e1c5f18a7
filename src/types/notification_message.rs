// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Helpers for NotificationMessage types

use crate::types::{
    date_time::DateTime,
    service_types::{
        DataChangeNotification, EventFieldList, EventNotificationList, MonitoredItemNotification,
        NotificationData, NotificationMessage, StatusChangeNotification,
    },
    status_code::StatusCode,
};

impl NotificationMessage {
    /// Create a notification message which contains data change AND / OR events. The
    /// notification data has up to 2 elements to cover a subscription that contains monitored
    /// items for both events and data.
    pub fn data_change(
        sequence_number: u32,
        publish_time: DateTime,
        data_change_notifications: Vec<MonitoredItemNotification>,
        event_notifications: Vec<EventFieldList>,
    ) -> NotificationMessage {
        debug_assert!(!data_change_notifications.is_empty() || !event_notifications.is_empty());
        let mut notification_data = Vec::with_capacity(2);
        if !data_change_notifications.is_empty() {
            trace!(
                "data change notification with {} items",
                data_change_notifications.len()
            );
            notification_data.push(NotificationData::DataChange(DataChangeNotification {
                monitored_items: Some(data_change_notifications),
            }));
        }
        if !event_notifications.is_empty() {
            trace!("event notification with {} events", event_notifications.len());
            notification_data.push(NotificationData::Events(EventNotificationList {
                events: Some(event_notifications),
            }));
        }
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: Some(notification_data),
        }
    }

    /// Create a status change notification message
    pub fn status_change(
        sequence_number: u32,
        publish_time: DateTime,
        status: StatusCode,
    ) -> NotificationMessage {
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: Some(vec![NotificationData::StatusChange(
                StatusChangeNotification { status },
            )]),
        }
    }

    /// Create a keep-alive notification message
    pub fn keep_alive(sequence_number: u32, publish_time: DateTime) -> NotificationMessage {
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: None,
        }
    }

    pub fn is_keep_alive(&self) -> bool {
        self.notification_data
            .as_ref()
            .map_or(true, |data| data.is_empty())
    }

    /// Extract the data change and event notifications from the message, in the order they were
    /// queued for each kind.
    pub fn notifications(
        &self,
    ) -> Option<(Vec<MonitoredItemNotification>, Vec<EventFieldList>)> {
        let data = self.notification_data.as_ref()?;
        let mut data_changes = Vec::new();
        let mut events = Vec::new();
        for n in data {
            match n {
                NotificationData::DataChange(v) => {
                    data_changes.extend(v.monitored_items.iter().flatten().cloned())
                }
                NotificationData::Events(v) => events.extend(v.events.iter().flatten().cloned()),
                NotificationData::StatusChange(_) => {
                    debug!("Ignoring a StatusChangeNotification");
                }
            }
        }
        if data_changes.is_empty() && events.is_empty() {
            None
        } else {
            Some((data_changes, events))
        }
    }

    /// The status of a status change message, if that is what it is.
    pub fn status_change_status(&self) -> Option<StatusCode> {
        self.notification_data.iter().flatten().find_map(|n| match n {
            NotificationData::StatusChange(v) => Some(v.status),
            _ => None,
        })
    }

    /// The number of data change and event notifications carried by the message.
    pub fn notification_count(&self) -> usize {
        self.notification_data
            .iter()
            .flatten()
            .map(|n| match n {
                NotificationData::DataChange(v) => v.monitored_items.as_ref().map_or(0, Vec::len),
                NotificationData::Events(v) => v.events.as_ref().map_or(0, Vec::len),
                NotificationData::StatusChange(_) => 0,
            })
            .sum()
    }
}
