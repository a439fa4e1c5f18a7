// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Notifications and the subscription wide queue that holds them.
//!
//! Every queued notification belongs to two queues at once: the queue of its monitored item and
//! the queue of its subscription. The subscription queue below owns the notifications, keyed by
//! a [`NotificationKey`] issued in arrival order, while a monitored item only keeps the keys of
//! its own notifications. Removing a notification therefore means removing its key from the item
//! and the entry from this queue, always together.

use std::collections::BTreeMap;

use crate::types::{EventFieldList, MonitoredItemNotification};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    MonitoredItemNotification(MonitoredItemNotification),
    Event(EventFieldList),
}

impl From<MonitoredItemNotification> for Notification {
    fn from(v: MonitoredItemNotification) -> Self {
        Notification::MonitoredItemNotification(v)
    }
}

impl From<EventFieldList> for Notification {
    fn from(v: EventFieldList) -> Self {
        Notification::Event(v)
    }
}

impl Notification {
    /// Marks the value as coming from an overflowed queue. Events have no status to mark, so
    /// this returns `false` for them.
    pub fn set_overflow(&mut self) -> bool {
        match self {
            Notification::MonitoredItemNotification(n) => {
                n.value.status = Some(n.value.status().set_overflow(true));
                true
            }
            Notification::Event(_) => false,
        }
    }

    pub fn overflow(&self) -> bool {
        match self {
            Notification::MonitoredItemNotification(n) => n.value.status().overflow(),
            Notification::Event(_) => false,
        }
    }

    pub fn client_handle(&self) -> u32 {
        match self {
            Notification::MonitoredItemNotification(n) => n.client_handle,
            Notification::Event(n) => n.client_handle,
        }
    }
}

/// Position of a notification in the queue of its subscription. Keys only ever increase, so
/// key order is arrival order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NotificationKey(u64);

#[derive(Debug)]
pub struct QueuedNotification {
    pub monitored_item_id: u32,
    pub notification: Notification,
}

/// The queue of all notifications of a subscription, in arrival order.
///
/// Besides the notifications it counts the ones that are ready to be published, i.e. those
/// whose monitored item is reporting. Callers say whether the item is reporting when they add
/// or remove an entry, and adjust the count when an item changes its monitoring mode.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    entries: BTreeMap<NotificationKey, QueuedNotification>,
    next_key: u64,
    ready: usize,
}

impl NotificationQueue {
    pub fn new() -> NotificationQueue {
        NotificationQueue::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of queued notifications that belong to reporting monitored items
    pub fn ready(&self) -> usize {
        self.ready
    }

    pub(crate) fn push(
        &mut self,
        monitored_item_id: u32,
        notification: Notification,
        reporting: bool,
    ) -> NotificationKey {
        let key = NotificationKey(self.next_key);
        self.next_key += 1;
        self.entries.insert(
            key,
            QueuedNotification {
                monitored_item_id,
                notification,
            },
        );
        if reporting {
            self.ready += 1;
        }
        key
    }

    pub(crate) fn remove(
        &mut self,
        key: NotificationKey,
        reporting: bool,
    ) -> Option<QueuedNotification> {
        let removed = self.entries.remove(&key);
        if removed.is_some() && reporting {
            debug_assert!(self.ready > 0);
            self.ready = self.ready.saturating_sub(1);
        }
        removed
    }

    pub fn get(&self, key: NotificationKey) -> Option<&QueuedNotification> {
        self.entries.get(&key)
    }

    pub(crate) fn get_mut(&mut self, key: NotificationKey) -> Option<&mut QueuedNotification> {
        self.entries.get_mut(&key)
    }

    /// Adjusts the ready count for `count` entries of an item that started or stopped reporting
    pub(crate) fn set_reporting(&mut self, count: usize, reporting: bool) {
        if reporting {
            self.ready += count;
        } else {
            debug_assert!(self.ready >= count);
            self.ready = self.ready.saturating_sub(count);
        }
    }

    /// Iterates the queue in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (NotificationKey, &QueuedNotification)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of queued notifications of one monitored item
    pub fn count_for(&self, monitored_item_id: u32) -> usize {
        self.entries
            .values()
            .filter(|n| n.monitored_item_id == monitored_item_id)
            .count()
    }
}
