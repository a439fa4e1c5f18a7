// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::{
    core::handle::Handle,
    server::{
        config::limits::SubscriptionLimits,
        constants,
        scheduler::{CallbackId, CallbackTarget, Scheduler},
    },
    types::{
        DataValue, DateTime, EventFieldList, MonitoredItemCreateRequest, MonitoredItemCreateResult,
        MonitoredItemModifyRequest, MonitoredItemModifyResult, MonitoredItemNotification,
        MonitoringMode, NotificationMessage, StatusCode, TimestampsToReturn, Variant,
    },
};

use super::{
    monitored_item::{CreateMonitoredItem, MonitoredItem},
    notification::{Notification, NotificationKey, NotificationQueue},
    PublishRequestEntry, PublishTransport,
};

/// Identifies a monitored item across the subscriptions of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MonitoredItemHandle {
    pub subscription_id: u32,
    pub monitored_item_id: u32,
}

/// The state of the subscription
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SubscriptionState {
    /// Sending notifications as they become ready
    Normal,
    /// Has something to send but no publish request to send it with
    Late,
    /// Nothing to report, sending keep-alive messages instead
    KeepAlive,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickReason {
    /// A publish request arrived while the subscription was late. Counters do not move.
    ReceivePublishRequest,
    /// The publishing interval elapsed
    TickTimerFired,
}

/// What a publish cycle did
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickResult {
    /// Nothing was sent
    None,
    /// This many messages were sent, keep-alives included
    Sent(usize),
    /// The lifetime counter ran out. The subscription must be deleted.
    Expired,
}

/// A snapshot of a subscription for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionMetrics {
    pub id: u32,
    pub state: SubscriptionState,
    pub priority: u8,
    pub publishing_interval: f64,
    pub publishing_enabled: bool,
    pub current_keep_alive_count: u32,
    pub current_lifetime_count: u32,
    pub last_sequence_number: u32,
    pub monitored_items: usize,
    pub queued_notifications: usize,
    pub ready_notifications: usize,
    pub retransmission_queue_len: usize,
}

#[derive(Debug)]
pub struct Subscription {
    id: u32,
    /// Publishing interval in milliseconds
    publishing_interval: f64,
    /// The max lifetime count (not the current lifetime count)
    max_lifetime_count: u32,
    /// Keep alive count enforced
    max_keep_alive_count: u32,
    /// Maximum number of notifications in one message, 0 for no limit
    max_notifications_per_publish: usize,
    /// Relative priority of the subscription. When more than one subscription needs to send
    /// notifications the highest priority subscription should be sent first.
    priority: u8,
    publishing_enabled: bool,
    state: SubscriptionState,
    /// Issues sequence numbers for notification messages, never 0
    sequence_number: Handle,
    /// The last sequence number issued, 0 if none has been
    last_sequence_number: u32,
    /// Consecutive publishing intervals with nothing to report
    current_keep_alive_count: u32,
    /// Consecutive publishing intervals without a publish request from the client
    current_lifetime_count: u32,
    monitored_item_id_handle: Handle,
    monitored_items: HashMap<u32, MonitoredItem>,
    /// Queued notifications of all the monitored items, in arrival order
    notifications: NotificationQueue,
    /// Sent messages awaiting acknowledgement, oldest first
    retransmission_queue: VecDeque<NotificationMessage>,
    /// Never 0, the retransmission queue is always bounded
    max_retransmission_queue_size: usize,
    publish_callback: Option<CallbackId>,
}

impl Subscription {
    pub fn new(
        id: u32,
        publishing_enabled: bool,
        publishing_interval: f64,
        lifetime_count: u32,
        keep_alive_count: u32,
        max_notifications_per_publish: usize,
        priority: u8,
        max_retransmission_queue_size: usize,
    ) -> Subscription {
        Subscription {
            id,
            publishing_interval,
            max_lifetime_count: lifetime_count,
            max_keep_alive_count: keep_alive_count,
            max_notifications_per_publish,
            priority,
            publishing_enabled,
            state: SubscriptionState::Normal,
            sequence_number: Handle::new(1),
            last_sequence_number: 0,
            current_keep_alive_count: 0,
            current_lifetime_count: 0,
            monitored_item_id_handle: Handle::new(1),
            monitored_items: HashMap::new(),
            notifications: NotificationQueue::new(),
            retransmission_queue: VecDeque::new(),
            max_retransmission_queue_size: if max_retransmission_queue_size == 0 {
                constants::MAX_RETRANSMISSION_QUEUE_SIZE
            } else {
                max_retransmission_queue_size
            },
            publish_callback: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn publishing_interval(&self) -> f64 {
        self.publishing_interval
    }

    pub fn max_lifetime_count(&self) -> u32 {
        self.max_lifetime_count
    }

    pub fn max_keep_alive_count(&self) -> u32 {
        self.max_keep_alive_count
    }

    pub fn max_notifications_per_publish(&self) -> usize {
        self.max_notifications_per_publish
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn publishing_enabled(&self) -> bool {
        self.publishing_enabled
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn current_keep_alive_count(&self) -> u32 {
        self.current_keep_alive_count
    }

    pub fn current_lifetime_count(&self) -> u32 {
        self.current_lifetime_count
    }

    pub fn last_sequence_number(&self) -> u32 {
        self.last_sequence_number
    }

    pub fn is_publishing_registered(&self) -> bool {
        self.publish_callback.is_some()
    }

    pub fn len(&self) -> usize {
        self.monitored_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitored_items.is_empty()
    }

    pub fn monitored_item(&self, monitored_item_id: u32) -> Option<&MonitoredItem> {
        self.monitored_items.get(&monitored_item_id)
    }

    pub fn monitored_items(&self) -> impl Iterator<Item = &MonitoredItem> + '_ {
        self.monitored_items.values()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notification_queue_len(&self) -> usize {
        self.notifications.len()
    }

    pub fn ready_notifications(&self) -> usize {
        self.notifications.ready()
    }

    pub fn retransmission_queue_len(&self) -> usize {
        self.retransmission_queue.len()
    }

    /// Sequence numbers of the sent messages that have not been acknowledged yet
    pub fn available_sequence_numbers(&self) -> Option<Vec<u32>> {
        if self.retransmission_queue.is_empty() {
            None
        } else {
            Some(
                self.retransmission_queue
                    .iter()
                    .map(|m| m.sequence_number)
                    .collect(),
            )
        }
    }

    pub fn metrics(&self) -> SubscriptionMetrics {
        SubscriptionMetrics {
            id: self.id,
            state: self.state,
            priority: self.priority,
            publishing_interval: self.publishing_interval,
            publishing_enabled: self.publishing_enabled,
            current_keep_alive_count: self.current_keep_alive_count,
            current_lifetime_count: self.current_lifetime_count,
            last_sequence_number: self.last_sequence_number,
            monitored_items: self.monitored_items.len(),
            queued_notifications: self.notifications.len(),
            ready_notifications: self.notifications.ready(),
            retransmission_queue_len: self.retransmission_queue.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_next_sequence_number(&mut self, next: u32) {
        self.sequence_number.set_next(next);
    }

    pub(super) fn register_publishing(
        &mut self,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), StatusCode> {
        if self.publish_callback.is_none() {
            let callback_id =
                scheduler.register(CallbackTarget::Publish(self.id), self.publishing_interval)?;
            self.publish_callback = Some(callback_id);
        }
        Ok(())
    }

    pub(super) fn unregister_publishing(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(callback_id) = self.publish_callback.take() {
            scheduler.unregister(callback_id);
        }
    }

    /// Applies revised values. The publish callback is registered again if the interval changed.
    pub(super) fn modify(
        &mut self,
        scheduler: &mut dyn Scheduler,
        publishing_interval: f64,
        lifetime_count: u32,
        keep_alive_count: u32,
        max_notifications_per_publish: usize,
        priority: u8,
    ) -> Result<(), StatusCode> {
        if publishing_interval != self.publishing_interval && self.publish_callback.is_some() {
            let callback_id =
                scheduler.register(CallbackTarget::Publish(self.id), publishing_interval)?;
            if let Some(old) = self.publish_callback.replace(callback_id) {
                scheduler.unregister(old);
            }
        }
        self.publishing_interval = publishing_interval;
        self.max_lifetime_count = lifetime_count;
        self.max_keep_alive_count = keep_alive_count;
        self.max_notifications_per_publish = max_notifications_per_publish;
        self.priority = priority;
        self.current_lifetime_count = 0;
        self.current_keep_alive_count = 0;
        Ok(())
    }

    pub(super) fn set_publishing_enabled(&mut self, publishing_enabled: bool) {
        self.publishing_enabled = publishing_enabled;
        self.current_lifetime_count = 0;
    }

    /// Client activity on the subscription, e.g. a republish, restarts the lifetime count
    pub(super) fn reset_lifetime_counter(&mut self) {
        self.current_lifetime_count = 0;
    }

    /// Creates monitored items on the subscription, returning the creation results
    pub(super) fn create_monitored_items(
        &mut self,
        scheduler: &mut dyn Scheduler,
        limits: &SubscriptionLimits,
        timestamps_to_return: TimestampsToReturn,
        items_to_create: &[MonitoredItemCreateRequest],
    ) -> Vec<MonitoredItemCreateResult> {
        items_to_create
            .iter()
            .map(|item_to_create| {
                match self.create_monitored_item(
                    scheduler,
                    limits,
                    timestamps_to_return,
                    item_to_create,
                ) {
                    Ok(item) => MonitoredItemCreateResult {
                        status_code: StatusCode::Good,
                        monitored_item_id: item.id(),
                        revised_sampling_interval: item.sampling_interval(),
                        revised_queue_size: item.queue_size() as u32,
                    },
                    Err(status_code) => MonitoredItemCreateResult {
                        status_code,
                        monitored_item_id: 0,
                        revised_sampling_interval: 0f64,
                        revised_queue_size: 0,
                    },
                }
            })
            .collect()
    }

    fn create_monitored_item(
        &mut self,
        scheduler: &mut dyn Scheduler,
        limits: &SubscriptionLimits,
        timestamps_to_return: TimestampsToReturn,
        item_to_create: &MonitoredItemCreateRequest,
    ) -> Result<&MonitoredItem, StatusCode> {
        if limits.max_monitored_items_per_sub > 0
            && self.monitored_items.len() >= limits.max_monitored_items_per_sub
        {
            return Err(StatusCode::BadTooManyMonitoredItems);
        }
        let create = CreateMonitoredItem::new(
            item_to_create,
            self.peek_monitored_item_id(),
            limits,
            self.publishing_interval,
            timestamps_to_return,
        )?;
        let mut item = MonitoredItem::new(&create);
        if item.is_sampling() {
            item.register_sampling(self.item_handle(create.id()), scheduler)?;
        }
        let monitored_item_id = self.monitored_item_id_handle.next();
        debug_assert_eq!(monitored_item_id, create.id());
        debug!(
            "Subscription {} created monitored item {} on {:?}",
            self.id,
            monitored_item_id,
            item.item_to_monitor()
        );
        Ok(self
            .monitored_items
            .entry(monitored_item_id)
            .or_insert(item))
    }

    /// The id the next monitored item gets. Once the ids have wrapped around, the ones still in
    /// use are skipped.
    fn peek_monitored_item_id(&mut self) -> u32 {
        while self
            .monitored_items
            .contains_key(&self.monitored_item_id_handle.peek())
        {
            let _ = self.monitored_item_id_handle.next();
        }
        self.monitored_item_id_handle.peek()
    }

    #[cfg(test)]
    pub(crate) fn set_next_monitored_item_id(&mut self, next: u32) {
        self.monitored_item_id_handle.set_next(next);
    }

    /// Modifies the specified monitored items, returning a result for each
    pub(super) fn modify_monitored_items(
        &mut self,
        scheduler: &mut dyn Scheduler,
        limits: &SubscriptionLimits,
        timestamps_to_return: TimestampsToReturn,
        items_to_modify: &[MonitoredItemModifyRequest],
    ) -> Vec<MonitoredItemModifyResult> {
        items_to_modify
            .iter()
            .map(|item_to_modify| {
                match self.modify_monitored_item(
                    scheduler,
                    limits,
                    timestamps_to_return,
                    item_to_modify,
                ) {
                    Ok(item) => MonitoredItemModifyResult {
                        status_code: StatusCode::Good,
                        revised_sampling_interval: item.sampling_interval(),
                        revised_queue_size: item.queue_size() as u32,
                    },
                    Err(status_code) => MonitoredItemModifyResult {
                        status_code,
                        revised_sampling_interval: 0f64,
                        revised_queue_size: 0,
                    },
                }
            })
            .collect()
    }

    fn modify_monitored_item(
        &mut self,
        scheduler: &mut dyn Scheduler,
        limits: &SubscriptionLimits,
        timestamps_to_return: TimestampsToReturn,
        item_to_modify: &MonitoredItemModifyRequest,
    ) -> Result<&MonitoredItem, StatusCode> {
        let handle = self.item_handle(item_to_modify.monitored_item_id);
        let item = self
            .monitored_items
            .get_mut(&item_to_modify.monitored_item_id)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        item.modify(
            limits,
            self.publishing_interval,
            timestamps_to_return,
            item_to_modify,
            handle,
            scheduler,
        )?;
        item.ensure_queue_space(&mut self.notifications);
        Ok(item)
    }

    /// Sets the monitoring mode of the specified monitored items, returning a status for each
    pub(super) fn set_monitoring_mode(
        &mut self,
        scheduler: &mut dyn Scheduler,
        monitoring_mode: MonitoringMode,
        monitored_item_ids: &[u32],
    ) -> Vec<StatusCode> {
        monitored_item_ids
            .iter()
            .map(|monitored_item_id| {
                match self.set_item_monitoring_mode(scheduler, monitoring_mode, *monitored_item_id)
                {
                    Ok(()) => StatusCode::Good,
                    Err(status_code) => status_code,
                }
            })
            .collect()
    }

    fn set_item_monitoring_mode(
        &mut self,
        scheduler: &mut dyn Scheduler,
        monitoring_mode: MonitoringMode,
        monitored_item_id: u32,
    ) -> Result<(), StatusCode> {
        let handle = self.item_handle(monitored_item_id);
        let item = self
            .monitored_items
            .get_mut(&monitored_item_id)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        if monitoring_mode == MonitoringMode::Disabled {
            item.unregister_sampling(scheduler);
            item.release_notifications(&mut self.notifications);
            item.set_monitoring_mode(monitoring_mode);
            Ok(())
        } else {
            item.register_sampling(handle, scheduler)?;
            let was_reporting = item.is_reporting();
            item.set_monitoring_mode(monitoring_mode);
            let reporting = item.is_reporting();
            if was_reporting != reporting {
                self.notifications
                    .set_reporting(item.queue_len(), reporting);
            }
            Ok(())
        }
    }

    /// Deletes the specified monitored items, returning a status for each
    pub(super) fn delete_monitored_items(
        &mut self,
        scheduler: &mut dyn Scheduler,
        monitored_item_ids: &[u32],
    ) -> Vec<StatusCode> {
        monitored_item_ids
            .iter()
            .map(|monitored_item_id| {
                if let Some(item) = self.monitored_items.remove(monitored_item_id) {
                    item.delete(&mut self.notifications, scheduler);
                    StatusCode::Good
                } else {
                    StatusCode::BadMonitoredItemIdInvalid
                }
            })
            .collect()
    }

    /// Hands a sampled value to a monitored item. Returns whether it was queued.
    pub(super) fn notify_data_value(
        &mut self,
        monitored_item_id: u32,
        value: DataValue,
    ) -> Result<bool, StatusCode> {
        let item = self
            .monitored_items
            .get_mut(&monitored_item_id)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        Ok(match item.data_change(value) {
            Some(notification) => {
                item.enqueue_notification(notification, &mut self.notifications);
                true
            }
            None => false,
        })
    }

    /// Hands an event to a monitored item. Returns whether it was queued.
    pub(super) fn notify_event(
        &mut self,
        monitored_item_id: u32,
        event_fields: Vec<Variant>,
    ) -> Result<bool, StatusCode> {
        let item = self
            .monitored_items
            .get_mut(&monitored_item_id)
            .ok_or(StatusCode::BadMonitoredItemIdInvalid)?;
        Ok(match item.event(event_fields) {
            Some(notification) => {
                item.enqueue_notification(notification, &mut self.notifications);
                true
            }
            None => false,
        })
    }

    /// Whether a sampling callback for this item is still live. A firing for an item that is
    /// gone or no longer sampled is stale and must be ignored.
    pub(super) fn is_sampling(&self, monitored_item_id: u32) -> bool {
        self.monitored_items
            .get(&monitored_item_id)
            .map_or(false, |item| item.is_sampling_registered())
    }

    /// Runs one publish cycle.
    ///
    /// On a timer tick the lifetime counter moves first, and the subscription expires if the
    /// client has not sent a publish request for `max_lifetime_count` intervals. Then either the
    /// ready notifications are sent, one message per available publish request, or, with nothing
    /// to report, a keep-alive is sent once the keep-alive counter reaches its maximum.
    pub fn tick(
        &mut self,
        now: &DateTime,
        tick_reason: TickReason,
        transport: &mut dyn PublishTransport,
    ) -> TickResult {
        if tick_reason == TickReason::TickTimerFired {
            if transport.has_publish_request() {
                self.current_lifetime_count = 0;
            } else {
                self.current_lifetime_count += 1;
                if self.current_lifetime_count >= self.max_lifetime_count {
                    info!(
                        "Subscription {} has expired after {} publishing intervals without a publish request",
                        self.id, self.current_lifetime_count
                    );
                    return TickResult::Expired;
                }
            }
        }

        let ready = if self.publishing_enabled {
            self.notifications.ready()
        } else {
            0
        };

        trace!(
            "Subscription {} tick {:?}, state {:?}, {} ready, keep alive {}/{}, lifetime {}/{}",
            self.id,
            tick_reason,
            self.state,
            ready,
            self.current_keep_alive_count,
            self.max_keep_alive_count,
            self.current_lifetime_count,
            self.max_lifetime_count
        );

        if ready == 0 {
            self.tick_keep_alive(now, tick_reason, transport)
        } else {
            self.publish_notifications(now, transport)
        }
    }

    fn tick_keep_alive(
        &mut self,
        now: &DateTime,
        tick_reason: TickReason,
        transport: &mut dyn PublishTransport,
    ) -> TickResult {
        if tick_reason == TickReason::TickTimerFired {
            self.current_keep_alive_count += 1;
        }
        if self.current_keep_alive_count < self.max_keep_alive_count {
            return TickResult::None;
        }
        let Some(request) = transport.take_publish_request() else {
            self.set_state(SubscriptionState::Late);
            return TickResult::None;
        };
        debug!(
            "Subscription {} sending keep alive with sequence number {}",
            self.id, self.last_sequence_number
        );
        let message = NotificationMessage::keep_alive(self.last_sequence_number, *now);
        self.send_message(now, request, message, false, transport);
        self.current_keep_alive_count = 0;
        self.set_state(SubscriptionState::KeepAlive);
        TickResult::Sent(1)
    }

    fn publish_notifications(
        &mut self,
        now: &DateTime,
        transport: &mut dyn PublishTransport,
    ) -> TickResult {
        let mut sent = 0;
        loop {
            let Some(request) = transport.take_publish_request() else {
                debug!(
                    "Subscription {} has {} notifications ready but no publish request",
                    self.id,
                    self.notifications.ready()
                );
                self.set_state(SubscriptionState::Late);
                break;
            };
            let message = self.create_notification_message(now);
            let more_notifications = self.notifications.ready() > 0;
            self.archive_message(message.clone());
            self.send_message(now, request, message, more_notifications, transport);
            self.current_keep_alive_count = 0;
            self.current_lifetime_count = 0;
            sent += 1;
            if !more_notifications {
                self.set_state(SubscriptionState::Normal);
                break;
            }
        }
        if sent > 0 {
            TickResult::Sent(sent)
        } else {
            TickResult::None
        }
    }

    /// The state does not change while publishing is disabled. A subscription that goes late
    /// starts counting its lifetime from zero.
    fn set_state(&mut self, state: SubscriptionState) {
        if !self.publishing_enabled || self.state == state {
            return;
        }
        debug!(
            "Subscription {} state {:?} -> {:?}",
            self.id, self.state, state
        );
        if state == SubscriptionState::Late {
            self.current_lifetime_count = 0;
        }
        self.state = state;
    }

    fn next_sequence_number(&mut self) -> u32 {
        let sequence_number = self.sequence_number.next();
        debug_assert_ne!(sequence_number, 0);
        self.last_sequence_number = sequence_number;
        sequence_number
    }

    /// Takes up to `max_notifications_per_publish` notifications of reporting monitored items
    /// from the queue, oldest first, and puts them in a new message.
    fn create_notification_message(&mut self, now: &DateTime) -> NotificationMessage {
        let max = if self.max_notifications_per_publish == 0 {
            usize::MAX
        } else {
            self.max_notifications_per_publish
        };
        let monitored_items = &self.monitored_items;
        let to_send: Vec<(NotificationKey, u32)> = self
            .notifications
            .iter()
            .filter(|(_, n)| {
                monitored_items
                    .get(&n.monitored_item_id)
                    .map_or(false, |item| item.is_reporting())
            })
            .take(max)
            .map(|(key, n)| (key, n.monitored_item_id))
            .collect();

        let mut data_changes: Vec<MonitoredItemNotification> = Vec::new();
        let mut events: Vec<EventFieldList> = Vec::new();
        for (key, monitored_item_id) in to_send {
            if let Some(item) = self.monitored_items.get_mut(&monitored_item_id) {
                item.remove_key(key);
            }
            if let Some(queued) = self.notifications.remove(key, true) {
                match queued.notification {
                    Notification::MonitoredItemNotification(n) => data_changes.push(n),
                    Notification::Event(n) => events.push(n),
                }
            }
        }

        let sequence_number = self.next_sequence_number();
        debug!(
            "Subscription {} message {} with {} data changes and {} events",
            self.id,
            sequence_number,
            data_changes.len(),
            events.len()
        );
        NotificationMessage::data_change(sequence_number, *now, data_changes, events)
    }

    fn archive_message(&mut self, message: NotificationMessage) {
        self.retransmission_queue.push_back(message);
        while self.retransmission_queue.len() > self.max_retransmission_queue_size {
            if let Some(discarded) = self.retransmission_queue.pop_front() {
                warn!(
                    "Subscription {} retransmission queue is full, discarding unacknowledged message {}",
                    self.id, discarded.sequence_number
                );
            }
        }
    }

    fn send_message(
        &self,
        now: &DateTime,
        request: PublishRequestEntry,
        notification_message: NotificationMessage,
        more_notifications: bool,
        transport: &mut dyn PublishTransport,
    ) {
        let request_id = request.request_id;
        let response = request.into_response(
            now,
            self.id,
            self.available_sequence_numbers(),
            more_notifications,
            notification_message,
        );
        transport.send_publish_response(request_id, response.into());
    }

    /// Creates the message telling the client the subscription has changed status, e.g. that
    /// it timed out. The message consumes a sequence number but is not kept for republishing.
    pub(super) fn status_change_message(
        &mut self,
        now: &DateTime,
        status: StatusCode,
    ) -> NotificationMessage {
        let sequence_number = self.next_sequence_number();
        NotificationMessage::status_change(sequence_number, *now, status)
    }

    /// Removes an acknowledged message from the retransmission queue. The notification queue is
    /// not touched.
    pub fn remove_retransmission_message(&mut self, sequence_number: u32) -> Result<(), StatusCode> {
        let idx = self
            .retransmission_queue
            .iter()
            .position(|m| m.sequence_number == sequence_number)
            .ok_or(StatusCode::BadSequenceNumberUnknown)?;
        self.retransmission_queue.remove(idx);
        trace!(
            "Subscription {} message {} acknowledged",
            self.id,
            sequence_number
        );
        Ok(())
    }

    /// A copy of a sent message that has not been acknowledged yet
    pub fn find_notification_message(
        &self,
        sequence_number: u32,
    ) -> Result<NotificationMessage, StatusCode> {
        self.retransmission_queue
            .iter()
            .find(|m| m.sequence_number == sequence_number)
            .cloned()
            .ok_or(StatusCode::BadMessageNotAvailable)
    }

    /// Deletes the subscription. Callbacks are unregistered, the monitored items are deleted and
    /// every queue is emptied.
    pub(super) fn delete(mut self, scheduler: &mut dyn Scheduler) {
        self.unregister_publishing(scheduler);
        for (_, item) in self.monitored_items.drain() {
            item.delete(&mut self.notifications, scheduler);
        }
        debug_assert!(self.notifications.is_empty());
        self.retransmission_queue.clear();
        debug!("Deleted subscription {}", self.id);
    }

    fn item_handle(&self, monitored_item_id: u32) -> MonitoredItemHandle {
        MonitoredItemHandle {
            subscription_id: self.id,
            monitored_item_id,
        }
    }
}
