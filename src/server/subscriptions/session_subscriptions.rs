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
        scheduler::{CallbackTarget, Scheduler, TickScheduler},
    },
    types::{
        CreateSubscriptionRequest, CreateSubscriptionResponse, DataValue, DateTime,
        ModifySubscriptionRequest, ModifySubscriptionResponse, MonitoredItemCreateRequest,
        MonitoredItemCreateResult, MonitoredItemModifyRequest, MonitoredItemModifyResult,
        MonitoringMode, NotificationMessage, PublishRequest, RepublishRequest, RepublishResponse,
        ResponseHeader, SetPublishingModeRequest, SetPublishingModeResponse, StatusCode,
        TimestampsToReturn, Variant,
    },
};

use super::{
    subscription::{
        MonitoredItemHandle, Subscription, SubscriptionMetrics, SubscriptionState, TickReason,
        TickResult,
    },
    PublishQueues, PublishRequestEntry, PublishResponseEntry, PublishTransport, Sampler,
};

/// A snapshot of the subscriptions of a session for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SessionSubscriptionsMetrics {
    pub subscriptions: Vec<SubscriptionMetrics>,
    pub pending_publish_requests: usize,
    pub pending_publish_responses: usize,
    pub pending_status_changes: usize,
}

/// The subscriptions of a session.
///
/// Pairs the publish requests coming from the client with the notifications coming from the
/// subscriptions. Requests wait in a queue until some subscription has something to send, and
/// the responses wait in another until the transport collects them with
/// [`SessionSubscriptions::take_publish_responses`].
///
/// Sampling and publishing run in callbacks registered with the scheduler `S`. Whoever drives
/// the scheduler hands each firing back to [`SessionSubscriptions::run_callback`].
#[derive(Debug)]
pub struct SessionSubscriptions<S: Scheduler> {
    scheduler: S,
    subscriptions: HashMap<u32, Subscription>,
    publish_queues: PublishQueues,
    /// Status changes of expired subscriptions waiting for a publish request, as subscription
    /// id and message
    status_changes: VecDeque<(u32, NotificationMessage)>,
    subscription_id_handle: Handle,
    limits: SubscriptionLimits,
}

impl<S: Scheduler> SessionSubscriptions<S> {
    /// Creates the subscriptions of a session. Limits that are not valid are replaced by the
    /// defaults.
    pub fn new(limits: SubscriptionLimits, scheduler: S) -> Self {
        let limits = if limits.is_valid() {
            limits
        } else {
            error!("Subscription limits are not valid, using the defaults");
            SubscriptionLimits::default()
        };
        Self {
            scheduler,
            subscriptions: HashMap::new(),
            publish_queues: PublishQueues::default(),
            status_changes: VecDeque::new(),
            subscription_id_handle: Handle::new(1),
            limits,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn limits(&self) -> &SubscriptionLimits {
        &self.limits
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn contains(&self, subscription_id: u32) -> bool {
        self.subscriptions.contains_key(&subscription_id)
    }

    pub fn get(&self, subscription_id: u32) -> Option<&Subscription> {
        self.subscriptions.get(&subscription_id)
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, subscription_id: u32) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(&subscription_id)
    }

    /// Ids of all subscriptions, in ascending order
    pub fn subscription_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn publish_request_queue_len(&self) -> usize {
        self.publish_queues.request_queue_len()
    }

    pub fn publish_response_queue_len(&self) -> usize {
        self.publish_queues.response_queue_len()
    }

    /// The number of publish requests the session will hold before it starts failing the oldest
    pub fn max_publish_requests(&self) -> usize {
        self.limits
            .max_pending_publish_requests
            .min(
                self.subscriptions
                    .len()
                    .saturating_mul(self.limits.max_publish_requests_per_subscription),
            )
            .max(1)
    }

    pub fn reached_publish_request_limit(&self) -> bool {
        self.publish_queues.request_queue_len() >= self.max_publish_requests()
    }

    /// Handles a CreateSubscriptionRequest
    pub fn create_subscription(
        &mut self,
        request: &CreateSubscriptionRequest,
    ) -> Result<CreateSubscriptionResponse, StatusCode> {
        if self.limits.max_subscriptions_per_session > 0
            && self.subscriptions.len() >= self.limits.max_subscriptions_per_session
        {
            warn!(
                "Session already has {} subscriptions, the maximum",
                self.subscriptions.len()
            );
            return Err(StatusCode::BadTooManySubscriptions);
        }

        let (revised_publishing_interval, revised_max_keep_alive_count, revised_lifetime_count) =
            self.revise_subscription_values(
                request.requested_publishing_interval,
                request.requested_max_keep_alive_count,
                request.requested_lifetime_count,
            );
        let max_notifications_per_publish =
            self.revise_max_notifications_per_publish(request.max_notifications_per_publish);

        let subscription_id = self.subscription_id_handle.next();
        let mut subscription = Subscription::new(
            subscription_id,
            request.publishing_enabled,
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            max_notifications_per_publish,
            request.priority,
            self.limits.max_retransmission_queue_size,
        );
        subscription.register_publishing(&mut self.scheduler)?;
        info!(
            "Created subscription {}, publishing interval {}ms, keep alive {}, lifetime {}",
            subscription_id,
            revised_publishing_interval,
            revised_max_keep_alive_count,
            revised_lifetime_count
        );
        self.subscriptions.insert(subscription_id, subscription);

        Ok(CreateSubscriptionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            subscription_id,
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
        })
    }

    /// Handles a ModifySubscriptionRequest
    pub fn modify_subscription(
        &mut self,
        request: &ModifySubscriptionRequest,
    ) -> Result<ModifySubscriptionResponse, StatusCode> {
        let (revised_publishing_interval, revised_max_keep_alive_count, revised_lifetime_count) =
            self.revise_subscription_values(
                request.requested_publishing_interval,
                request.requested_max_keep_alive_count,
                request.requested_lifetime_count,
            );
        let max_notifications_per_publish =
            self.revise_max_notifications_per_publish(request.max_notifications_per_publish);

        let subscription = self
            .subscriptions
            .get_mut(&request.subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        subscription.modify(
            &mut self.scheduler,
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            max_notifications_per_publish,
            request.priority,
        )?;

        Ok(ModifySubscriptionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            revised_publishing_interval,
            revised_lifetime_count,
            revised_max_keep_alive_count,
        })
    }

    /// Handles a SetPublishingModeRequest
    pub fn set_publishing_mode(
        &mut self,
        request: &SetPublishingModeRequest,
    ) -> Result<SetPublishingModeResponse, StatusCode> {
        let subscription_ids = match request.subscription_ids.as_deref() {
            Some(ids) if !ids.is_empty() => ids,
            _ => return Err(StatusCode::BadNothingToDo),
        };
        let results = subscription_ids
            .iter()
            .map(|subscription_id| {
                if let Some(subscription) = self.subscriptions.get_mut(subscription_id) {
                    subscription.set_publishing_enabled(request.publishing_enabled);
                    StatusCode::Good
                } else {
                    StatusCode::BadSubscriptionIdInvalid
                }
            })
            .collect();
        Ok(SetPublishingModeResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            results: Some(results),
        })
    }

    /// Deletes subscriptions, returning a status for each. Outstanding publish requests are
    /// answered when the last subscription goes.
    pub fn delete_subscriptions(
        &mut self,
        subscription_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        if subscription_ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let results: Vec<StatusCode> = subscription_ids
            .iter()
            .map(|subscription_id| {
                if let Some(subscription) = self.subscriptions.remove(subscription_id) {
                    subscription.delete(&mut self.scheduler);
                    StatusCode::Good
                } else {
                    StatusCode::BadSubscriptionIdInvalid
                }
            })
            .collect();
        if self.subscriptions.is_empty() && results.contains(&StatusCode::Good) {
            self.answer_publish_requests_no_subscription();
        }
        Ok(results)
    }

    /// Deletes every subscription and answers the outstanding publish requests
    pub fn close(&mut self) {
        for (_, subscription) in self.subscriptions.drain() {
            subscription.delete(&mut self.scheduler);
        }
        self.status_changes.clear();
        let failed = self
            .publish_queues
            .fail_all_requests(StatusCode::BadSessionClosed);
        info!(
            "Closed session subscriptions, answered {} publish requests",
            failed
        );
    }

    pub fn create_monitored_items(
        &mut self,
        subscription_id: u32,
        timestamps_to_return: TimestampsToReturn,
        items_to_create: &[MonitoredItemCreateRequest],
    ) -> Result<Vec<MonitoredItemCreateResult>, StatusCode> {
        if timestamps_to_return == TimestampsToReturn::Invalid {
            return Err(StatusCode::BadTimestampsToReturnInvalid);
        }
        if items_to_create.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(subscription.create_monitored_items(
            &mut self.scheduler,
            &self.limits,
            timestamps_to_return,
            items_to_create,
        ))
    }

    pub fn modify_monitored_items(
        &mut self,
        subscription_id: u32,
        timestamps_to_return: TimestampsToReturn,
        items_to_modify: &[MonitoredItemModifyRequest],
    ) -> Result<Vec<MonitoredItemModifyResult>, StatusCode> {
        if timestamps_to_return == TimestampsToReturn::Invalid {
            return Err(StatusCode::BadTimestampsToReturnInvalid);
        }
        if items_to_modify.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(subscription.modify_monitored_items(
            &mut self.scheduler,
            &self.limits,
            timestamps_to_return,
            items_to_modify,
        ))
    }

    pub fn set_monitoring_mode(
        &mut self,
        subscription_id: u32,
        monitoring_mode: MonitoringMode,
        monitored_item_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        if monitored_item_ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(subscription.set_monitoring_mode(&mut self.scheduler, monitoring_mode, monitored_item_ids))
    }

    pub fn delete_monitored_items(
        &mut self,
        subscription_id: u32,
        monitored_item_ids: &[u32],
    ) -> Result<Vec<StatusCode>, StatusCode> {
        if monitored_item_ids.is_empty() {
            return Err(StatusCode::BadNothingToDo);
        }
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(subscription.delete_monitored_items(&mut self.scheduler, monitored_item_ids))
    }

    /// Pushes a value to a monitored item outside of its sampling, e.g. when the value is known
    /// to have changed. Returns whether a notification was queued.
    pub fn notify_data_value(
        &mut self,
        handle: MonitoredItemHandle,
        value: DataValue,
    ) -> Result<bool, StatusCode> {
        self.subscriptions
            .get_mut(&handle.subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .notify_data_value(handle.monitored_item_id, value)
    }

    /// Pushes an event to an event monitored item. Returns whether a notification was queued.
    pub fn notify_event(
        &mut self,
        handle: MonitoredItemHandle,
        event_fields: Vec<Variant>,
    ) -> Result<bool, StatusCode> {
        self.subscriptions
            .get_mut(&handle.subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .notify_event(handle.monitored_item_id, event_fields)
    }

    /// Places a new publish request onto the queue of publish requests.
    ///
    /// Acknowledgements in the request are processed first, their results travel with the
    /// response that eventually answers the request. If the queue is full the oldest request is
    /// failed with `BadTooManyPublishRequests` to make room. Status changes of expired
    /// subscriptions go out first, then late subscriptions get a chance to send straight away.
    pub fn enqueue_publish_request(
        &mut self,
        now: &DateTime,
        request_id: u32,
        request: PublishRequest,
    ) {
        let results = self.process_subscription_acknowledgements(&request);

        while self.reached_publish_request_limit() {
            error!(
                "Too many publish requests {} for capacity {}, failing the oldest",
                self.publish_queues.request_queue_len(),
                self.max_publish_requests()
            );
            if !self
                .publish_queues
                .fail_oldest_request(StatusCode::BadTooManyPublishRequests)
            {
                break;
            }
        }
        self.publish_queues.push_request(PublishRequestEntry {
            request_id,
            request,
            results,
        });

        self.send_status_changes(now);
        if self.subscriptions.is_empty() {
            self.answer_publish_requests_no_subscription();
        } else {
            self.tick_late_subscriptions(now);
        }
    }

    fn process_subscription_acknowledgements(
        &mut self,
        request: &PublishRequest,
    ) -> Option<Vec<StatusCode>> {
        let acknowledgements = request.subscription_acknowledgements.as_ref()?;
        Some(
            acknowledgements
                .iter()
                .map(|ack| {
                    match self.acknowledge(ack.subscription_id, ack.sequence_number) {
                        Ok(()) => StatusCode::Good,
                        Err(status_code) => {
                            debug!(
                                "Cannot acknowledge sequence number {} of subscription {}, {}",
                                ack.sequence_number, ack.subscription_id, status_code
                            );
                            status_code
                        }
                    }
                })
                .collect(),
        )
    }

    /// Acknowledges a sent message, removing it from its subscription's retransmission queue
    pub fn acknowledge(
        &mut self,
        subscription_id: u32,
        sequence_number: u32,
    ) -> Result<(), StatusCode> {
        self.subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?
            .remove_retransmission_message(sequence_number)
    }

    /// Handles a RepublishRequest
    pub fn republish(&mut self, request: &RepublishRequest) -> Result<RepublishResponse, StatusCode> {
        let subscription = self
            .subscriptions
            .get_mut(&request.subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let notification_message =
            subscription.find_notification_message(request.retransmit_sequence_number)?;
        subscription.reset_lifetime_counter();
        Ok(RepublishResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            notification_message,
        })
    }

    /// Answers every outstanding publish request with `BadNoSubscription`
    pub fn answer_publish_requests_no_subscription(&mut self) -> usize {
        let answered = self
            .publish_queues
            .fail_all_requests(StatusCode::BadNoSubscription);
        if answered > 0 {
            debug!(
                "Answered {} publish requests, the session has no subscriptions",
                answered
            );
        }
        answered
    }

    /// Responses that are ready to go to the client, oldest first
    pub fn take_publish_responses(&mut self) -> Vec<PublishResponseEntry> {
        self.publish_queues.take_responses()
    }

    /// Runs a scheduler callback. Returns the id of the subscription if the callback made it
    /// expire. Firings of callbacks that have since been unregistered are ignored.
    pub fn run_callback(
        &mut self,
        now: &DateTime,
        target: CallbackTarget,
        sampler: &mut dyn Sampler,
    ) -> Option<u32> {
        match target {
            CallbackTarget::Sample(handle) => {
                self.sample(handle, sampler);
                None
            }
            CallbackTarget::Publish(subscription_id) => {
                self.tick_subscription(now, subscription_id, TickReason::TickTimerFired)
            }
        }
    }

    fn sample(&mut self, handle: MonitoredItemHandle, sampler: &mut dyn Sampler) {
        let Some(subscription) = self.subscriptions.get_mut(&handle.subscription_id) else {
            trace!("Ignoring sample of deleted subscription {:?}", handle);
            return;
        };
        if !subscription.is_sampling(handle.monitored_item_id) {
            trace!("Ignoring sample of monitored item {:?}", handle);
            return;
        }
        let value = subscription
            .monitored_item(handle.monitored_item_id)
            .and_then(|item| sampler.sample(item.item_to_monitor()));
        if let Some(value) = value {
            if let Err(status_code) = subscription.notify_data_value(handle.monitored_item_id, value)
            {
                error!("Cannot queue sample of {:?}, {}", handle, status_code);
            }
        }
    }

    fn tick_subscription(
        &mut self,
        now: &DateTime,
        subscription_id: u32,
        tick_reason: TickReason,
    ) -> Option<u32> {
        let subscription = self.subscriptions.get_mut(&subscription_id)?;
        match subscription.tick(now, tick_reason, &mut self.publish_queues) {
            TickResult::Expired => {
                self.expire_subscription(now, subscription_id);
                Some(subscription_id)
            }
            TickResult::Sent(_) | TickResult::None => None,
        }
    }

    /// Late subscriptions are ticked in order of priority, highest first, as long as there are
    /// publish requests for them.
    fn tick_late_subscriptions(&mut self, now: &DateTime) {
        let mut late: Vec<(u8, u32)> = self
            .subscriptions
            .values()
            .filter(|s| s.state() == SubscriptionState::Late)
            .map(|s| (s.priority(), s.id()))
            .collect();
        late.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for (_, subscription_id) in late {
            if !self.publish_queues.has_publish_request() {
                break;
            }
            let _ = self.tick_subscription(now, subscription_id, TickReason::ReceivePublishRequest);
        }
    }

    /// Removes an expired subscription. The client learns of it through a `BadTimeout` status
    /// change sent with the next publish request.
    fn expire_subscription(&mut self, now: &DateTime, subscription_id: u32) {
        let Some(mut subscription) = self.subscriptions.remove(&subscription_id) else {
            return;
        };
        let message = subscription.status_change_message(now, StatusCode::BadTimeout);
        subscription.delete(&mut self.scheduler);
        self.status_changes.push_back((subscription_id, message));
        self.send_status_changes(now);
        let max_status_changes = self.max_status_changes();
        while self.status_changes.len() > max_status_changes {
            if let Some((subscription_id, _)) = self.status_changes.pop_front() {
                warn!(
                    "Too many status changes waiting for a publish request, dropping the one of subscription {}",
                    subscription_id
                );
            }
        }
        if self.subscriptions.is_empty() {
            self.answer_publish_requests_no_subscription();
        }
    }

    /// Status changes held for the client, at most one per subscription the session may have
    fn max_status_changes(&self) -> usize {
        if self.limits.max_subscriptions_per_session > 0 {
            self.limits.max_subscriptions_per_session
        } else {
            constants::MAX_SUBSCRIPTIONS_PER_SESSION
        }
    }

    fn send_status_changes(&mut self, now: &DateTime) {
        while !self.status_changes.is_empty() {
            let Some(request) = self.publish_queues.take_publish_request() else {
                break;
            };
            let Some((subscription_id, message)) = self.status_changes.pop_front() else {
                break;
            };
            debug!(
                "Sending status change {:?} of subscription {}",
                message.status_change_status(),
                subscription_id
            );
            let request_id = request.request_id;
            let response = request.into_response(now, subscription_id, None, false, message);
            self.publish_queues
                .send_publish_response(request_id, response.into());
        }
    }

    pub fn metrics(&self) -> SessionSubscriptionsMetrics {
        let mut subscriptions: Vec<SubscriptionMetrics> =
            self.subscriptions.values().map(|s| s.metrics()).collect();
        subscriptions.sort_by_key(|s| s.id);
        SessionSubscriptionsMetrics {
            subscriptions,
            pending_publish_requests: self.publish_queues.request_queue_len(),
            pending_publish_responses: self.publish_queues.response_queue_len(),
            pending_status_changes: self.status_changes.len(),
        }
    }

    /// Takes the requested values passed in a create / modify and returns revised values that
    /// conform to the server's limits, as publishing interval, keep alive count and lifetime count.
    fn revise_subscription_values(
        &self,
        requested_publishing_interval: f64,
        requested_max_keep_alive_count: u32,
        requested_lifetime_count: u32,
    ) -> (f64, u32, u32) {
        let revised_publishing_interval = if requested_publishing_interval.is_finite()
            && requested_publishing_interval >= self.limits.min_publishing_interval_ms
        {
            requested_publishing_interval
        } else {
            self.limits.min_publishing_interval_ms
        };
        let revised_max_keep_alive_count = if requested_max_keep_alive_count == 0 {
            self.limits.default_keep_alive_count
        } else {
            requested_max_keep_alive_count.min(self.limits.max_keep_alive_count)
        };
        // Lifetime count must be at least three times the keep alive count
        let min_lifetime_count = revised_max_keep_alive_count.saturating_mul(3);
        let revised_lifetime_count = requested_lifetime_count
            .max(min_lifetime_count)
            .min(self.limits.max_lifetime_count.max(min_lifetime_count));
        (
            revised_publishing_interval,
            revised_max_keep_alive_count,
            revised_lifetime_count,
        )
    }

    fn revise_max_notifications_per_publish(&self, requested: u32) -> usize {
        let max = self.limits.max_notifications_per_publish as usize;
        if max > 0 && (requested == 0 || requested as usize > max) {
            max
        } else {
            requested as usize
        }
    }
}

impl SessionSubscriptions<TickScheduler> {
    /// Moves the scheduler forward and runs every callback that fell due. Returns the ids of the
    /// subscriptions that expired.
    pub fn advance(&mut self, elapsed_ms: u64, sampler: &mut dyn Sampler) -> Vec<u32> {
        let now = DateTime::now();
        self.scheduler
            .advance(elapsed_ms)
            .into_iter()
            .filter_map(|target| self.run_callback(&now, target, sampler))
            .collect()
    }
}
