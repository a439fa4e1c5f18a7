use std::collections::VecDeque;

use crate::{
    server::{
        config::limits::SubscriptionLimits,
        scheduler::{CallbackId, CallbackTarget, Scheduler},
    },
    types::{
        AttributeId, DataChangeFilter, DataValue, EventFieldList, MonitoredItemCreateRequest,
        MonitoredItemModifyRequest, MonitoredItemNotification, MonitoringMode, MonitoringParameters,
        ReadValueId, StatusCode, TimestampsToReturn, Variant,
    },
};

use super::{
    notification::{Notification, NotificationKey, NotificationQueue},
    subscription::MonitoredItemHandle,
};

/// Whether a monitored item samples an attribute value or receives events.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MonitoredItemKind {
    DataChange,
    Event,
}

/// Takes the requested sampling interval value supplied by client and ensures it is within
/// the range supported by the server. A negative interval means the publishing interval of the
/// subscription.
fn sanitize_sampling_interval(
    limits: &SubscriptionLimits,
    requested_sampling_interval: f64,
    publishing_interval: f64,
) -> Result<f64, StatusCode> {
    if !requested_sampling_interval.is_finite() {
        error!(
            "Sampling interval {} is not a number",
            requested_sampling_interval
        );
        return Err(StatusCode::BadInvalidArgument);
    }
    let sampling_interval = if requested_sampling_interval < 0.0 {
        publishing_interval
    } else {
        requested_sampling_interval
    };
    Ok(sampling_interval.max(limits.min_sampling_interval_ms))
}

/// Takes the requested queue size and ensures it is within the range supported by the server
fn sanitize_queue_size(limits: &SubscriptionLimits, requested_queue_size: u32) -> usize {
    (requested_queue_size as usize).clamp(1, limits.max_monitored_item_queue_size.max(1))
}

/// The revised parameters of a monitored item about to be created.
#[derive(Debug, Clone)]
pub struct CreateMonitoredItem {
    id: u32,
    item_to_monitor: ReadValueId,
    kind: MonitoredItemKind,
    monitoring_mode: MonitoringMode,
    client_handle: u32,
    discard_oldest: bool,
    queue_size: usize,
    sampling_interval: f64,
    filter: DataChangeFilter,
    timestamps_to_return: TimestampsToReturn,
}

impl CreateMonitoredItem {
    pub fn new(
        req: &MonitoredItemCreateRequest,
        id: u32,
        limits: &SubscriptionLimits,
        publishing_interval: f64,
        timestamps_to_return: TimestampsToReturn,
    ) -> Result<Self, StatusCode> {
        if AttributeId::from_u32(req.item_to_monitor.attribute_id).is_err() {
            return Err(StatusCode::BadAttributeIdInvalid);
        }
        let params = &req.requested_parameters;
        let sampling_interval =
            sanitize_sampling_interval(limits, params.sampling_interval, publishing_interval)?;
        let kind = if req.item_to_monitor.is_event_notifier() {
            MonitoredItemKind::Event
        } else {
            MonitoredItemKind::DataChange
        };
        Ok(Self {
            id,
            item_to_monitor: req.item_to_monitor.clone(),
            kind,
            monitoring_mode: req.monitoring_mode,
            client_handle: params.client_handle,
            discard_oldest: params.discard_oldest,
            queue_size: sanitize_queue_size(limits, params.queue_size),
            sampling_interval,
            filter: params.filter.clone().unwrap_or_default(),
            timestamps_to_return,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size
    }
}

#[derive(Debug)]
pub struct MonitoredItem {
    id: u32,
    item_to_monitor: ReadValueId,
    kind: MonitoredItemKind,
    monitoring_mode: MonitoringMode,
    client_handle: u32,
    sampling_interval: f64,
    filter: DataChangeFilter,
    discard_oldest: bool,
    queue_size: usize,
    /// Keys of this item's notifications in the subscription queue, oldest first
    queue: VecDeque<NotificationKey>,
    queue_overflow: bool,
    timestamps_to_return: TimestampsToReturn,
    last_data_value: Option<DataValue>,
    /// Present while sampling is registered with the scheduler
    sample_callback: Option<CallbackId>,
}

impl MonitoredItem {
    pub fn new(request: &CreateMonitoredItem) -> Self {
        Self {
            id: request.id,
            item_to_monitor: request.item_to_monitor.clone(),
            kind: request.kind,
            monitoring_mode: request.monitoring_mode,
            client_handle: request.client_handle,
            sampling_interval: request.sampling_interval,
            filter: request.filter.clone(),
            discard_oldest: request.discard_oldest,
            queue_size: request.queue_size,
            queue: VecDeque::with_capacity(request.queue_size),
            queue_overflow: false,
            timestamps_to_return: request.timestamps_to_return,
            last_data_value: None,
            sample_callback: None,
        }
    }

    /// Validates and applies a modify request. Nothing changes when it fails, including the
    /// sampling callback, which moves to the new interval only once the scheduler accepted it.
    /// The caller trims the queue if it shrank.
    pub(super) fn modify(
        &mut self,
        limits: &SubscriptionLimits,
        publishing_interval: f64,
        timestamps_to_return: TimestampsToReturn,
        request: &MonitoredItemModifyRequest,
        handle: MonitoredItemHandle,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), StatusCode> {
        let params: &MonitoringParameters = &request.requested_parameters;
        let sampling_interval =
            sanitize_sampling_interval(limits, params.sampling_interval, publishing_interval)?;
        if sampling_interval != self.sampling_interval && self.sample_callback.is_some() {
            let callback_id =
                scheduler.register(CallbackTarget::Sample(handle), sampling_interval)?;
            if let Some(old) = self.sample_callback.replace(callback_id) {
                scheduler.unregister(old);
            }
            debug!(
                "Monitored item {} sampling every {}ms",
                self.id, sampling_interval
            );
        }
        self.sampling_interval = sampling_interval;
        self.queue_size = sanitize_queue_size(limits, params.queue_size);
        self.client_handle = params.client_handle;
        self.discard_oldest = params.discard_oldest;
        self.filter = params.filter.clone().unwrap_or_default();
        self.timestamps_to_return = timestamps_to_return;
        Ok(())
    }

    /// Registers the sampling callback if it is not registered already. Event items are not
    /// sampled, their events are pushed to them.
    pub(super) fn register_sampling(
        &mut self,
        handle: MonitoredItemHandle,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), StatusCode> {
        if self.sample_callback.is_some() || self.kind == MonitoredItemKind::Event {
            return Ok(());
        }
        if !self.sampling_interval.is_finite() || self.sampling_interval <= 0.0 {
            return Err(StatusCode::BadInvalidArgument);
        }
        let callback_id = scheduler.register(CallbackTarget::Sample(handle), self.sampling_interval)?;
        debug!(
            "Monitored item {} sampling every {}ms",
            self.id, self.sampling_interval
        );
        self.sample_callback = Some(callback_id);
        Ok(())
    }

    /// Unregisters the sampling callback if it is registered.
    pub(super) fn unregister_sampling(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(callback_id) = self.sample_callback.take() {
            debug!("Monitored item {} stopped sampling", self.id);
            scheduler.unregister(callback_id);
        }
    }

    pub(super) fn set_monitoring_mode(&mut self, monitoring_mode: MonitoringMode) {
        self.monitoring_mode = monitoring_mode;
        if monitoring_mode == MonitoringMode::Disabled {
            // A re-enabled item reports its first sample whatever the value
            self.last_data_value = None;
        }
    }

    /// Turns a sampled value into a notification if it differs from the last sampled value
    /// according to the item's trigger. The value is stripped of the timestamps the client
    /// does not want.
    pub(super) fn data_change(&mut self, mut value: DataValue) -> Option<Notification> {
        if self.monitoring_mode == MonitoringMode::Disabled
            || self.kind != MonitoredItemKind::DataChange
        {
            return None;
        }

        let data_change = match &self.last_data_value {
            Some(last_dv) => !self.filter.compare(&value, last_dv),
            None => true,
        };
        if !data_change {
            trace!("Monitored item {} value has not changed", self.id);
            return None;
        }

        self.last_data_value = Some(value.clone());

        match self.timestamps_to_return {
            TimestampsToReturn::Neither | TimestampsToReturn::Invalid => {
                value.source_timestamp = None;
                value.source_picoseconds = None;
                value.server_timestamp = None;
                value.server_picoseconds = None
            }
            TimestampsToReturn::Server => {
                value.source_timestamp = None;
                value.source_picoseconds = None;
            }
            TimestampsToReturn::Source => {
                value.server_timestamp = None;
                value.server_picoseconds = None
            }
            TimestampsToReturn::Both => {}
        }

        Some(
            MonitoredItemNotification {
                client_handle: self.client_handle,
                value,
            }
            .into(),
        )
    }

    pub(super) fn event(&self, event_fields: Vec<Variant>) -> Option<Notification> {
        if self.monitoring_mode == MonitoringMode::Disabled
            || self.kind != MonitoredItemKind::Event
        {
            return None;
        }
        Some(
            EventFieldList {
                client_handle: self.client_handle,
                event_fields: Some(event_fields),
            }
            .into(),
        )
    }

    /// Appends a notification to this item's queue and the subscription queue, then evicts
    /// whatever no longer fits.
    pub(super) fn enqueue_notification(
        &mut self,
        notification: Notification,
        queue: &mut NotificationQueue,
    ) -> NotificationKey {
        let key = queue.push(self.id, notification, self.is_reporting());
        self.queue.push_back(key);
        self.ensure_queue_space(queue);
        key
    }

    /// Evicts notifications until the queue fits the queue size. With discard oldest the
    /// oldest entries go and the overflow bit is set on the oldest one kept, otherwise the
    /// newest entries go and the bit is set on the newest one kept. A queue of size 1 simply
    /// holds the latest value and never reports an overflow.
    pub(super) fn ensure_queue_space(&mut self, queue: &mut NotificationQueue) -> usize {
        let reporting = self.is_reporting();
        let mut evicted = 0;
        while self.queue.len() > self.queue_size {
            let key = if self.discard_oldest {
                self.queue.pop_front()
            } else {
                self.queue.pop_back()
            };
            let Some(key) = key else {
                break;
            };
            if queue.remove(key, reporting).is_none() {
                error!(
                    "Monitored item {} queued a notification its subscription does not hold",
                    self.id
                );
            }
            evicted += 1;
        }

        if evicted > 0 {
            self.queue_overflow = true;
            let keep = if self.discard_oldest {
                self.queue.front()
            } else {
                self.queue.back()
            };
            if self.queue_size > 1 {
                if let Some(entry) = keep.and_then(|key| queue.get_mut(*key)) {
                    entry.notification.set_overflow();
                }
            }
            debug!(
                "Monitored item {} queue overflowed, discarded {} notification(s)",
                self.id, evicted
            );
        }
        evicted
    }

    /// Removes a notification key, normally the oldest one, after it has been taken from the
    /// subscription queue.
    pub(super) fn remove_key(&mut self, key: NotificationKey) -> bool {
        if self.queue.front() == Some(&key) {
            self.queue.pop_front();
            true
        } else if let Some(idx) = self.queue.iter().position(|k| *k == key) {
            self.queue.remove(idx);
            true
        } else {
            false
        }
    }

    /// Removes every queued notification of this item from both queues.
    pub(super) fn release_notifications(&mut self, queue: &mut NotificationQueue) -> usize {
        let reporting = self.is_reporting();
        let released = self.queue.len();
        for key in self.queue.drain(..) {
            let _ = queue.remove(key, reporting);
        }
        self.queue_overflow = false;
        released
    }

    /// Unregisters sampling and releases the queued notifications. The item does not have to
    /// be held by its subscription any more.
    pub(super) fn delete(mut self, queue: &mut NotificationQueue, scheduler: &mut dyn Scheduler) {
        self.unregister_sampling(scheduler);
        let released = self.release_notifications(queue);
        debug!(
            "Deleted monitored item {}, released {} notification(s)",
            self.id, released
        );
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn item_to_monitor(&self) -> &ReadValueId {
        &self.item_to_monitor
    }

    pub fn kind(&self) -> MonitoredItemKind {
        self.kind
    }

    pub fn monitoring_mode(&self) -> MonitoringMode {
        self.monitoring_mode
    }

    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    pub fn discard_oldest(&self) -> bool {
        self.discard_oldest
    }

    pub fn timestamps_to_return(&self) -> TimestampsToReturn {
        self.timestamps_to_return
    }

    /// Number of notifications currently queued
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Keys of the queued notifications, oldest first
    pub fn queued_keys(&self) -> impl Iterator<Item = NotificationKey> + '_ {
        self.queue.iter().copied()
    }

    /// Whether the queue has discarded notifications since it was last emptied
    pub fn queue_overflow(&self) -> bool {
        self.queue_overflow
    }

    pub fn last_data_value(&self) -> Option<&DataValue> {
        self.last_data_value.as_ref()
    }

    pub fn is_sampling_registered(&self) -> bool {
        self.sample_callback.is_some()
    }

    pub fn is_reporting(&self) -> bool {
        matches!(self.monitoring_mode, MonitoringMode::Reporting)
    }

    pub fn is_sampling(&self) -> bool {
        matches!(
            self.monitoring_mode,
            MonitoringMode::Reporting | MonitoringMode::Sampling
        )
    }
}
