// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The server side subscription engine.
//!
//! A [`subscriptions::session_subscriptions::SessionSubscriptions`] holds the subscriptions
//! of one session together with its queue of outstanding publish requests. Sampling and
//! publishing are driven by callbacks registered with a [`scheduler::Scheduler`], which the
//! caller dispatches back through `SessionSubscriptions::run_callback`.

pub mod config;
pub mod scheduler;
pub mod subscriptions;

#[cfg(test)]
mod tests;

/// Contains the most common things that should be imported by a user of the engine.
pub mod prelude {
    pub use super::{
        config::{limits::SubscriptionLimits, SubscriptionConfig},
        scheduler::{CallbackId, CallbackTarget, Scheduler, TickScheduler},
        subscriptions::{
            monitored_item::{MonitoredItem, MonitoredItemKind},
            notification::{Notification, NotificationKey, NotificationQueue},
            session_subscriptions::{SessionSubscriptions, SessionSubscriptionsMetrics},
            subscription::{
                MonitoredItemHandle, Subscription, SubscriptionMetrics, SubscriptionState,
                TickReason, TickResult,
            },
            PublishQueues, PublishRequestEntry, PublishResponseEntry, PublishTransport, Sampler,
        },
    };
    pub use crate::core::prelude::*;
}

/// Server constants that bound the subscription engine. They are the defaults of
/// [`config::limits::SubscriptionLimits`].
pub mod constants {
    /// Rate at which a session should advance its scheduler when driven by a timer
    pub const SUBSCRIPTION_TIMER_RATE_MS: u64 = 100;
    /// Minimum publishing interval for subscriptions
    pub const MIN_PUBLISHING_INTERVAL_MS: f64 = 100.0;
    /// Minimum sampling interval on monitored items
    pub const MIN_SAMPLING_INTERVAL_MS: f64 = 100.0;
    /// Maximum data change queue allowed by clients on monitored items
    pub const MAX_DATA_CHANGE_QUEUE_SIZE: usize = 10;
    /// Default keep alive count
    pub const DEFAULT_KEEP_ALIVE_COUNT: u32 = 10;
    /// Maximum keep alive count
    pub const MAX_KEEP_ALIVE_COUNT: u32 = 30000;
    /// Maximum number of subscriptions in a session, 0 for no limit
    pub const MAX_SUBSCRIPTIONS_PER_SESSION: usize = 10;
    /// Maximum number of outstanding publish requests in a session
    pub const MAX_PENDING_PUBLISH_REQUESTS: usize = 20;
    /// Maximum number of publish requests per subscription
    pub const MAX_PUBLISH_REQUESTS_PER_SUBSCRIPTION: usize = 4;
    /// Default maximum number of monitored items per subscription, 0 for no limit
    pub const DEFAULT_MAX_MONITORED_ITEMS_PER_SUB: usize = 1000;
    /// Maximum number of notifications per publish, 0 for no limit
    pub const MAX_NOTIFICATIONS_PER_PUBLISH: u64 = 0;
    /// Maximum number of unacknowledged messages a subscription keeps for republishing
    pub const MAX_RETRANSMISSION_QUEUE_SIZE: usize = MAX_PUBLISH_REQUESTS_PER_SUBSCRIPTION * 2;
}
