/// Limits on the subscriptions of a session and on the monitored items they contain.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionLimits {
    /// Maximum number of subscriptions per session, 0 for no limit
    #[serde(default = "defaults::max_subscriptions_per_session")]
    pub max_subscriptions_per_session: usize,
    #[serde(default = "defaults::max_pending_publish_requests")]
    pub max_pending_publish_requests: usize,
    #[serde(default = "defaults::max_publish_requests_per_subscription")]
    pub max_publish_requests_per_subscription: usize,
    /// Specifies the minimum sampling interval for this server in milliseconds.
    #[serde(default = "defaults::min_sampling_interval_ms")]
    pub min_sampling_interval_ms: f64,
    /// Specifies the minimum publishing interval for this server in milliseconds.
    #[serde(default = "defaults::min_publishing_interval_ms")]
    pub min_publishing_interval_ms: f64,
    #[serde(default = "defaults::max_keep_alive_count")]
    pub max_keep_alive_count: u32,
    #[serde(default = "defaults::default_keep_alive_count")]
    pub default_keep_alive_count: u32,
    /// Maximum number of monitored items per subscription, 0 for no limit
    #[serde(default = "defaults::max_monitored_items_per_sub")]
    pub max_monitored_items_per_sub: usize,
    /// Maximum number of values in a monitored item queue
    #[serde(default = "defaults::max_monitored_item_queue_size")]
    pub max_monitored_item_queue_size: usize,
    /// Maximum lifetime count (3 times as large as max keep alive)
    #[serde(default = "defaults::max_lifetime_count")]
    pub max_lifetime_count: u32,
    /// Maximum number of notifications per publish message, 0 for no limit
    #[serde(default = "defaults::max_notifications_per_publish")]
    pub max_notifications_per_publish: u64,
    /// Maximum number of sent but unacknowledged messages per subscription, at least 1
    #[serde(default = "defaults::max_retransmission_queue_size")]
    pub max_retransmission_queue_size: usize,
}

impl Default for SubscriptionLimits {
    fn default() -> Self {
        Self {
            max_subscriptions_per_session: defaults::max_subscriptions_per_session(),
            max_pending_publish_requests: defaults::max_pending_publish_requests(),
            max_publish_requests_per_subscription: defaults::max_publish_requests_per_subscription(
            ),
            min_sampling_interval_ms: defaults::min_sampling_interval_ms(),
            min_publishing_interval_ms: defaults::min_publishing_interval_ms(),
            max_keep_alive_count: defaults::max_keep_alive_count(),
            default_keep_alive_count: defaults::default_keep_alive_count(),
            max_monitored_items_per_sub: defaults::max_monitored_items_per_sub(),
            max_monitored_item_queue_size: defaults::max_monitored_item_queue_size(),
            max_lifetime_count: defaults::max_lifetime_count(),
            max_notifications_per_publish: defaults::max_notifications_per_publish(),
            max_retransmission_queue_size: defaults::max_retransmission_queue_size(),
        }
    }
}

impl SubscriptionLimits {
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if !(self.min_sampling_interval_ms.is_finite() && self.min_sampling_interval_ms > 0.0) {
            error!(
                "min_sampling_interval_ms {} must be a positive number",
                self.min_sampling_interval_ms
            );
            valid = false;
        }
        if !(self.min_publishing_interval_ms.is_finite() && self.min_publishing_interval_ms > 0.0)
        {
            error!(
                "min_publishing_interval_ms {} must be a positive number",
                self.min_publishing_interval_ms
            );
            valid = false;
        }
        if self.max_monitored_item_queue_size == 0 {
            error!("max_monitored_item_queue_size must be at least 1");
            valid = false;
        }
        if self.max_pending_publish_requests == 0 || self.max_publish_requests_per_subscription == 0
        {
            error!("publish request limits must be at least 1");
            valid = false;
        }
        if self.default_keep_alive_count == 0
            || self.default_keep_alive_count > self.max_keep_alive_count
        {
            error!(
                "default_keep_alive_count {} must be between 1 and max_keep_alive_count {}",
                self.default_keep_alive_count, self.max_keep_alive_count
            );
            valid = false;
        }
        if self.max_retransmission_queue_size == 0 {
            error!("max_retransmission_queue_size must be at least 1");
            valid = false;
        }
        if self.max_lifetime_count < self.max_keep_alive_count.saturating_mul(3) {
            error!(
                "max_lifetime_count {} must be at least 3 times max_keep_alive_count {}",
                self.max_lifetime_count, self.max_keep_alive_count
            );
            valid = false;
        }
        valid
    }
}

mod defaults {
    use crate::server::constants;

    pub fn max_subscriptions_per_session() -> usize {
        constants::MAX_SUBSCRIPTIONS_PER_SESSION
    }
    pub fn max_pending_publish_requests() -> usize {
        constants::MAX_PENDING_PUBLISH_REQUESTS
    }
    pub fn max_publish_requests_per_subscription() -> usize {
        constants::MAX_PUBLISH_REQUESTS_PER_SUBSCRIPTION
    }
    pub fn min_sampling_interval_ms() -> f64 {
        constants::MIN_SAMPLING_INTERVAL_MS
    }
    pub fn min_publishing_interval_ms() -> f64 {
        constants::MIN_PUBLISHING_INTERVAL_MS
    }
    pub fn max_keep_alive_count() -> u32 {
        constants::MAX_KEEP_ALIVE_COUNT
    }
    pub fn default_keep_alive_count() -> u32 {
        constants::DEFAULT_KEEP_ALIVE_COUNT
    }
    pub fn max_monitored_items_per_sub() -> usize {
        constants::DEFAULT_MAX_MONITORED_ITEMS_PER_SUB
    }
    pub fn max_monitored_item_queue_size() -> usize {
        constants::MAX_DATA_CHANGE_QUEUE_SIZE
    }
    pub fn max_lifetime_count() -> u32 {
        constants::MAX_KEEP_ALIVE_COUNT * 3
    }
    pub fn max_notifications_per_publish() -> u64 {
        constants::MAX_NOTIFICATIONS_PER_PUBLISH
    }
    pub fn max_retransmission_queue_size() -> usize {
        constants::MAX_RETRANSMISSION_QUEUE_SIZE
    }
}
