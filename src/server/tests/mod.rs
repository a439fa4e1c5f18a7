use crate::{prelude::*, server::constants, supported_message_as};

mod monitored_item;
mod subscription;

fn no_samples(_: &ReadValueId) -> Option<DataValue> {
    None
}

fn make_session() -> SessionSubscriptions<TickScheduler> {
    SessionSubscriptions::new(SubscriptionLimits::default(), TickScheduler::new())
}

fn create_subscription_request(
    keep_alive_count: u32,
    lifetime_count: u32,
    max_notifications_per_publish: u32,
    publishing_enabled: bool,
    priority: u8,
) -> CreateSubscriptionRequest {
    CreateSubscriptionRequest {
        request_header: RequestHeader::new(1),
        requested_publishing_interval: 100f64,
        requested_lifetime_count: lifetime_count,
        requested_max_keep_alive_count: keep_alive_count,
        max_notifications_per_publish,
        publishing_enabled,
        priority,
    }
}

fn create_subscription(
    session: &mut SessionSubscriptions<TickScheduler>,
    keep_alive_count: u32,
    max_notifications_per_publish: u32,
) -> u32 {
    session
        .create_subscription(&create_subscription_request(
            keep_alive_count,
            keep_alive_count * 3,
            max_notifications_per_publish,
            true,
            0,
        ))
        .unwrap()
        .subscription_id
}

fn create_item(
    session: &mut SessionSubscriptions<TickScheduler>,
    subscription_id: u32,
    name: &str,
    queue_size: u32,
    discard_oldest: bool,
) -> MonitoredItemHandle {
    let request = MonitoredItemCreateRequest::new(
        NodeId::new(2, name).into(),
        MonitoringMode::Reporting,
        MonitoringParameters {
            client_handle: 100,
            sampling_interval: 100f64,
            filter: None,
            queue_size,
            discard_oldest,
        },
    );
    let results = session
        .create_monitored_items(subscription_id, TimestampsToReturn::Both, &[request])
        .unwrap();
    assert_eq!(results[0].status_code, StatusCode::Good);
    MonitoredItemHandle {
        subscription_id,
        monitored_item_id: results[0].monitored_item_id,
    }
}

fn publish_request(
    session: &mut SessionSubscriptions<TickScheduler>,
    request_id: u32,
    acks: Option<Vec<SubscriptionAcknowledgement>>,
) {
    session.enqueue_publish_request(
        &DateTime::now(),
        request_id,
        PublishRequest {
            request_header: RequestHeader::new(request_id),
            subscription_acknowledgements: acks,
        },
    );
}

fn publish_responses(session: &mut SessionSubscriptions<TickScheduler>) -> Vec<PublishResponse> {
    session
        .take_publish_responses()
        .into_iter()
        .map(|r| supported_message_as!(r.response, PublishResponse))
        .collect()
}

/// Runs one publishing interval, with no sampled values
fn tick(session: &mut SessionSubscriptions<TickScheduler>) -> Vec<u32> {
    session.advance(100, &mut no_samples)
}

/// Every queued notification is held by exactly one monitored item and the ready count matches
/// the notifications of reporting items.
fn assert_queues_consistent(subscription: &Subscription) {
    let mut held = 0;
    let mut ready = 0;
    for item in subscription.monitored_items() {
        assert!(item.queue_len() <= item.queue_size());
        for key in item.queued_keys() {
            let queued = subscription.notifications().get(key).unwrap();
            assert_eq!(queued.monitored_item_id, item.id());
        }
        assert_eq!(
            subscription.notifications().count_for(item.id()),
            item.queue_len()
        );
        held += item.queue_len();
        if item.is_reporting() {
            ready += item.queue_len();
        }
    }
    assert_eq!(subscription.notification_queue_len(), held);
    assert_eq!(subscription.ready_notifications(), ready);
}
