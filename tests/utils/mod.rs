#![allow(dead_code)]

use opcua_subscriptions::{prelude::*, supported_message_as};

pub fn no_samples(_: &ReadValueId) -> Option<DataValue> {
    None
}

pub fn new_session() -> SessionSubscriptions<TickScheduler> {
    SessionSubscriptions::new(SubscriptionLimits::default(), TickScheduler::new())
}

pub fn create_subscription(
    session: &mut SessionSubscriptions<TickScheduler>,
    keep_alive_count: u32,
    max_notifications_per_publish: u32,
) -> u32 {
    session
        .create_subscription(&CreateSubscriptionRequest {
            request_header: RequestHeader::new(1),
            requested_publishing_interval: 100f64,
            requested_lifetime_count: keep_alive_count * 10,
            requested_max_keep_alive_count: keep_alive_count,
            max_notifications_per_publish,
            publishing_enabled: true,
            priority: 0,
        })
        .unwrap()
        .subscription_id
}

pub fn create_item(
    session: &mut SessionSubscriptions<TickScheduler>,
    subscription_id: u32,
    node: &str,
    queue_size: u32,
    discard_oldest: bool,
) -> MonitoredItemHandle {
    let request = MonitoredItemCreateRequest::new(
        NodeId::new(2, node).into(),
        MonitoringMode::Reporting,
        MonitoringParameters {
            client_handle: 1,
            sampling_interval: -1f64,
            filter: None,
            queue_size,
            discard_oldest,
        },
    );
    let result = session
        .create_monitored_items(subscription_id, TimestampsToReturn::Both, &[request])
        .unwrap()
        .remove(0);
    assert_eq!(result.status_code, StatusCode::Good);
    assert_eq!(result.revised_queue_size, queue_size);
    MonitoredItemHandle {
        subscription_id,
        monitored_item_id: result.monitored_item_id,
    }
}

pub fn publish(
    session: &mut SessionSubscriptions<TickScheduler>,
    request_id: u32,
    acks: &[(u32, u32)],
) {
    let subscription_acknowledgements = if acks.is_empty() {
        None
    } else {
        Some(
            acks.iter()
                .map(|(subscription_id, sequence_number)| SubscriptionAcknowledgement {
                    subscription_id: *subscription_id,
                    sequence_number: *sequence_number,
                })
                .collect(),
        )
    };
    session.enqueue_publish_request(
        &DateTime::now(),
        request_id,
        PublishRequest {
            request_header: RequestHeader::new(request_id),
            subscription_acknowledgements,
        },
    );
}

/// Takes the pending responses, which must all be publish responses
pub fn publish_responses(session: &mut SessionSubscriptions<TickScheduler>) -> Vec<PublishResponse> {
    session
        .take_publish_responses()
        .into_iter()
        .map(|r| supported_message_as!(r.response, PublishResponse))
        .collect()
}

/// Runs one publishing interval
pub fn tick(session: &mut SessionSubscriptions<TickScheduler>) -> Vec<u32> {
    session.advance(100, &mut no_samples)
}
