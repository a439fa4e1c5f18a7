use super::*;

#[test]
fn revised_subscription_values() {
    let mut session = make_session();
    let mut request = create_subscription_request(0, 1, 0, true, 0);
    request.requested_publishing_interval = 10f64;
    let response = session.create_subscription(&request).unwrap();
    assert_eq!(response.subscription_id, 1);
    assert_eq!(
        response.revised_publishing_interval,
        constants::MIN_PUBLISHING_INTERVAL_MS
    );
    assert_eq!(
        response.revised_max_keep_alive_count,
        constants::DEFAULT_KEEP_ALIVE_COUNT
    );
    assert_eq!(
        response.revised_lifetime_count,
        constants::DEFAULT_KEEP_ALIVE_COUNT * 3
    );

    let mut request = create_subscription_request(u32::MAX, u32::MAX, 0, true, 0);
    request.requested_publishing_interval = f64::NAN;
    let response = session.create_subscription(&request).unwrap();
    assert_eq!(response.subscription_id, 2);
    assert_eq!(
        response.revised_publishing_interval,
        constants::MIN_PUBLISHING_INTERVAL_MS
    );
    assert_eq!(
        response.revised_max_keep_alive_count,
        constants::MAX_KEEP_ALIVE_COUNT
    );
    assert_eq!(
        response.revised_lifetime_count,
        constants::MAX_KEEP_ALIVE_COUNT * 3
    );
}

#[test]
fn too_many_subscriptions() {
    let mut limits = SubscriptionLimits::default();
    limits.max_subscriptions_per_session = 2;
    let mut session = SessionSubscriptions::new(limits, TickScheduler::new());
    let request = create_subscription_request(10, 30, 0, true, 0);
    assert!(session.create_subscription(&request).is_ok());
    assert!(session.create_subscription(&request).is_ok());
    assert_eq!(
        session.create_subscription(&request),
        Err(StatusCode::BadTooManySubscriptions)
    );
    session.delete_subscriptions(&[1]).unwrap();
    // Ids are never reused
    assert_eq!(session.create_subscription(&request).unwrap().subscription_id, 3);
}

#[test]
fn modify_subscription() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let response = session
        .modify_subscription(&ModifySubscriptionRequest {
            request_header: RequestHeader::new(2),
            subscription_id,
            requested_publishing_interval: 1000f64,
            requested_lifetime_count: 10,
            requested_max_keep_alive_count: 5,
            max_notifications_per_publish: 7,
            priority: 9,
        })
        .unwrap();
    assert_eq!(response.revised_publishing_interval, 1000f64);
    assert_eq!(response.revised_max_keep_alive_count, 5);
    assert_eq!(response.revised_lifetime_count, 15);

    let subscription = session.get(subscription_id).unwrap();
    assert_eq!(subscription.priority(), 9);
    assert_eq!(subscription.max_notifications_per_publish(), 7);
    assert_eq!(subscription.max_lifetime_count(), 15);

    // The publish callback follows the new interval
    assert!(tick(&mut session).is_empty());
    assert_eq!(
        session.get(subscription_id).unwrap().current_keep_alive_count(),
        0
    );
    session.advance(900, &mut no_samples);
    assert_eq!(
        session.get(subscription_id).unwrap().current_keep_alive_count(),
        1
    );

    let mut request = ModifySubscriptionRequest {
        request_header: RequestHeader::new(3),
        subscription_id: 99,
        requested_publishing_interval: 1000f64,
        requested_lifetime_count: 10,
        requested_max_keep_alive_count: 5,
        max_notifications_per_publish: 7,
        priority: 9,
    };
    assert_eq!(
        session.modify_subscription(&request),
        Err(StatusCode::BadSubscriptionIdInvalid)
    );
    request.subscription_id = subscription_id;
    assert!(session.modify_subscription(&request).is_ok());
}

#[test]
fn publishing_disabled_freezes_state() {
    let mut session = make_session();
    let subscription_id = session
        .create_subscription(&create_subscription_request(2, 300, 0, false, 0))
        .unwrap()
        .subscription_id;
    let h = create_item(&mut session, subscription_id, "v1", 5, true);
    session.notify_data_value(h, DataValue::new_now(1)).unwrap();

    // Notifications are ready but nothing is published, no request to go late over either
    for _ in 0..10 {
        tick(&mut session);
        assert_eq!(
            session.get(subscription_id).unwrap().state(),
            SubscriptionState::Normal
        );
    }

    // Keep alives are still sent, without a change of state
    publish_request(&mut session, 1, None);
    tick(&mut session);
    tick(&mut session);
    let responses = publish_responses(&mut session);
    assert_eq!(responses.len(), 1);
    assert!(responses[0].notification_message.is_keep_alive());
    let subscription = session.get(subscription_id).unwrap();
    assert_eq!(subscription.state(), SubscriptionState::Normal);
    assert_eq!(subscription.notification_queue_len(), 1);

    // Enabling publishing lets the notification out
    let response = session
        .set_publishing_mode(&SetPublishingModeRequest {
            request_header: RequestHeader::new(2),
            publishing_enabled: true,
            subscription_ids: Some(vec![subscription_id, 99]),
        })
        .unwrap();
    assert_eq!(
        response.results,
        Some(vec![StatusCode::Good, StatusCode::BadSubscriptionIdInvalid])
    );
    publish_request(&mut session, 2, None);
    tick(&mut session);
    let responses = publish_responses(&mut session);
    assert_eq!(responses[0].notification_message.notification_count(), 1);
    assert_eq!(
        session.get(subscription_id).unwrap().state(),
        SubscriptionState::Normal
    );

    assert_eq!(
        session.set_publishing_mode(&SetPublishingModeRequest {
            request_header: RequestHeader::new(3),
            publishing_enabled: true,
            subscription_ids: None,
        }),
        Err(StatusCode::BadNothingToDo)
    );
}

#[test]
fn keep_alive_once_per_threshold_crossing() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 3, 0);
    for request_id in 1..=4 {
        publish_request(&mut session, request_id, None);
    }
    let mut keep_alives = 0;
    let mut states = Vec::new();
    for n in 1..=12 {
        tick(&mut session);
        let responses = publish_responses(&mut session);
        if n % 3 == 0 {
            assert_eq!(responses.len(), 1);
            assert!(responses[0].notification_message.is_keep_alive());
            keep_alives += 1;
        } else {
            assert!(responses.is_empty());
        }
        states.push(session.get(subscription_id).unwrap().state());
    }
    assert_eq!(keep_alives, 4);
    assert_eq!(states[1], SubscriptionState::Normal);
    assert!(states[2..].iter().all(|s| *s == SubscriptionState::KeepAlive));
    assert_eq!(session.get(subscription_id).unwrap().last_sequence_number(), 0);
}

#[test]
fn sequence_numbers_wrap_around() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let h = create_item(&mut session, subscription_id, "v1", 1, true);
    session
        .get_mut(subscription_id)
        .unwrap()
        .set_next_sequence_number(u32::MAX - 1);

    let mut sequence_numbers = Vec::new();
    for v in 0..4 {
        session.notify_data_value(h, DataValue::new_now(v)).unwrap();
        publish_request(&mut session, v as u32, None);
        tick(&mut session);
        let responses = publish_responses(&mut session);
        sequence_numbers.push(responses[0].notification_message.sequence_number);
    }
    assert_eq!(sequence_numbers, vec![u32::MAX - 1, u32::MAX, 1, 2]);
}

#[test]
fn late_subscriptions_served_by_priority() {
    let mut session = make_session();
    let low = session
        .create_subscription(&create_subscription_request(10, 30, 0, true, 1))
        .unwrap()
        .subscription_id;
    let high = session
        .create_subscription(&create_subscription_request(10, 30, 0, true, 200))
        .unwrap()
        .subscription_id;
    let h_low = create_item(&mut session, low, "v1", 1, true);
    let h_high = create_item(&mut session, high, "v1", 1, true);
    session.notify_data_value(h_low, DataValue::new_now(1)).unwrap();
    session.notify_data_value(h_high, DataValue::new_now(1)).unwrap();

    tick(&mut session);
    assert_eq!(session.get(low).unwrap().state(), SubscriptionState::Late);
    assert_eq!(session.get(high).unwrap().state(), SubscriptionState::Late);

    publish_request(&mut session, 1, None);
    let responses = publish_responses(&mut session);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].subscription_id, high);
    assert_eq!(session.get(high).unwrap().state(), SubscriptionState::Normal);
    assert_eq!(session.get(low).unwrap().state(), SubscriptionState::Late);

    publish_request(&mut session, 2, None);
    let responses = publish_responses(&mut session);
    assert_eq!(responses[0].subscription_id, low);
    assert_eq!(session.publish_request_queue_len(), 0);
}

#[test]
fn expired_subscription_reports_timeout() {
    let mut session = make_session();
    let subscription_id = session
        .create_subscription(&create_subscription_request(1, 3, 0, true, 0))
        .unwrap()
        .subscription_id;
    let other = create_subscription(&mut session, 100, 0);
    create_item(&mut session, subscription_id, "v1", 1, true);

    // Late on the first interval, then three intervals without a publish request
    assert!(tick(&mut session).is_empty());
    assert_eq!(
        session.get(subscription_id).unwrap().state(),
        SubscriptionState::Late
    );
    assert!(tick(&mut session).is_empty());
    assert!(tick(&mut session).is_empty());
    assert_eq!(tick(&mut session), vec![subscription_id]);
    assert!(!session.contains(subscription_id));
    // Only the publish callback of the other subscription is left
    assert_eq!(session.scheduler().len(), 1);

    publish_request(&mut session, 1, None);
    let responses = publish_responses(&mut session);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].subscription_id, subscription_id);
    assert_eq!(
        responses[0].notification_message.status_change_status(),
        Some(StatusCode::BadTimeout)
    );
    assert_eq!(responses[0].notification_message.sequence_number, 1);
    assert!(session.contains(other));
}

#[test]
fn metrics_snapshot() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let h = create_item(&mut session, subscription_id, "v1", 5, true);
    session.notify_data_value(h, DataValue::new_now(1)).unwrap();
    session.notify_data_value(h, DataValue::new_now(2)).unwrap();
    publish_request(&mut session, 1, None);

    let metrics = session.metrics();
    assert_eq!(metrics.pending_publish_requests, 1);
    assert_eq!(metrics.subscriptions.len(), 1);
    assert_eq!(metrics.subscriptions[0].queued_notifications, 2);
    assert_eq!(metrics.subscriptions[0].ready_notifications, 2);

    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["subscriptions"][0]["id"], subscription_id);
    assert_eq!(json["subscriptions"][0]["state"], "Normal");
    assert_eq!(json["pending_publish_responses"], 0);
}

#[test]
fn publish_request_limit_saturates() {
    let mut limits = SubscriptionLimits::default();
    limits.max_publish_requests_per_subscription = usize::MAX;
    let mut session = SessionSubscriptions::new(limits, TickScheduler::new());
    assert_eq!(session.limits().max_publish_requests_per_subscription, usize::MAX);
    create_subscription(&mut session, 10, 0);
    create_subscription(&mut session, 10, 0);
    assert_eq!(
        session.max_publish_requests(),
        constants::MAX_PENDING_PUBLISH_REQUESTS
    );
    assert!(!session.reached_publish_request_limit());

    limits.max_pending_publish_requests = usize::MAX;
    let mut session = SessionSubscriptions::new(limits, TickScheduler::new());
    create_subscription(&mut session, 10, 0);
    create_subscription(&mut session, 10, 0);
    assert_eq!(session.max_publish_requests(), usize::MAX);
    publish_request(&mut session, 1, None);
    assert!(!session.reached_publish_request_limit());
}

#[test]
fn invalid_limits_fall_back_to_defaults() {
    let mut limits = SubscriptionLimits::default();
    limits.min_sampling_interval_ms = 0.0;
    limits.max_subscriptions_per_session = 1;
    let session = SessionSubscriptions::new(limits, TickScheduler::new());
    assert_eq!(*session.limits(), SubscriptionLimits::default());
}

#[test]
fn status_changes_are_bounded() {
    let mut limits = SubscriptionLimits::default();
    limits.max_subscriptions_per_session = 2;
    let mut session = SessionSubscriptions::new(limits, TickScheduler::new());

    // Three rounds of two subscriptions expiring with nobody publishing
    for round in 0..3u32 {
        for _ in 0..2 {
            session
                .create_subscription(&create_subscription_request(1, 3, 0, true, 0))
                .unwrap();
        }
        let mut expired = Vec::new();
        for _ in 0..4 {
            expired.extend(tick(&mut session));
        }
        assert_eq!(expired, vec![round * 2 + 1, round * 2 + 2]);
        assert!(session.metrics().pending_status_changes <= 2);
    }
    assert_eq!(session.metrics().pending_status_changes, 2);

    // Only the most recent ones reach the client
    for request_id in 1..=3 {
        publish_request(&mut session, request_id, None);
    }
    let responses = session.take_publish_responses();
    assert_eq!(responses.len(), 3);
    let timeouts: Vec<u32> = responses[..2]
        .iter()
        .map(|r| supported_message_as!(r.response.clone(), PublishResponse).subscription_id)
        .collect();
    assert_eq!(timeouts, vec![5, 6]);
    assert_eq!(
        responses[2].response.service_result(),
        StatusCode::BadNoSubscription
    );
}
