use super::*;

#[test]
fn queues_stay_consistent() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 3);
    let h1 = create_item(&mut session, subscription_id, "v1", 3, true);
    let h2 = create_item(&mut session, subscription_id, "v2", 2, false);
    let h3 = create_item(&mut session, subscription_id, "v3", 1, true);

    for v in 0..7 {
        for h in [h1, h2, h3] {
            assert!(session.notify_data_value(h, DataValue::new_now(v)).unwrap());
            assert_queues_consistent(session.get(subscription_id).unwrap());
        }
    }
    assert_eq!(
        session
            .get(subscription_id)
            .unwrap()
            .notification_queue_len(),
        6
    );

    // Publishing takes notifications in arrival order and keeps both queues in step
    publish_request(&mut session, 1, None);
    tick(&mut session);
    assert_queues_consistent(session.get(subscription_id).unwrap());
    let responses = publish_responses(&mut session);
    assert_eq!(responses.len(), 1);
    assert!(responses[0].more_notifications);
    let (data_changes, _) = responses[0].notification_message.notifications().unwrap();
    assert_eq!(data_changes.len(), 3);

    session
        .set_monitoring_mode(subscription_id, MonitoringMode::Sampling, &[h1.monitored_item_id])
        .unwrap();
    assert_queues_consistent(session.get(subscription_id).unwrap());

    session
        .delete_monitored_items(subscription_id, &[h2.monitored_item_id])
        .unwrap();
    assert_queues_consistent(session.get(subscription_id).unwrap());

    session
        .set_monitoring_mode(subscription_id, MonitoringMode::Disabled, &[h3.monitored_item_id])
        .unwrap();
    assert_queues_consistent(session.get(subscription_id).unwrap());
}

#[test]
fn disabled_item_releases_queue_and_sampling() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let h = create_item(&mut session, subscription_id, "v1", 5, true);
    // One publish callback and one sampling callback
    assert_eq!(session.scheduler().len(), 2);

    for v in 0..3 {
        session.notify_data_value(h, DataValue::new_now(v)).unwrap();
    }
    session
        .set_monitoring_mode(subscription_id, MonitoringMode::Disabled, &[h.monitored_item_id])
        .unwrap();

    let subscription = session.get(subscription_id).unwrap();
    let item = subscription.monitored_item(h.monitored_item_id).unwrap();
    assert_eq!(item.queue_len(), 0);
    assert!(!item.is_sampling_registered());
    assert_eq!(subscription.notification_queue_len(), 0);
    assert_eq!(session.scheduler().len(), 1);

    // Values are ignored while disabled
    assert!(!session.notify_data_value(h, DataValue::new_now(10)).unwrap());

    session
        .set_monitoring_mode(subscription_id, MonitoringMode::Reporting, &[h.monitored_item_id])
        .unwrap();
    assert_eq!(session.scheduler().len(), 2);
    // The first value after enabling is reported even if it did not change
    assert!(session.notify_data_value(h, DataValue::new_now(2)).unwrap());
}

#[test]
fn sampling_item_holds_notifications_back() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let sampled = create_item(&mut session, subscription_id, "v1", 5, true);
    let reported = create_item(&mut session, subscription_id, "v2", 5, true);
    session
        .set_monitoring_mode(
            subscription_id,
            MonitoringMode::Sampling,
            &[sampled.monitored_item_id],
        )
        .unwrap();

    session.notify_data_value(sampled, DataValue::new_now(1)).unwrap();
    session.notify_data_value(reported, DataValue::new_now(2)).unwrap();
    session.notify_data_value(sampled, DataValue::new_now(3)).unwrap();
    assert_eq!(
        session.get(subscription_id).unwrap().ready_notifications(),
        1
    );

    publish_request(&mut session, 1, None);
    tick(&mut session);
    let responses = publish_responses(&mut session);
    let (data_changes, _) = responses[0].notification_message.notifications().unwrap();
    assert_eq!(data_changes.len(), 1);
    assert_eq!(data_changes[0].value.value, Some(Variant::Int32(2)));

    let subscription = session.get(subscription_id).unwrap();
    assert_eq!(subscription.notification_queue_len(), 2);
    assert_eq!(subscription.ready_notifications(), 0);
    assert_queues_consistent(subscription);

    // Switching to reporting releases what was held back, in arrival order
    session
        .set_monitoring_mode(
            subscription_id,
            MonitoringMode::Reporting,
            &[sampled.monitored_item_id],
        )
        .unwrap();
    publish_request(&mut session, 2, None);
    tick(&mut session);
    let responses = publish_responses(&mut session);
    let (data_changes, _) = responses[0].notification_message.notifications().unwrap();
    let values: Vec<Option<Variant>> = data_changes.into_iter().map(|n| n.value.value).collect();
    assert_eq!(values, vec![Some(Variant::Int32(1)), Some(Variant::Int32(3))]);
}

#[test]
fn sampling_callback_feeds_queue() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let h = create_item(&mut session, subscription_id, "v1", 10, true);

    let mut counter = 0;
    let mut sampler = |item: &ReadValueId| {
        assert_eq!(item.node_id, NodeId::new(2, "v1"));
        counter += 1;
        Some(DataValue::new_now(counter / 2))
    };
    // Values 0, 1, 1, 2, 2 of which 0, 1, 2 are changes
    session.advance(500, &mut sampler);
    let subscription = session.get(subscription_id).unwrap();
    assert_eq!(
        subscription
            .monitored_item(h.monitored_item_id)
            .unwrap()
            .queue_len(),
        3
    );
}

#[test]
fn modify_shrinks_queue() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let h = create_item(&mut session, subscription_id, "v1", 5, true);
    for v in 0..5 {
        session.notify_data_value(h, DataValue::new_now(v)).unwrap();
    }
    let results = session
        .modify_monitored_items(
            subscription_id,
            TimestampsToReturn::Both,
            &[MonitoredItemModifyRequest {
                monitored_item_id: h.monitored_item_id,
                requested_parameters: MonitoringParameters {
                    client_handle: 100,
                    sampling_interval: 250f64,
                    filter: None,
                    queue_size: 2,
                    discard_oldest: true,
                },
            }],
        )
        .unwrap();
    assert_eq!(results[0].status_code, StatusCode::Good);
    assert_eq!(results[0].revised_queue_size, 2);
    assert_eq!(results[0].revised_sampling_interval, 250f64);

    let subscription = session.get(subscription_id).unwrap();
    assert_eq!(subscription.notification_queue_len(), 2);
    assert_queues_consistent(subscription);
    assert!(subscription
        .monitored_item(h.monitored_item_id)
        .unwrap()
        .queue_overflow());

    let results = session
        .modify_monitored_items(
            subscription_id,
            TimestampsToReturn::Both,
            &[MonitoredItemModifyRequest {
                monitored_item_id: 999,
                requested_parameters: MonitoringParameters::default(),
            }],
        )
        .unwrap();
    assert_eq!(results[0].status_code, StatusCode::BadMonitoredItemIdInvalid);
}

#[test]
fn event_items_are_not_sampled() {
    let mut session = make_session();
    let subscription_id = create_subscription(&mut session, 10, 0);
    let request = MonitoredItemCreateRequest::new(
        ReadValueId::events(NodeId::new(0, 2253u32)),
        MonitoringMode::Reporting,
        MonitoringParameters {
            client_handle: 7,
            queue_size: 10,
            ..Default::default()
        },
    );
    let results = session
        .create_monitored_items(subscription_id, TimestampsToReturn::Both, &[request])
        .unwrap();
    let h = MonitoredItemHandle {
        subscription_id,
        monitored_item_id: results[0].monitored_item_id,
    };
    assert_eq!(session.scheduler().len(), 1);
    assert_eq!(
        session
            .get(subscription_id)
            .unwrap()
            .monitored_item(h.monitored_item_id)
            .unwrap()
            .kind(),
        MonitoredItemKind::Event
    );

    assert!(!session.notify_data_value(h, DataValue::new_now(1)).unwrap());
    assert!(session
        .notify_event(h, vec![Variant::from("Alarm"), Variant::from(5)])
        .unwrap());

    publish_request(&mut session, 1, None);
    tick(&mut session);
    let responses = publish_responses(&mut session);
    let (data_changes, events) = responses[0].notification_message.notifications().unwrap();
    assert!(data_changes.is_empty());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].client_handle, 7);
}

#[test]
fn too_many_monitored_items() {
    let mut limits = SubscriptionLimits::default();
    limits.max_monitored_items_per_sub = 2;
    let mut session = SessionSubscriptions::new(limits, TickScheduler::new());
    let subscription_id = create_subscription(&mut session, 10, 0);
    let requests: Vec<MonitoredItemCreateRequest> = (0..3)
        .map(|i| {
            MonitoredItemCreateRequest::new(
                NodeId::new(2, i as u32).into(),
                MonitoringMode::Reporting,
                MonitoringParameters::default(),
            )
        })
        .collect();
    let results = session
        .create_monitored_items(subscription_id, TimestampsToReturn::Both, &requests)
        .unwrap();
    let statuses: Vec<StatusCode> = results.iter().map(|r| r.status_code).collect();
    assert_eq!(
        statuses,
        vec![
            StatusCode::Good,
            StatusCode::Good,
            StatusCode::BadTooManyMonitoredItems
        ]
    );

    assert_eq!(
        session.create_monitored_items(subscription_id, TimestampsToReturn::Invalid, &requests),
        Err(StatusCode::BadTimestampsToReturnInvalid)
    );
    assert_eq!(
        session.create_monitored_items(999, TimestampsToReturn::Both, &requests),
        Err(StatusCode::BadSubscriptionIdInvalid)
    );
    assert_eq!(
        session.create_monitored_items(subscription_id, TimestampsToReturn::Both, &[]),
        Err(StatusCode::BadNothingToDo)
    );
}
