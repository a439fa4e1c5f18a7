// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

use std::collections::VecDeque;

use crate::{
    core::supported_message::SupportedMessage,
    types::{
        service_types::{PublishRequest, PublishResponse, ResponseHeader, ServiceFault},
        status_code::StatusCode,
        DataValue, DateTime, NotificationMessage, ReadValueId,
    },
};

pub mod monitored_item;
pub mod notification;
pub mod session_subscriptions;
pub mod subscription;

/// An outstanding publish request. Publish requests are answered out of band, whenever a
/// subscription has something to send, so the transport's request id travels with the request
/// and is handed back with the response.
#[derive(Debug, Clone)]
pub struct PublishRequestEntry {
    pub request_id: u32,
    pub request: PublishRequest,
    // Results of the acknowledgements in the request, processed when it arrived
    pub results: Option<Vec<StatusCode>>,
}

impl PublishRequestEntry {
    /// Builds the response carrying a notification message of a subscription
    pub(crate) fn into_response(
        self,
        now: &DateTime,
        subscription_id: u32,
        available_sequence_numbers: Option<Vec<u32>>,
        more_notifications: bool,
        notification_message: NotificationMessage,
    ) -> PublishResponse {
        PublishResponse {
            response_header: ResponseHeader::new_timestamped_service_result(
                *now,
                &self.request.request_header,
                StatusCode::Good,
            ),
            subscription_id,
            available_sequence_numbers,
            more_notifications,
            notification_message,
            results: self.results,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PublishResponseEntry {
    pub request_id: u32,
    pub response: SupportedMessage,
}

/// The transport side of publishing. It holds the client's outstanding publish requests and
/// takes the responses that answer them.
pub trait PublishTransport {
    fn has_publish_request(&self) -> bool;

    /// Takes the oldest outstanding publish request
    fn take_publish_request(&mut self) -> Option<PublishRequestEntry>;

    /// Sends a response to a request previously taken with `take_publish_request`
    fn send_publish_response(&mut self, request_id: u32, response: SupportedMessage);
}

/// Reads the current value of the attribute a monitored item watches.
pub trait Sampler {
    /// Returns the current value, or `None` if nothing could be read this time.
    fn sample(&mut self, item_to_monitor: &ReadValueId) -> Option<DataValue>;
}

impl<F> Sampler for F
where
    F: FnMut(&ReadValueId) -> Option<DataValue>,
{
    fn sample(&mut self, item_to_monitor: &ReadValueId) -> Option<DataValue> {
        self(item_to_monitor)
    }
}

/// Publish requests waiting for something to send and responses waiting to be collected by
/// the session.
#[derive(Debug, Default)]
pub struct PublishQueues {
    requests: VecDeque<PublishRequestEntry>,
    responses: VecDeque<PublishResponseEntry>,
}

impl PublishTransport for PublishQueues {
    fn has_publish_request(&self) -> bool {
        !self.requests.is_empty()
    }

    fn take_publish_request(&mut self) -> Option<PublishRequestEntry> {
        self.requests.pop_front()
    }

    fn send_publish_response(&mut self, request_id: u32, response: SupportedMessage) {
        self.responses.push_back(PublishResponseEntry {
            request_id,
            response,
        });
    }
}

impl PublishQueues {
    pub fn request_queue_len(&self) -> usize {
        self.requests.len()
    }

    pub fn response_queue_len(&self) -> usize {
        self.responses.len()
    }

    pub(crate) fn push_request(&mut self, request: PublishRequestEntry) {
        self.requests.push_back(request);
    }

    /// Answers the oldest outstanding request with a service fault
    pub(crate) fn fail_oldest_request(&mut self, status: StatusCode) -> bool {
        let Some(entry) = self.requests.pop_front() else {
            return false;
        };
        self.fail(entry, status);
        true
    }

    /// Answers every outstanding request with a service fault
    pub(crate) fn fail_all_requests(&mut self, status: StatusCode) -> usize {
        let requests = std::mem::take(&mut self.requests);
        let count = requests.len();
        for entry in requests {
            self.fail(entry, status);
        }
        count
    }

    fn fail(&mut self, entry: PublishRequestEntry, status: StatusCode) {
        debug!(
            "Answering publish request {} with {}",
            entry.request_id, status
        );
        let fault = ServiceFault::new(&entry.request.request_header, status);
        self.send_publish_response(entry.request_id, fault.into());
    }

    pub(crate) fn take_responses(&mut self) -> Vec<PublishResponseEntry> {
        self.responses.drain(..).collect()
    }
}
