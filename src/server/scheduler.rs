// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Periodic callbacks that drive sampling and publishing.
//!
//! The engine registers one callback per subscription for its publishing interval and one per
//! sampled monitored item for its sampling interval. Whoever owns the scheduler dispatches the
//! due [`CallbackTarget`]s back into `SessionSubscriptions::run_callback`.

use std::collections::BTreeMap;

use crate::{server::subscriptions::subscription::MonitoredItemHandle, types::StatusCode};

/// What a callback does when it fires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CallbackTarget {
    /// Sample the value of a monitored item
    Sample(MonitoredItemHandle),
    /// Run the publish cycle of the subscription with this id
    Publish(u32),
}

/// Registration token of a periodic callback.
///
/// The token is deliberately neither `Copy` nor `Clone`. Its holder is the only one able to
/// unregister the callback and doing so consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

impl CallbackId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// Registers a callback firing every `interval_ms` milliseconds. The interval must be a
    /// positive, finite number.
    fn register(
        &mut self,
        target: CallbackTarget,
        interval_ms: f64,
    ) -> Result<CallbackId, StatusCode>;

    /// Unregisters a callback. No firing of it is reported after this returns.
    fn unregister(&mut self, callback_id: CallbackId);
}

#[derive(Debug)]
struct RegisteredCallback {
    target: CallbackTarget,
    interval_ms: u64,
    next_due_ms: u64,
}

/// A scheduler driven by explicit calls to [`TickScheduler::advance`] instead of a clock.
///
/// Intervals are rounded up to whole milliseconds. Callbacks due at the same instant are
/// reported sampling first, then publishing, each in registration order.
#[derive(Debug, Default)]
pub struct TickScheduler {
    now_ms: u64,
    next_id: u64,
    callbacks: BTreeMap<u64, RegisteredCallback>,
}

impl Scheduler for TickScheduler {
    fn register(
        &mut self,
        target: CallbackTarget,
        interval_ms: f64,
    ) -> Result<CallbackId, StatusCode> {
        if !interval_ms.is_finite() || interval_ms <= 0.0 {
            error!(
                "Cannot register callback {:?} with interval {}",
                target, interval_ms
            );
            return Err(StatusCode::BadInvalidArgument);
        }
        let interval_ms = (interval_ms.ceil() as u64).max(1);
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.insert(
            id,
            RegisteredCallback {
                target,
                interval_ms,
                next_due_ms: self.now_ms + interval_ms,
            },
        );
        trace!(
            "Registered callback {} for {:?} every {}ms",
            id,
            target,
            interval_ms
        );
        Ok(CallbackId(id))
    }

    fn unregister(&mut self, callback_id: CallbackId) {
        if self.callbacks.remove(&callback_id.0).is_some() {
            trace!("Unregistered callback {}", callback_id.0);
        } else {
            warn!("Callback {} was not registered", callback_id.0);
        }
    }
}

impl TickScheduler {
    pub fn new() -> TickScheduler {
        TickScheduler::default()
    }

    /// Milliseconds elapsed since the scheduler was created
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn is_registered(&self, callback_id: &CallbackId) -> bool {
        self.callbacks.contains_key(&callback_id.0)
    }

    /// The rounded interval of a registered callback
    pub fn interval_ms(&self, callback_id: &CallbackId) -> Option<u64> {
        self.callbacks.get(&callback_id.0).map(|c| c.interval_ms)
    }

    /// Moves time forward and returns every firing that fell due, in time order. A callback
    /// due several times within `elapsed_ms` is reported that many times.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<CallbackTarget> {
        let until = self.now_ms + elapsed_ms;
        let mut due = Vec::new();
        for (id, callback) in self.callbacks.iter_mut() {
            while callback.next_due_ms <= until {
                let publish = matches!(callback.target, CallbackTarget::Publish(_));
                due.push((callback.next_due_ms, publish, *id, callback.target));
                callback.next_due_ms += callback.interval_ms;
            }
        }
        self.now_ms = until;
        due.sort_by_key(|(at, publish, id, _)| (*at, *publish, *id));
        due.into_iter().map(|(_, _, _, target)| target).collect()
    }
}
