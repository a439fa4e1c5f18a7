// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

/// Issues an increasing sequence of `u32` values, e.g. subscription ids, monitored item ids
/// and notification message sequence numbers.
///
/// After `u32::MAX` the handle wraps back to the first value, so a handle created with
/// `Handle::new(1)` never issues 0.
#[derive(Debug, Clone, Serialize)]
pub struct Handle {
    next: u32,
    first: u32,
}

impl Handle {
    /// Creates a new handle factory that starts with the supplied number
    pub fn new(first: u32) -> Handle {
        Handle { next: first, first }
    }

    /// Returns the next handle and advances the factory.
    pub fn next(&mut self) -> u32 {
        let next = self.next;
        self.next = if next == u32::MAX {
            self.first
        } else {
            next + 1
        };
        next
    }

    /// The value the next call to `next()` will return.
    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn set_next(&mut self, next: u32) {
        debug_assert!(next >= self.first);
        self.next = next.max(self.first);
    }

    /// Resets the handle to its initial state
    pub fn reset(&mut self) {
        self.next = self.first;
    }
}

#[test]
fn handle_increment() {
    let mut h = Handle::new(1);
    assert_eq!(h.peek(), 1);
    assert_eq!(h.next(), 1);
    assert_eq!(h.next(), 2);
    assert_eq!(h.peek(), 3);
    h.reset();
    assert_eq!(h.next(), 1);
}

#[test]
fn handle_wrap_skips_zero() {
    let mut h = Handle::new(1);
    h.set_next(u32::MAX - 1);
    assert_eq!(h.next(), u32::MAX - 1);
    assert_eq!(h.next(), u32::MAX);
    assert_eq!(h.next(), 1);
    assert_eq!(h.next(), 2);
}
