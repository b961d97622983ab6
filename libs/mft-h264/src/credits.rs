// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Credit accounting for the transform's asynchronous event protocol.
//!
//! An asynchronous transform grants permission units ("credits") through
//! event notifications: one `NeedInput` per input sample it will accept, one
//! `HaveOutput` per output sample it has ready. The tracker is the only
//! state shared between the transform's event-delivery thread and the
//! caller's encode thread, so both counters are atomics.

use std::sync::atomic::{AtomicU32, Ordering};

/// Event emitted by the transform on its own delivery thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformEvent {
    /// The transform will accept one more input sample.
    NeedInput,
    /// The transform has one more output sample ready.
    HaveOutput,
}

/// Observer the transform delivers events to.
///
/// Registered as a weak reference so the registration never keeps the
/// adapter alive; a transform whose adapter is gone simply drops the event.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: TransformEvent);
}

/// Two monotonically adjusted credit counters.
///
/// Increments happen only on the event path ([`EventSink::notify`]),
/// decrements only on the adapter's submit/drain paths via the
/// `try_consume_*` methods, which never observe a negative count.
#[derive(Debug, Default)]
pub struct CreditTracker {
    input_credits: AtomicU32,
    output_credits: AtomicU32,
}

impl CreditTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transform announced it will accept another input sample.
    pub fn on_need_input(&self) {
        self.input_credits.fetch_add(1, Ordering::AcqRel);
    }

    /// The transform announced an output sample is ready.
    pub fn on_have_output(&self) {
        self.output_credits.fetch_add(1, Ordering::AcqRel);
    }

    /// Atomically claim one input credit. Returns false when none are
    /// outstanding, leaving the counter untouched.
    pub fn try_consume_input(&self) -> bool {
        try_consume(&self.input_credits)
    }

    /// Atomically claim one output credit.
    pub fn try_consume_output(&self) -> bool {
        try_consume(&self.output_credits)
    }

    pub fn input_credits(&self) -> u32 {
        self.input_credits.load(Ordering::Acquire)
    }

    pub fn output_credits(&self) -> u32 {
        self.output_credits.load(Ordering::Acquire)
    }
}

fn try_consume(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
            count.checked_sub(1)
        })
        .is_ok()
}

impl EventSink for CreditTracker {
    fn notify(&self, event: TransformEvent) {
        match event {
            TransformEvent::NeedInput => self.on_need_input(),
            TransformEvent::HaveOutput => self.on_have_output(),
        }
        // Instrumentation only; never alters control flow.
        tracing::trace!(
            ?event,
            input = self.input_credits(),
            output = self.output_credits(),
            "transform event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_credits_start_at_zero() {
        let credits = CreditTracker::new();
        assert_eq!(credits.input_credits(), 0);
        assert_eq!(credits.output_credits(), 0);
        assert!(!credits.try_consume_input());
        assert!(!credits.try_consume_output());
    }

    #[test]
    fn test_consume_matches_grants() {
        let credits = CreditTracker::new();
        credits.on_need_input();
        credits.on_need_input();
        credits.on_have_output();

        assert!(credits.try_consume_input());
        assert!(credits.try_consume_input());
        assert!(!credits.try_consume_input());

        assert!(credits.try_consume_output());
        assert!(!credits.try_consume_output());
    }

    #[test]
    fn test_counters_never_go_negative() {
        let credits = CreditTracker::new();
        for _ in 0..10 {
            let _ = credits.try_consume_input();
            let _ = credits.try_consume_output();
        }
        assert_eq!(credits.input_credits(), 0);
        assert_eq!(credits.output_credits(), 0);

        credits.on_need_input();
        assert!(credits.try_consume_input());
        assert_eq!(credits.input_credits(), 0);
    }

    #[test]
    fn test_notify_routes_events() {
        let credits = CreditTracker::new();
        credits.notify(TransformEvent::NeedInput);
        credits.notify(TransformEvent::HaveOutput);
        credits.notify(TransformEvent::HaveOutput);
        assert_eq!(credits.input_credits(), 1);
        assert_eq!(credits.output_credits(), 2);
    }

    #[test]
    fn test_concurrent_grant_and_consume() {
        let credits = Arc::new(CreditTracker::new());
        let granter = Arc::clone(&credits);

        let producer = thread::spawn(move || {
            for _ in 0..1000 {
                granter.on_need_input();
            }
        });

        let mut consumed = 0u32;
        for _ in 0..2000 {
            if credits.try_consume_input() {
                consumed += 1;
            }
        }
        producer.join().expect("producer thread panicked");

        while credits.try_consume_input() {
            consumed += 1;
        }
        assert_eq!(consumed, 1000);
        assert_eq!(credits.input_credits(), 0);
    }
}
