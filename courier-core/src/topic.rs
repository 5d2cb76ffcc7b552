//! Bounded publish/subscribe channel for one event type
//!
//! A topic keeps up to [`MAX_OBSERVERS`] `(callback, context)` pairs.
//! [`notify`](Topic::notify) calls them synchronously in subscription
//! order; the `publish*` family queues the notification on the topic's
//! [`DispatchEngine`] so it runs later on the dispatch worker.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::dispatch::{
    Context, DeliveryRecord, DispatchEngine, Erased, ExecContext, InterruptContext, Priority,
    TaskContext,
};
use crate::event::{Event, EventSlot};

/// Maximum subscribers per topic
pub const MAX_OBSERVERS: usize = 4;

/// Subscriber callback: the delivered value and the context given at
/// subscription
pub type Callback<V> = fn(&V, Context);

struct Observer<V> {
    callback: Callback<V>,
    context: Context,
}

impl<V> Clone for Observer<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Observer<V> {}

fn same_callback<V>(a: Callback<V>, b: Callback<V>) -> bool {
    a as usize == b as usize
}

/// Publish/notify channel for values of type `V`
pub struct Topic<V: 'static> {
    name: &'static str,
    engine: &'static DispatchEngine,
    observers: Mutex<CriticalSectionRawMutex, RefCell<Vec<Observer<V>, MAX_OBSERVERS>>>,
}

impl<V: Event> Topic<V> {
    /// Create a topic bound to `engine`
    pub const fn new(name: &'static str, engine: &'static DispatchEngine) -> Self {
        Self {
            name,
            engine,
            observers: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Engine that carries this topic's asynchronous deliveries
    pub fn engine(&self) -> &'static DispatchEngine {
        self.engine
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock(|observers| observers.borrow().len())
    }

    /// Add a subscriber
    ///
    /// Subscribing an already registered callback only replaces its
    /// context. Fails when the topic is full and `callback` is new.
    pub fn subscribe(&self, callback: Callback<V>, context: Context) -> bool {
        self.observers.lock(|observers| {
            let mut observers = observers.borrow_mut();

            if let Some(existing) = observers
                .iter_mut()
                .find(|o| same_callback(o.callback, callback))
            {
                existing.context = context;
                return true;
            }

            observers.push(Observer { callback, context }).is_ok()
        })
    }

    /// Remove a subscriber, keeping the order of the others
    ///
    /// Returns `false` if `callback` was not subscribed.
    pub fn unsubscribe(&self, callback: Callback<V>) -> bool {
        self.observers.lock(|observers| {
            let mut observers = observers.borrow_mut();
            match observers
                .iter()
                .position(|o| same_callback(o.callback, callback))
            {
                Some(index) => {
                    observers.remove(index);
                    true
                }
                None => false,
            }
        })
    }

    /// Call every subscriber now, in subscription order
    pub fn notify(&self, value: &V) {
        // Snapshot so callbacks run outside the critical section and may
        // (un)subscribe themselves
        let observers = self.observers.lock(|observers| observers.borrow().clone());
        for observer in &observers {
            (observer.callback)(value, observer.context);
        }
    }

    /// Queue a normal-priority notification from task context
    ///
    /// Succeeds without queuing anything when nobody is subscribed.
    /// Returns `false` if the engine is not started or the queue is full;
    /// the engine's error hook has then been run.
    pub fn publish(&'static self, slot: &'static EventSlot<V>) -> bool {
        self.publish_in::<TaskContext>(Priority::Normal, slot)
    }

    /// Queue a high-priority notification from task context
    pub fn publish_high(&'static self, slot: &'static EventSlot<V>) -> bool {
        self.publish_in::<TaskContext>(Priority::High, slot)
    }

    /// Queue a normal-priority notification from an interrupt handler
    ///
    /// Never blocks and never runs the error hook.
    pub fn publish_from_isr(&'static self, slot: &'static EventSlot<V>) -> bool {
        self.publish_in::<InterruptContext>(Priority::Normal, slot)
    }

    /// Queue a high-priority notification from an interrupt handler
    pub fn publish_high_from_isr(&'static self, slot: &'static EventSlot<V>) -> bool {
        self.publish_in::<InterruptContext>(Priority::High, slot)
    }

    fn publish_in<C: ExecContext>(
        &'static self,
        priority: Priority,
        slot: &'static EventSlot<V>,
    ) -> bool {
        if self.observer_count() == 0 {
            return true;
        }

        let record = DeliveryRecord::new(deliver::<V>, self, slot, self.name);
        self.engine.enqueue::<C>(priority, record)
    }
}

/// Delivery trampoline, one instance per event type
fn deliver<V: Event>(topic: &'static Erased, slot: &'static Erased) {
    if let (Some(topic), Some(slot)) = (
        topic.downcast_ref::<Topic<V>>(),
        slot.downcast_ref::<EventSlot<V>>(),
    ) {
        topic.notify(&slot.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Envelope, EventKind};
    use crate::testing::Log;

    #[derive(Debug, Clone, Copy)]
    struct Reading {
        envelope: Envelope,
        value: u32,
    }

    impl Reading {
        const fn new(value: u32) -> Self {
            Self {
                envelope: Envelope::new(EventKind::Counter),
                value,
            }
        }
    }

    impl Event for Reading {
        fn envelope(&self) -> &Envelope {
            &self.envelope
        }

        fn envelope_mut(&mut self) -> &mut Envelope {
            &mut self.envelope
        }
    }

    fn log_value(reading: &Reading, context: Context) {
        if let Some(log) = context.and_then(|c| c.downcast_ref::<Log>()) {
            log.push(reading.value);
        }
    }

    fn log_value_plus_100(reading: &Reading, context: Context) {
        if let Some(log) = context.and_then(|c| c.downcast_ref::<Log>()) {
            log.push(reading.value + 100);
        }
    }

    fn log_value_plus_200(reading: &Reading, context: Context) {
        if let Some(log) = context.and_then(|c| c.downcast_ref::<Log>()) {
            log.push(reading.value + 200);
        }
    }

    fn log_value_plus_300(reading: &Reading, context: Context) {
        if let Some(log) = context.and_then(|c| c.downcast_ref::<Log>()) {
            log.push(reading.value + 300);
        }
    }

    fn ignore(_reading: &Reading, _context: Context) {}

    #[test]
    fn test_duplicate_subscribe_updates_context() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static FIRST: Log = Log::new();
        static SECOND: Log = Log::new();

        assert!(TOPIC.subscribe(log_value, Some(&FIRST)));
        assert!(TOPIC.subscribe(log_value, Some(&SECOND)));
        assert_eq!(TOPIC.observer_count(), 1);

        TOPIC.notify(&Reading::new(5));
        assert!(FIRST.entries().is_empty());
        assert_eq!(SECOND.entries().as_slice(), &[5]);
    }

    #[test]
    fn test_subscribe_rejects_fifth_callback() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);

        assert!(TOPIC.subscribe(log_value, None));
        assert!(TOPIC.subscribe(log_value_plus_100, None));
        assert!(TOPIC.subscribe(log_value_plus_200, None));
        assert!(TOPIC.subscribe(log_value_plus_300, None));
        assert!(!TOPIC.subscribe(ignore, None));
        assert_eq!(TOPIC.observer_count(), MAX_OBSERVERS);

        // Re-subscribing an existing callback still succeeds when full
        assert!(TOPIC.subscribe(log_value_plus_300, None));
    }

    #[test]
    fn test_notify_in_subscription_order() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static LOG: Log = Log::new();

        TOPIC.subscribe(log_value_plus_200, Some(&LOG));
        TOPIC.subscribe(log_value, Some(&LOG));
        TOPIC.subscribe(log_value_plus_100, Some(&LOG));

        TOPIC.notify(&Reading::new(1));
        assert_eq!(LOG.entries().as_slice(), &[201, 1, 101]);
    }

    #[test]
    fn test_unsubscribe_compacts_in_order() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static LOG: Log = Log::new();

        TOPIC.subscribe(log_value, Some(&LOG));
        TOPIC.subscribe(log_value_plus_100, Some(&LOG));
        TOPIC.subscribe(log_value_plus_200, Some(&LOG));

        assert!(TOPIC.unsubscribe(log_value_plus_100));
        assert!(!TOPIC.unsubscribe(log_value_plus_100));
        assert_eq!(TOPIC.observer_count(), 2);

        TOPIC.notify(&Reading::new(2));
        assert_eq!(LOG.entries().as_slice(), &[2, 202]);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static SLOT: EventSlot<Reading> = EventSlot::new(Reading::new(0));

        // Not even started, yet nothing to deliver
        assert!(TOPIC.publish(&SLOT));
        assert!(TOPIC.publish_high_from_isr(&SLOT));
        assert_eq!(ENGINE.stats().normal.published, 0);
        assert_eq!(ENGINE.queued(Priority::Normal), 0);
    }

    #[test]
    fn test_publish_before_start_fails() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static SLOT: EventSlot<Reading> = EventSlot::new(Reading::new(0));

        TOPIC.subscribe(ignore, None);
        assert!(!TOPIC.publish(&SLOT));
        assert!(!TOPIC.publish_from_isr(&SLOT));
    }

    #[test]
    fn test_publish_delivers_slot_value_at_dispatch_time() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static SLOT: EventSlot<Reading> = EventSlot::new(Reading::new(0));
        static LOG: Log = Log::new();

        ENGINE.start();
        TOPIC.subscribe(log_value, Some(&LOG));

        SLOT.update(|r| r.value = 1);
        assert!(TOPIC.publish(&SLOT));
        SLOT.update(|r| r.value = 2);

        // Nothing delivered until the worker runs
        assert!(LOG.entries().is_empty());
        assert_eq!(ENGINE.drain(), 1);
        assert_eq!(LOG.entries().as_slice(), &[2]);
    }

    #[test]
    fn test_publish_overflow_after_queue_capacity() {
        use crate::dispatch::NORMAL_QUEUE_SIZE;

        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);
        static SLOT: EventSlot<Reading> = EventSlot::new(Reading::new(0));

        ENGINE.start();
        TOPIC.subscribe(ignore, None);

        for _ in 0..NORMAL_QUEUE_SIZE {
            assert!(TOPIC.publish(&SLOT));
        }
        let before = ENGINE.stats().normal.overflowed;
        assert!(!TOPIC.publish(&SLOT));
        assert_eq!(ENGINE.stats().normal.overflowed, before + 1);

        // High-priority queue is independent
        assert!(TOPIC.publish_high(&SLOT));
    }

    #[test]
    fn test_high_priority_delivered_before_earlier_normal() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static NORMAL: Topic<Reading> = Topic::new("normal", &ENGINE);
        static URGENT: Topic<Reading> = Topic::new("urgent", &ENGINE);
        static NORMAL_SLOT: EventSlot<Reading> = EventSlot::new(Reading::new(1));
        static URGENT_SLOT: EventSlot<Reading> = EventSlot::new(Reading::new(2));
        static LOG: Log = Log::new();

        ENGINE.start();
        NORMAL.subscribe(log_value, Some(&LOG));
        URGENT.subscribe(log_value_plus_100, Some(&LOG));

        assert!(NORMAL.publish(&NORMAL_SLOT));
        assert!(NORMAL.publish(&NORMAL_SLOT));
        assert!(URGENT.publish_high(&URGENT_SLOT));
        assert!(URGENT.publish_high_from_isr(&URGENT_SLOT));

        assert_eq!(ENGINE.drain(), 4);
        assert_eq!(LOG.entries().as_slice(), &[102, 102, 1, 1]);
    }

    fn unsubscribe_self(_reading: &Reading, context: Context) {
        if let Some(topic) = context.and_then(|c| c.downcast_ref::<Topic<Reading>>()) {
            topic.unsubscribe(unsubscribe_self);
        }
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        static ENGINE: DispatchEngine = DispatchEngine::new();
        static TOPIC: Topic<Reading> = Topic::new("reading", &ENGINE);

        TOPIC.subscribe(unsubscribe_self, Some(&TOPIC));
        TOPIC.notify(&Reading::new(0));
        assert_eq!(TOPIC.observer_count(), 0);
    }
}
