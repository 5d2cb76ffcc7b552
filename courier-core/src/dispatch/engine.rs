//! Two-priority delivery queues and their single worker
//!
//! Scheduling policy of the worker, per iteration:
//! 1. Drain the high-priority queue completely (non-blocking reads)
//! 2. Wait at most `normal_wait_ms` for one normal record
//! 3. Go back to 1
//!
//! High-priority latency is therefore bounded by one normal wait interval,
//! and the normal queue cannot starve because the wait is bounded.

use core::any::Any;
use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embedded_hal_async::delay::DelayNs;
use portable_atomic::{AtomicBool, Ordering};

use super::context::ExecContext;
use super::stats::{DispatchStats, LevelCounters};

/// Normal-priority queue capacity
pub const NORMAL_QUEUE_SIZE: usize = 8;

/// High-priority queue capacity
pub const HIGH_QUEUE_SIZE: usize = 4;

/// Default bounded wait on the normal queue
pub const DEFAULT_NORMAL_WAIT_MS: u32 = 10;

/// Type-erased shared reference stored in queues and observer tables
pub type Erased = dyn Any + Send + Sync;

/// Opaque user context handed back to callbacks and hooks
pub type Context = Option<&'static Erased>;

/// Called from task context when an enqueue is rejected
///
/// Arguments: the reason, the originating topic name, the registered
/// context.
pub type ErrorHook = fn(DispatchError, &'static str, Context);

/// Queue selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    Normal,
    High,
}

/// Why an enqueue was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// The selected queue had no free slot
    QueueFull,
    /// [`DispatchEngine::start`] has not been called
    QueueNotReady,
}

/// Engine tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchConfig {
    /// How long the worker waits for a normal record before re-checking
    /// the high-priority queue
    pub normal_wait_ms: u32,
}

impl DispatchConfig {
    pub const fn new() -> Self {
        Self {
            normal_wait_ms: DEFAULT_NORMAL_WAIT_MS,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One queued delivery: "notify this topic with the value in this slot"
///
/// Fixed size regardless of the event type: the trampoline is
/// monomorphized per event type and recovers the concrete types.
#[derive(Clone, Copy)]
pub struct DeliveryRecord {
    notify: fn(&'static Erased, &'static Erased),
    topic: &'static Erased,
    value: &'static Erased,
    topic_name: &'static str,
}

impl DeliveryRecord {
    pub(crate) fn new(
        notify: fn(&'static Erased, &'static Erased),
        topic: &'static Erased,
        value: &'static Erased,
        topic_name: &'static str,
    ) -> Self {
        Self {
            notify,
            topic,
            value,
            topic_name,
        }
    }

    /// Name of the topic this record targets
    pub fn topic_name(&self) -> &'static str {
        self.topic_name
    }

    fn deliver(self) {
        (self.notify)(self.topic, self.value);
    }
}

#[derive(Clone, Copy)]
struct HookEntry {
    hook: ErrorHook,
    context: Context,
}

/// Shared delivery queues, statistics, and error reporting
///
/// Construct once (usually as a `static`) and hand `&'static` references
/// to the topics that publish through it. Exactly one worker runs
/// [`run`](Self::run); a second call returns at once. Tests without a
/// worker task call [`poll`](Self::poll)/[`drain`](Self::drain) instead.
pub struct DispatchEngine {
    normal: Channel<CriticalSectionRawMutex, DeliveryRecord, NORMAL_QUEUE_SIZE>,
    high: Channel<CriticalSectionRawMutex, DeliveryRecord, HIGH_QUEUE_SIZE>,
    started: AtomicBool,
    worker: AtomicBool,
    normal_stats: LevelCounters,
    high_stats: LevelCounters,
    error_hook: Mutex<CriticalSectionRawMutex, Cell<Option<HookEntry>>>,
    config: DispatchConfig,
}

impl Default for DispatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchEngine {
    /// Create an engine with default tunables
    pub const fn new() -> Self {
        Self::with_config(DispatchConfig::new())
    }

    /// Create an engine with explicit tunables
    pub const fn with_config(config: DispatchConfig) -> Self {
        Self {
            normal: Channel::new(),
            high: Channel::new(),
            started: AtomicBool::new(false),
            worker: AtomicBool::new(false),
            normal_stats: LevelCounters::new(),
            high_stats: LevelCounters::new(),
            error_hook: Mutex::new(Cell::new(None)),
            config,
        }
    }

    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// Open the queues for publishing
    ///
    /// Returns `true` the first time; later calls are no-ops returning
    /// `false`, so the caller spawns the worker exactly once.
    pub fn start(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Register the hook run on task-context enqueue failures
    pub fn set_error_hook(&self, hook: ErrorHook, context: Context) {
        self.error_hook
            .lock(|entry| entry.set(Some(HookEntry { hook, context })));
    }

    pub fn clear_error_hook(&self) {
        self.error_hook.lock(|entry| entry.set(None));
    }

    /// Try to queue a record without blocking
    ///
    /// Counts the attempt, and on rejection counts the overflow and (task
    /// context only) runs the error hook.
    pub fn enqueue<C: ExecContext>(&self, priority: Priority, record: DeliveryRecord) -> bool {
        let counters = self.counters(priority);
        counters.record_publish();

        if !self.is_started() {
            self.report::<C>(DispatchError::QueueNotReady, record.topic_name);
            return false;
        }

        let sent = match priority {
            Priority::Normal => self.normal.try_send(record).is_ok(),
            Priority::High => self.high.try_send(record).is_ok(),
        };

        if !sent {
            counters.record_overflow();
            self.report::<C>(DispatchError::QueueFull, record.topic_name);
        }
        sent
    }

    fn report<C: ExecContext>(&self, error: DispatchError, topic_name: &'static str) {
        if !C::MAY_REPORT {
            return;
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("dispatch to '{}' rejected: {}", topic_name, error);

        // Copy out so the hook runs outside the critical section
        if let Some(entry) = self.error_hook.lock(|entry| entry.get()) {
            (entry.hook)(error, topic_name, entry.context);
        }
    }

    /// Deliver one queued record, high priority first
    ///
    /// Returns the level served, or `None` when both queues are empty.
    pub fn poll(&self) -> Option<Priority> {
        if let Ok(record) = self.high.try_receive() {
            self.deliver(record, Priority::High);
            return Some(Priority::High);
        }
        if let Ok(record) = self.normal.try_receive() {
            self.deliver(record, Priority::Normal);
            return Some(Priority::Normal);
        }
        None
    }

    /// Deliver queued records until both queues are empty
    ///
    /// Returns the number of records delivered.
    pub fn drain(&self) -> usize {
        let mut delivered = 0;
        while self.poll().is_some() {
            delivered += 1;
        }
        delivered
    }

    /// One worker iteration
    ///
    /// Drains the high-priority queue, then waits up to `normal_wait_ms`
    /// for a single normal record. Returns the number of records delivered.
    pub async fn step<D: DelayNs>(&self, delay: &mut D) -> usize {
        let mut delivered = 0;

        while let Ok(record) = self.high.try_receive() {
            self.deliver(record, Priority::High);
            delivered += 1;
        }

        match select(
            self.normal.receive(),
            delay.delay_ms(self.config.normal_wait_ms),
        )
        .await
        {
            Either::First(record) => {
                self.deliver(record, Priority::Normal);
                delivered += 1;
            }
            Either::Second(()) => {}
        }

        delivered
    }

    /// Mark the engine as served by a worker
    ///
    /// Returns `true` only for the first caller.
    pub fn claim_worker(&self) -> bool {
        !self.worker.swap(true, Ordering::AcqRel)
    }

    /// Worker loop
    ///
    /// Never returns for the worker that claims the engine. Returns
    /// immediately if another worker already claimed it.
    pub async fn run<D: DelayNs>(&self, mut delay: D) {
        if !self.claim_worker() {
            return;
        }
        loop {
            self.step(&mut delay).await;
        }
    }

    fn deliver(&self, record: DeliveryRecord, priority: Priority) {
        record.deliver();
        let remaining = match priority {
            Priority::Normal => self.normal.len(),
            Priority::High => self.high.len(),
        };
        self.counters(priority).record_dispatch(remaining);
    }

    fn counters(&self, priority: Priority) -> &LevelCounters {
        match priority {
            Priority::Normal => &self.normal_stats,
            Priority::High => &self.high_stats,
        }
    }

    /// Free slots in the selected queue
    pub fn free_slots(&self, priority: Priority) -> usize {
        match priority {
            Priority::Normal => self.normal.free_capacity(),
            Priority::High => self.high.free_capacity(),
        }
    }

    /// Check whether the selected queue can take another record
    pub fn has_space(&self, priority: Priority) -> bool {
        self.free_slots(priority) > 0
    }

    /// Records currently queued at the selected level
    pub fn queued(&self, priority: Priority) -> usize {
        match priority {
            Priority::Normal => self.normal.len(),
            Priority::High => self.high.len(),
        }
    }

    /// Read-only snapshot of both levels
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            normal: self.normal_stats.snapshot(self.free_slots(Priority::Normal)),
            high: self.high_stats.snapshot(self.free_slots(Priority::High)),
        }
    }

    pub fn reset_stats(&self) {
        self.normal_stats.reset();
        self.high_stats.reset();
    }
}
