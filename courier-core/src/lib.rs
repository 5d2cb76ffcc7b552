//! Board-agnostic event dispatch and command routing for Courier nodes
//!
//! This crate contains all logic that does not depend on a specific MCU:
//!
//! - Event envelopes and producer-owned event slots
//! - Topics: bounded publish/subscribe channels per event type
//! - The dispatch engine: two-priority delivery queues, one worker,
//!   statistics and an error hook
//! - Command registry, dispatcher and the built-in handlers
//! - Domain services (timer, counter, clock display)
//!
//! Everything is statically sized; nothing allocates.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod dispatch;
pub mod event;
pub mod services;
pub mod topic;

#[cfg(test)]
mod testing;

pub use command::{
    CommandDispatcher, CommandHandler, CommandRegistry, GetCounterCommand, PingCommand,
    RegistryError, ResponseEvent, MAX_COMMANDS,
};
pub use dispatch::{
    Context, DispatchConfig, DispatchEngine, DispatchError, DispatchStats, LevelStats, Priority,
};
pub use event::{Clock, Envelope, Event, EventKind, EventSlot};
pub use services::{ClockDisplay, CounterService, TimerEvent, TimerService};
pub use topic::{Callback, Topic, MAX_OBSERVERS};
