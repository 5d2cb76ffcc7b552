//! Event values and the storage producers publish from
//!
//! Every published value embeds an [`Envelope`] carrying the time it was
//! last touched and a type tag. Producers keep the value in an
//! [`EventSlot`] that outlives every delivery referencing it.

pub mod envelope;
pub mod slot;

pub use envelope::{Clock, Envelope, Event, EventKind};
pub use slot::EventSlot;
