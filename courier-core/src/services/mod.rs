//! Domain services built on topics
//!
//! The timer publishes [`TimerEvent`]s; the counter and the clock display
//! subscribe to them.

mod clock_display;
mod counter;
mod timer;

pub use clock_display::{ClockDisplay, TIME_STRING_LEN};
pub use counter::CounterService;
pub use timer::{TimerEvent, TimerService};
