//! Execution-context capability for enqueue operations
//!
//! Task code and interrupt handlers enqueue through the same non-blocking
//! primitive, but only task code may run the engine's error hook. The
//! context is chosen statically by the caller instead of being detected at
//! run time.

mod sealed {
    pub trait Sealed {}
}

/// Where an enqueue is issued from
pub trait ExecContext: sealed::Sealed {
    /// Whether a rejected enqueue may invoke the error hook and log
    const MAY_REPORT: bool;
}

/// Thread/task context: failures are reported to the error hook
pub enum TaskContext {}

/// Interrupt context: failures are only visible through the return value
pub enum InterruptContext {}

impl sealed::Sealed for TaskContext {}
impl sealed::Sealed for InterruptContext {}

impl ExecContext for TaskContext {
    const MAY_REPORT: bool = true;
}

impl ExecContext for InterruptContext {
    const MAY_REPORT: bool = false;
}
