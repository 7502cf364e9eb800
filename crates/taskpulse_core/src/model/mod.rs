//! Task domain model.
//!
//! # Responsibility
//! - Define the task record shared by persistence, scheduling and transport.
//! - Own the field-level invariants (title rules, time-of-day format,
//!   `notified` reset on re-time).
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - `notified` is cleared whenever `scheduled_time` changes.

pub mod task;
pub mod time;
