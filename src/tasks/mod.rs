//! Background Tasks Module
//!
//! Timer primitives and the recurring jobs the cache runs while started.
//!
//! # Tasks
//! - GC: evicts expired and overflowing entries at a fixed period
//! - Revalidation: refreshes keys whose strategy says they are due

mod gc;
mod revalidation;
mod timer;

pub use gc::spawn_gc_task;
pub use revalidation::spawn_revalidation_task;
pub use timer::{spawn_deferred, spawn_recurring};
