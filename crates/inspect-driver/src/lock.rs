//! Process-wide engine lock
//!
//! The engine and its plugins are not reentrant. Every driver operation,
//! on every driver in the process, runs while holding this lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Acquire the engine lock, recovering it if a holder panicked
pub(crate) fn acquire() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}
