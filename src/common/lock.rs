// src/common/lock.rs

use core::sync::atomic::{AtomicBool, Ordering};

use super::hal_traits::AcquisitionLock;

/// Compare-and-set acquisition lock over an `AtomicBool`.
///
/// Suitable wherever the platform provides atomics; schedulers with native
/// semaphores can implement [`AcquisitionLock`] on their own primitive
/// instead.
#[derive(Debug, Default)]
pub struct AtomicLock {
    held: AtomicBool,
}

impl AtomicLock {
    pub const fn new() -> Self {
        AtomicLock {
            held: AtomicBool::new(false),
        }
    }
}

impl AcquisitionLock for AtomicLock {
    fn try_acquire(&mut self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn release(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_exclusive() {
        let mut lock = AtomicLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        lock.release();
        assert!(lock.try_acquire());
    }

    #[test]
    fn test_release_without_hold_is_harmless() {
        let mut lock = AtomicLock::new();
        lock.release();
        assert!(lock.try_acquire());
    }
}
