use std::sync::atomic::{AtomicBool, Ordering};

/// A busy-waiting mutual exclusion lock.
///
/// Intended for critical sections of a few instructions where parking a
/// thread costs more than spinning. [`lock`](SpinLock::lock) returns a
/// guard; the lock is released when the guard drops.
#[derive(Debug)]
pub struct SpinLock {
    locked: AtomicBool,
}

/// Releases the owning [`SpinLock`] on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl SpinLock {
    #[must_use]
    pub const fn new() -> SpinLock {
        SpinLock {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until the lock is acquired.
    pub fn lock(&self) -> SpinGuard<'_> {
        while self.locked.swap(true, Ordering::Acquire) {
            std::hint::spin_loop();
        }
        SpinGuard { lock: self }
    }

    /// Acquires the lock only if it is free.
    pub fn try_lock(&self) -> Option<SpinGuard<'_>> {
        if self.locked.swap(true, Ordering::Acquire) {
            return None;
        }
        Some(SpinGuard { lock: self })
    }
}

impl Default for SpinLock {
    fn default() -> SpinLock {
        SpinLock::new()
    }
}

impl Drop for SpinLock {
    fn drop(&mut self) {
        if cfg!(debug_assertions) && *self.locked.get_mut() {
            log::warn!("spinlock destroyed while still held");
        }
    }
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::SpinLock;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn guard_releases_on_drop() {
        let lock = SpinLock::new();
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn excludes_across_threads() {
        struct Counter {
            lock: SpinLock,
            value: std::cell::UnsafeCell<u64>,
        }
        // Safety: `value` is only touched while `lock` is held.
        unsafe impl Sync for Counter {}

        let counter = Arc::new(Counter {
            lock: SpinLock::new(),
            value: std::cell::UnsafeCell::new(0),
        });
        let mut handles = Vec::new();
        for _ in 0..4 {
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    let _guard = counter.lock.lock();
                    // Safety: the spinlock serialises access.
                    unsafe { *counter.value.get() += 1 };
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let _guard = counter.lock.lock();
        // Safety: the spinlock is held.
        assert_eq!(unsafe { *counter.value.get() }, 40_000);
    }
}
