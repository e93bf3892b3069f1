use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use crate::collections::Ring;

/// An async counting semaphore.
///
/// Holds a number of permits handed out to tasks through
/// [`acquire`](Semaphore::acquire). When no permit is available the
/// acquiring task parks in a FIFO wait queue; [`release`](Semaphore::release)
/// hands the permit directly to the oldest live waiter, so a task that
/// started waiting first cannot be overtaken by a later acquirer.
///
/// [`permit`](Semaphore::permit) is the scope-guard variant: the permit is
/// released when the returned guard drops.
///
/// ```
/// # horus::block_on(async {
/// use horus::sync::Semaphore;
///
/// let semaphore = Semaphore::new(2);
/// let permit = semaphore.permit().await;
/// assert_eq!(semaphore.available_permits(), 1);
/// drop(permit);
/// assert_eq!(semaphore.available_permits(), 2);
/// # }).unwrap();
/// ```
pub struct Semaphore {
    permits: Cell<i32>,
    waiters: RefCell<Ring<Weak<WaitNode>>>,
}

struct WaitNode {
    granted: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl Semaphore {
    /// Creates a semaphore with `permits` initial permits.
    ///
    /// # Panics
    /// Panics if `permits` is negative.
    #[must_use]
    pub fn new(permits: i32) -> Semaphore {
        assert!(permits >= 0, "cannot create a semaphore with negative permits");
        Semaphore {
            permits: Cell::new(permits),
            waiters: RefCell::new(Ring::new()),
        }
    }

    /// The number of permits currently available.
    #[must_use]
    pub fn available_permits(&self) -> i32 {
        self.permits.get()
    }

    /// Waits until a permit is available and takes it. The permit is held
    /// until [`release`](Semaphore::release) is called.
    pub fn acquire(&self) -> Acquire<'_> {
        Acquire {
            semaphore: self,
            node: None,
        }
    }

    /// Acquires a permit tied to the returned guard; dropping the guard
    /// releases it.
    pub async fn permit(&self) -> Permit<'_> {
        self.acquire().await;
        Permit { semaphore: self }
    }

    /// Returns one permit. If a task is waiting, the permit is handed to
    /// the oldest waiter instead of becoming available to all comers.
    pub fn release(&self) {
        let mut waiters = self.waiters.borrow_mut();
        // Nodes whose futures were dropped linger in the queue; skip them.
        while let Some(node) = waiters.pop_front() {
            let Some(node) = node.upgrade() else { continue };
            node.granted.set(true);
            if let Some(waker) = node.waker.borrow_mut().take() {
                waker.wake();
            }
            return;
        }
        self.permits.set(self.permits.get() + 1);
    }
}

/// Future returned by [`Semaphore::acquire`].
pub struct Acquire<'a> {
    semaphore: &'a Semaphore,
    node: Option<Rc<WaitNode>>,
}

impl Future for Acquire<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if let Some(node) = &this.node {
            if !node.granted.get() {
                *node.waker.borrow_mut() = Some(cx.waker().clone());
                return Poll::Pending;
            }
            // consume the handoff so drop does not re-release it
            this.node = None;
            return Poll::Ready(());
        }
        let permits = this.semaphore.permits.get();
        if permits > 0 {
            this.semaphore.permits.set(permits - 1);
            return Poll::Ready(());
        }
        let node = Rc::new(WaitNode {
            granted: Cell::new(false),
            waker: RefCell::new(Some(cx.waker().clone())),
        });
        this.semaphore
            .waiters
            .borrow_mut()
            .push_back(Rc::downgrade(&node));
        this.node = Some(node);
        Poll::Pending
    }
}

impl Drop for Acquire<'_> {
    fn drop(&mut self) {
        // A permit handed to this waiter but never observed must go back,
        // otherwise it is lost.
        if let Some(node) = self.node.take() {
            if node.granted.get() {
                self.semaphore.release();
            }
        }
    }
}

/// Permit acquired from [`Semaphore::permit`]; released on drop.
#[must_use = "the permit is released as soon as the guard is dropped"]
pub struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

#[cfg(test)]
mod tests {
    use super::Semaphore;
    use crate::runtime::block_on;
    use crate::task::{spawn, yield_now};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn uncontended_acquire_is_immediate() {
        block_on(async {
            let semaphore = Semaphore::new(1);
            semaphore.acquire().await;
            assert_eq!(semaphore.available_permits(), 0);
            semaphore.release();
            assert_eq!(semaphore.available_permits(), 1);
        })
        .unwrap();
    }

    #[test]
    fn waiters_are_served_in_fifo_order() {
        block_on(async {
            let semaphore = Rc::new(Semaphore::new(0));
            let order = Rc::new(RefCell::new(Vec::new()));
            let mut handles = Vec::new();
            for i in 0..3 {
                let semaphore = semaphore.clone();
                let order = order.clone();
                handles.push(spawn(async move {
                    semaphore.acquire().await;
                    order.borrow_mut().push(i);
                }));
            }
            // let all three park before releasing
            yield_now().await;
            for _ in 0..3 {
                semaphore.release();
            }
            for handle in handles {
                handle.await;
            }
            assert_eq!(*order.borrow(), vec![0, 1, 2]);
        })
        .unwrap();
    }

    #[test]
    fn release_prefers_waiter_over_permit_count() {
        block_on(async {
            let semaphore = Rc::new(Semaphore::new(0));
            let waiter = spawn({
                let semaphore = semaphore.clone();
                async move { semaphore.acquire().await }
            });
            yield_now().await;
            semaphore.release();
            // the permit went straight to the waiter, never to the pool
            assert_eq!(semaphore.available_permits(), 0);
            waiter.await;
        })
        .unwrap();
    }

    #[test]
    fn cancelled_waiter_is_skipped() {
        block_on(async {
            let semaphore = Rc::new(Semaphore::new(0));
            let cancelled = spawn({
                let semaphore = semaphore.clone();
                async move { semaphore.acquire().await }
            });
            let survivor = spawn({
                let semaphore = semaphore.clone();
                async move { semaphore.acquire().await }
            });
            yield_now().await;
            drop(cancelled);
            semaphore.release();
            survivor.await;
            assert_eq!(semaphore.available_permits(), 0);
        })
        .unwrap();
    }

    #[test]
    fn permit_guard_releases_on_drop() {
        block_on(async {
            let semaphore = Semaphore::new(1);
            {
                let _permit = semaphore.permit().await;
                assert_eq!(semaphore.available_permits(), 0);
            }
            assert_eq!(semaphore.available_permits(), 1);
        })
        .unwrap();
    }
}
