use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::Context;

use crate::collections::Ring;
use crate::hasher::NoopHasher;
use crate::runtime::waker::task_waker;
use crate::task::{RawTask, TaskRepr};

/// The task arena and scheduler for one runtime.
///
/// Tasks live in `tasks`, keyed by id; `ready` is the FIFO of ids that
/// should be polled at the next opportunity. A task's waker carries its id,
/// so waking from anywhere on the thread is a queue push.
pub(crate) struct Executor {
    tasks: RefCell<HashMap<usize, Pin<Rc<dyn RawTask>>, NoopHasher>>,
    ready: RefCell<Ring<usize>>,
    next_id: Cell<usize>,
    /// set by the main waker; checked by the event loop every pass
    pub main_awoken: Cell<bool>,
}

impl Executor {
    pub fn new() -> Executor {
        Executor {
            tasks: RefCell::new(HashMap::with_capacity_and_hasher(
                64,
                NoopHasher::default(),
            )),
            ready: RefCell::new(Ring::with_capacity(64)),
            next_id: Cell::new(0),
            main_awoken: Cell::new(false),
        }
    }

    /// Registers a task and queues it for its first poll.
    pub fn spawn<F>(&self, future: F) -> Pin<Rc<TaskRepr<F>>>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let task = Rc::pin(TaskRepr::new(future));
        let dyn_task: Pin<Rc<dyn RawTask>> = task.clone();
        self.tasks.borrow_mut().insert(id, dyn_task);
        self.ready.borrow_mut().push_back(id);
        task
    }

    /// Queues a task for resumption. Called from task wakers.
    pub fn wake(&self, id: usize) {
        self.ready.borrow_mut().push_back(id);
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.borrow().is_empty()
    }

    /// Resumes every task that was ready when the pass started. Tasks that
    /// wake (or spawn) during the pass run on the next one, so a task that
    /// yields in a loop cannot starve the reactor.
    pub fn poll_ready(&self) {
        let queued = self.ready.borrow().len();
        for _ in 0..queued {
            let id = self.ready.borrow_mut().pop_front();
            let Some(id) = id else { break };
            // a task may have completed and been removed after its last wake
            let task = self.tasks.borrow().get(&id).cloned();
            let Some(task) = task else { continue };
            let waker = task_waker(id);
            let cx = &mut Context::from_waker(&waker);
            if task.as_ref().poll(cx).is_ready() {
                self.tasks.borrow_mut().remove(&id);
            }
        }
    }
}
