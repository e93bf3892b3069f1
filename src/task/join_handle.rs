use super::RawTask;
use std::future::Future;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{ready, Context, Poll};

/// A handle to a spawned task.
///
/// Awaiting the handle yields the task's output. The handle owns the
/// task's fate: dropping it cancels the task, and
/// [`detach`](JoinHandle::detach) gives the task up to run unsupervised.
/// Both hand the task over, so a handle that was aborted or detached no
/// longer refers to anything.
///
/// # Panics
/// Awaiting a task that panicked re-raises the panic in the awaiter.
#[must_use = "dropping a JoinHandle cancels the task; detach() it to let it run"]
pub struct JoinHandle<T> {
    /// `None` once the task was aborted or detached.
    task: Option<Pin<Rc<dyn RawTask>>>,
    _output: PhantomData<T>,
}

impl<T> JoinHandle<T> {
    /// # Safety
    /// `task` must have been spawned from a future with output type `T`.
    pub(crate) unsafe fn new(task: Pin<Rc<dyn RawTask>>) -> JoinHandle<T> {
        JoinHandle {
            task: Some(task),
            _output: PhantomData,
        }
    }

    /// Lets the task outlive this handle instead of being cancelled when
    /// the handle drops. A panic in a detached task aborts the process.
    pub fn detach(mut self) {
        if let Some(task) = self.task.take() {
            task.as_ref().detach();
        }
    }

    /// Cancels the task. The future is dropped at the next scheduling
    /// opportunity; a task cannot abort itself.
    pub fn abort(mut self) {
        if let Some(task) = self.task.take() {
            task.as_ref().abort();
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let task = self
            .task
            .as_ref()
            .expect("polled a JoinHandle that no longer owns its task")
            .as_ref();
        ready!(task.poll_join(cx));
        let mut output = MaybeUninit::<T>::uninit();
        // Safety: a JoinHandle<T> can only be constructed over a task
        // whose future yields T, `output` is uninitialized storage for
        // one, and poll_join just returned Ready.
        unsafe {
            task.take_output(output.as_mut_ptr().cast());
            Poll::Ready(output.assume_init())
        }
    }
}

impl<T> Drop for JoinHandle<T> {
    fn drop(&mut self) {
        // a handle that still owns its task takes the task down with it
        let Some(task) = self.task.take() else { return };
        task.as_ref().abort();
    }
}
