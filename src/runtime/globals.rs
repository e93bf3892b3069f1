use super::Runtime;
use std::cell::RefCell;

thread_local! {
    /// The runtime currently entered on this thread, if any. `spawn`,
    /// timers and I/O submissions resolve against it.
    pub(crate) static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}
