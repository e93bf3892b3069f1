use std::cell::{Cell, RefCell};
use std::panic::catch_unwind;
use std::rc::Rc;

use horus::runtime::block_on;
use horus::task::{detach, spawn, yield_now};

async fn stall() {
    for _ in 0..10 {
        yield_now().await;
    }
}

#[test]
fn test_spawn() {
    let spawned = Rc::new(Cell::new(false));
    block_on(async {
        let spawned = spawned.clone();
        let value = spawn(async move {
            spawned.set(true);
            10
        })
        .await;
        assert_eq!(value, 10);
    })
    .unwrap();
    assert!(spawned.get());
}

#[test]
fn tasks_run_in_spawn_order() {
    block_on(async {
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            detach(async move {
                order.borrow_mut().push(i);
            });
        }
        stall().await;
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
    })
    .unwrap();
}

#[test]
fn spawn_can_be_joined() {
    let mut joined = false;
    block_on(async {
        let number = spawn(async {
            yield_now().await;
            1
        })
        .await;
        assert_eq!(number, 1);
        joined = true;
    })
    .unwrap();
    assert!(joined);
}

#[test]
fn join_handles_resolve_out_of_order() {
    block_on(async {
        let slow = spawn(async {
            stall().await;
            "slow"
        });
        let fast = spawn(async { "fast" });
        assert_eq!(fast.await, "fast");
        assert_eq!(slow.await, "slow");
    })
    .unwrap();
}

#[test]
fn dropping_a_join_handle_cancels_the_task() {
    struct SetOnDrop(Rc<Cell<bool>>);
    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    let cancelled = Rc::new(Cell::new(false));
    let ran = Rc::new(Cell::new(false));
    block_on(async {
        let witness = SetOnDrop(cancelled.clone());
        let ran = ran.clone();
        let handle = spawn(async move {
            let _witness = witness;
            stall().await;
            ran.set(true);
        });
        yield_now().await;
        drop(handle);
        stall().await;
    })
    .unwrap();
    assert!(cancelled.get(), "the task's future was dropped");
    assert!(!ran.get(), "the task never reached its end");
}

#[test]
fn detached_tasks_outlive_their_spawner() {
    let finished = Rc::new(Cell::new(false));
    block_on(async {
        let finished = finished.clone();
        spawn(async move {
            yield_now().await;
            finished.set(true);
        })
        .detach();
        stall().await;
    })
    .unwrap();
    assert!(finished.get());
}

// A panic in a joined task must surface in the joiner, exactly once, with
// the original payload.
#[test]
fn joining_a_panicked_task_rethrows() {
    let result = catch_unwind(|| {
        block_on(async {
            spawn(async { panic!("tagged panic payload") }).await;
        })
        .unwrap();
    });
    let payload = result.unwrap_err();
    let message = payload
        .downcast_ref::<&str>()
        .expect("the original payload is preserved");
    assert!(message.contains("tagged panic payload"));
}

#[test]
fn panics_cross_nested_joins() {
    let result = catch_unwind(|| {
        block_on(async {
            spawn(async {
                spawn(async { panic!("child panic") }).await;
            })
            .await;
        })
        .unwrap();
    });
    assert!(result.is_err());
}

#[test]
fn spawning_from_a_dropped_task_works() {
    struct SpawnOnDrop(Rc<Cell<bool>>);
    impl Drop for SpawnOnDrop {
        fn drop(&mut self) {
            let flag = self.0.clone();
            detach(async move {
                yield_now().await;
                flag.set(true);
            });
        }
    }

    let flag = Rc::new(Cell::new(false));
    block_on(async {
        let witness = SpawnOnDrop(flag.clone());
        let handle = spawn(async move {
            let _witness = witness;
            stall().await;
        });
        yield_now().await;
        handle.abort();
        stall().await;
    })
    .unwrap();
    assert!(flag.get());
}

#[test]
fn block_on_returns_the_future_output() {
    let value = block_on(async { 42 }).unwrap();
    assert_eq!(value, 42);
}

#[test]
fn runtimes_cannot_be_nested() {
    let result = catch_unwind(|| {
        block_on(async {
            horus::runtime::block_on(async {}).unwrap();
        })
        .unwrap();
    });
    assert!(result.is_err());
}
