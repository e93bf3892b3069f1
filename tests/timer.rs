use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use horus::runtime::block_on;
use horus::task::spawn;
use horus::time::{sleep, sleep_until, Duration};

#[test]
fn sleep_waits_at_least_the_duration() {
    block_on(async {
        let start = Instant::now();
        let duration = Duration::from_millis(40);
        sleep(duration).await;
        assert!(start.elapsed() >= duration);
    })
    .unwrap();
}

#[test]
fn sleep_until_a_past_deadline_is_immediate() {
    block_on(async {
        let start = Instant::now();
        sleep_until(start - Duration::from_millis(5)).await;
        assert!(start.elapsed() < Duration::from_millis(5));
    })
    .unwrap();
}

#[test]
fn two_sleeps_fire_in_deadline_order() {
    block_on(async {
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = spawn({
            let order = order.clone();
            async move {
                sleep(Duration::from_millis(10)).await;
                order.borrow_mut().push(1);
            }
        });
        let second = spawn({
            let order = order.clone();
            async move {
                sleep(Duration::from_millis(25)).await;
                order.borrow_mut().push(2);
            }
        });
        first.await;
        second.await;
        assert_eq!(*order.borrow(), vec![1, 2]);
    })
    .unwrap();
}

// Registration order must not matter: three sleeps registered longest
// first still resume shortest first.
#[test]
fn timers_fire_by_deadline_not_registration() {
    block_on(async {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for &ms in &[30u64, 20, 10] {
            let order = order.clone();
            handles.push(spawn(async move {
                sleep(Duration::from_millis(ms)).await;
                order.borrow_mut().push(ms);
            }));
        }
        for handle in handles {
            handle.await;
        }
        assert_eq!(*order.borrow(), vec![10, 20, 30]);
    })
    .unwrap();
}

#[test]
fn concurrent_sleeps_share_the_wait() {
    block_on(async {
        let start = Instant::now();
        let duration = Duration::from_millis(50);
        let sleeps: Vec<_> = (0..4)
            .map(|_| spawn(sleep(duration)))
            .collect();
        for handle in sleeps {
            handle.await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= duration);
        // four concurrent sleeps take one period, not four
        assert!(elapsed < duration * 3, "{elapsed:?}");
    })
    .unwrap();
}
