use horus::pool::Pool;

// Acquire a thousand handles and drop them all: every slot must come
// back, and no block is ever returned to the allocator.
#[test]
fn leak_audit_drop() {
    let pool: Pool<u64> = Pool::new();
    let handles: Vec<_> = (0..1024).map(|i| pool.acquire(i)).collect();
    assert_eq!(pool.used_size(), 1024);
    let allocated = pool.allocated_size();
    drop(handles);
    assert_eq!(pool.used_size(), 0);
    assert_eq!(pool.allocated_size(), allocated);
}

// Disowned slots stay used until their pointers are offered back.
#[test]
fn leak_audit_disown() {
    let pool: Pool<u64> = Pool::new();
    let ptrs: Vec<_> = (0..1024).map(|i| pool.acquire(i).disown()).collect();
    assert_eq!(pool.used_size(), 1024);
    for ptr in ptrs {
        pool.offer(ptr);
    }
    assert_eq!(pool.used_size(), 0);
}

#[test]
fn values_survive_while_disowned() {
    let pool: Pool<String, 8> = Pool::new();
    let ptr = pool.acquire("kept alive".to_string()).disown();
    // Safety(test): the slot is still used, nobody else touches it.
    assert_eq!(unsafe { &*ptr }, "kept alive");
    pool.offer(ptr);
}
