//! A typed object pool handing out owning slot handles.
//!
//! Storage is a chain of fixed-size blocks; each block tracks its slots
//! with a used bitmap and a free count. Blocks are only ever added, never
//! returned to the allocator, so a slot's address stays valid for the
//! pool's whole lifetime.

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::hasher::NoopHasher;
use crate::sync::SpinLock;

/// A slab pool of `T`s in blocks of `B` slots.
///
/// [`acquire`](Pool::acquire) places a value into a free slot and returns an
/// owning [`Handle`]; dropping the handle destroys the value and frees the
/// slot. [`Handle::disown`] opts out of the automatic return and yields the
/// raw slot pointer, to be given back later through
/// [`offer`](Pool::offer).
///
/// All operations take `&self`: the pool is internally synchronised with a
/// spinlock, mirroring how briefly each operation holds it.
pub struct Pool<T, const B: usize = 64> {
    lock: SpinLock,
    inner: UnsafeCell<Inner<T, B>>,
}

struct Inner<T, const B: usize> {
    blocks: Vec<Box<Block<T, B>>>,
    /// total free slots across all blocks
    free: usize,
    /// reverse map from a handed-out slot to its (block, slot) location
    owners: HashMap<usize, (usize, usize), NoopHasher>,
}

struct Block<T, const B: usize> {
    used: [bool; B],
    free: usize,
    slots: [UnsafeCell<MaybeUninit<T>>; B],
}

impl<T, const B: usize> Block<T, B> {
    fn new() -> Box<Block<T, B>> {
        Box::new(Block {
            used: [false; B],
            free: B,
            slots: std::array::from_fn(|_| UnsafeCell::new(MaybeUninit::uninit())),
        })
    }

    fn slot_ptr(&self, slot: usize) -> *mut T {
        self.slots[slot].get().cast::<T>()
    }
}

impl<T, const B: usize> Pool<T, B> {
    /// Creates an empty pool. The first block is allocated lazily by the
    /// first [`acquire`](Pool::acquire).
    #[must_use]
    pub fn new() -> Pool<T, B> {
        assert!(B > 0, "pool block size must be nonzero");
        Pool {
            lock: SpinLock::new(),
            inner: UnsafeCell::new(Inner {
                blocks: Vec::new(),
                free: 0,
                owners: HashMap::with_hasher(NoopHasher::default()),
            }),
        }
    }

    /// Creates a pool with `blocks` blocks preallocated.
    #[must_use]
    pub fn with_blocks(blocks: usize) -> Pool<T, B> {
        let pool = Pool::new();
        {
            let _guard = pool.lock.lock();
            // Safety: the spinlock is held.
            let inner = unsafe { &mut *pool.inner.get() };
            for _ in 0..blocks {
                inner.blocks.push(Block::new());
                inner.free += B;
            }
        }
        pool
    }

    /// Moves `value` into a free slot and returns the owning handle.
    /// Allocates one more block when every existing slot is taken.
    pub fn acquire(&self, value: T) -> Handle<'_, T, B> {
        let _guard = self.lock.lock();
        // Safety: the spinlock is held.
        let inner = unsafe { &mut *self.inner.get() };

        let (block_idx, slot_idx) = if inner.free == 0 {
            inner.blocks.push(Block::new());
            inner.free += B;
            (inner.blocks.len() - 1, 0)
        } else {
            inner
                .blocks
                .iter()
                .enumerate()
                .filter(|(_, block)| block.free > 0)
                .find_map(|(b, block)| {
                    block.used.iter().position(|used| !used).map(|s| (b, s))
                })
                .expect("free count is nonzero but no free slot was found")
        };

        let block = &mut inner.blocks[block_idx];
        block.used[slot_idx] = true;
        block.free -= 1;
        inner.free -= 1;
        let ptr = block.slot_ptr(slot_idx);
        // Safety: the slot was just marked used and belongs to this pool.
        unsafe { ptr.write(value) };
        inner.owners.insert(ptr as usize, (block_idx, slot_idx));

        Handle {
            pool: self,
            // Safety: slot pointers come out of a live Box allocation.
            ptr: unsafe { NonNull::new_unchecked(ptr) },
        }
    }

    /// Returns a slot previously obtained from this pool, destroying the
    /// value it holds.
    ///
    /// # Panics
    /// Panics if `ptr` was not handed out by this pool (or was already
    /// offered back).
    pub fn offer(&self, ptr: *mut T) {
        let _guard = self.lock.lock();
        // Safety: the spinlock is held.
        let inner = unsafe { &mut *self.inner.get() };
        let Some((block_idx, slot_idx)) = inner.owners.remove(&(ptr as usize)) else {
            panic!("offered a pointer that was not allocated in this pool");
        };
        let block = &mut inner.blocks[block_idx];
        debug_assert!(block.used[slot_idx]);
        block.used[slot_idx] = false;
        block.free += 1;
        inner.free += 1;
        // Safety: the slot was used, so it holds a live value; the bitmap
        // was already cleared so it will not be dropped again.
        unsafe { std::ptr::drop_in_place(block.slot_ptr(slot_idx)) };
    }

    /// The number of slots currently handed out.
    #[must_use]
    pub fn used_size(&self) -> usize {
        let _guard = self.lock.lock();
        // Safety: the spinlock is held.
        let inner = unsafe { &*self.inner.get() };
        inner.blocks.len() * B - inner.free
    }

    /// Bytes held by the pool's blocks. Never shrinks: blocks are not
    /// returned to the allocator.
    #[must_use]
    pub fn allocated_size(&self) -> usize {
        let _guard = self.lock.lock();
        // Safety: the spinlock is held.
        let inner = unsafe { &*self.inner.get() };
        inner.blocks.len() * std::mem::size_of::<Block<T, B>>()
    }

    /// The number of slots per block.
    #[must_use]
    pub const fn block_size() -> usize {
        B
    }
}

impl<T: PartialEq, const B: usize> Pool<T, B> {
    /// Scans the used slots for one equal to `value`.
    #[must_use]
    pub fn find(&self, value: &T) -> Option<NonNull<T>> {
        let _guard = self.lock.lock();
        // Safety: the spinlock is held.
        let inner = unsafe { &*self.inner.get() };
        for block in &inner.blocks {
            for slot in 0..B {
                if !block.used[slot] {
                    continue;
                }
                let ptr = block.slot_ptr(slot);
                // Safety: the slot is marked used, so it holds a live value.
                if unsafe { &*ptr } == value {
                    // Safety: slot pointers are never null.
                    return Some(unsafe { NonNull::new_unchecked(ptr) });
                }
            }
        }
        None
    }
}

impl<T, const B: usize> Default for Pool<T, B> {
    fn default() -> Pool<T, B> {
        Pool::new()
    }
}

impl<T, const B: usize> Drop for Pool<T, B> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        for block in &mut inner.blocks {
            for slot in 0..B {
                if block.used[slot] {
                    // Safety: used slots hold live values, dropped exactly
                    // once here.
                    unsafe { std::ptr::drop_in_place(block.slot_ptr(slot)) };
                }
            }
        }
    }
}

impl<T, const B: usize> fmt::Debug for Pool<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("used", &self.used_size())
            .field("block_size", &B)
            .finish()
    }
}

/// An owning handle to a pool slot.
///
/// Dropping the handle destroys the value and returns the slot;
/// [`disown`](Handle::disown) suppresses the return and yields the raw slot
/// pointer instead.
pub struct Handle<'a, T, const B: usize = 64> {
    pool: &'a Pool<T, B>,
    ptr: NonNull<T>,
}

impl<T, const B: usize> Handle<'_, T, B> {
    /// Releases ownership without returning the slot. The caller is
    /// responsible for eventually giving the pointer back through
    /// [`Pool::offer`].
    #[must_use]
    pub fn disown(self) -> *mut T {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }
}

impl<T, const B: usize> Deref for Handle<'_, T, B> {
    type Target = T;
    fn deref(&self) -> &T {
        // Safety: the handle owns a used slot for as long as it lives.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, const B: usize> DerefMut for Handle<'_, T, B> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the handle owns a used slot for as long as it lives.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T, const B: usize> Drop for Handle<'_, T, B> {
    fn drop(&mut self) {
        self.pool.offer(self.ptr.as_ptr());
    }
}
