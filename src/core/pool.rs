// Process-wide buffer pools.
//
// Two free lists are shared by all parser invocations: scratch byte buffers
// for quote unescaping, and field-span buffers for row materialization.
// Acquire hands out a cleared buffer that keeps its previous capacity.
// Release happens in the guard's Drop, so buffers go back on every exit
// path, including early returns on parse errors.
//
// Released buffers are retained only while their capacity stays under a
// bound; oversized ones are dropped instead of parked on the free list.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::core::field::FieldSpan;

/// Max buffers parked on one free list.
const MAX_POOLED: usize = 32;

/// A bounded free list of `Vec<E>` buffers.
pub struct Pool<E> {
    free: Mutex<Vec<Vec<E>>>,
    /// Capacity bound (in elements) above which a released buffer is dropped.
    max_retained: usize,
    outstanding: AtomicUsize,
}

impl<E> Pool<E> {
    pub const fn new(max_retained: usize) -> Self {
        Pool {
            free: Mutex::new(Vec::new()),
            max_retained,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Take a buffer from the pool, or a fresh one if the pool is empty.
    /// The buffer is empty; its capacity is whatever it retained.
    pub fn acquire(&self) -> PooledVec<'_, E> {
        let vec = self.lock_free().pop().unwrap_or_default();
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        PooledVec { vec, pool: self }
    }

    /// Number of buffers currently checked out.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn release(&self, mut vec: Vec<E>) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        if vec.capacity() == 0 || vec.capacity() > self.max_retained {
            return;
        }
        vec.clear();
        let mut free = self.lock_free();
        if free.len() < MAX_POOLED {
            free.push(vec);
        }
    }

    fn lock_free(&self) -> MutexGuard<'_, Vec<Vec<E>>> {
        // A panic while holding the lock leaves the free list intact, so a
        // poisoned pool is still usable.
        match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// RAII handle to a pooled buffer. Derefs to the underlying `Vec`.
pub struct PooledVec<'a, E> {
    vec: Vec<E>,
    pool: &'a Pool<E>,
}

impl<E> Deref for PooledVec<'_, E> {
    type Target = Vec<E>;

    fn deref(&self) -> &Vec<E> {
        &self.vec
    }
}

impl<E> DerefMut for PooledVec<'_, E> {
    fn deref_mut(&mut self) -> &mut Vec<E> {
        &mut self.vec
    }
}

impl<E> Drop for PooledVec<'_, E> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.vec));
    }
}

/// Scratch byte buffers used while unescaping doubled quotes.
static SCRATCH: Pool<u8> = Pool::new(64 * 1024);

/// Field-span buffers reused across record materializations.
static SPANS: Pool<FieldSpan> = Pool::new(4096);

pub fn scratch_pool() -> &'static Pool<u8> {
    &SCRATCH
}

pub(crate) fn span_pool() -> &'static Pool<FieldSpan> {
    &SPANS
}
