/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

/// The process-wide pool used by fetchers which aren't given one explicitly.
///
/// This pool is created on first use and lives until the process exits.
static GLOBAL_POOL: Lazy<Arc<BufferPool>> = Lazy::new(|| Arc::new(BufferPool::default()));

/// A thread-safe pool of reusable byte buffers.
///
/// Buffers are checked out with [`acquire`] and returned to the pool automatically when the
/// returned [`PooledBuffer`] is dropped. The pool holds no state other than idle buffers.
///
/// [`acquire`]: crate::fetch::BufferPool::acquire
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,

    /// The maximum number of idle buffers to keep.
    max_idle: usize,

    /// Buffers with a larger capacity than this are dropped instead of being kept.
    max_capacity: usize,
}

impl BufferPool {
    /// The default maximum number of idle buffers.
    pub const DEFAULT_MAX_IDLE: usize = 64;

    /// The default maximum capacity of a kept buffer.
    pub const DEFAULT_MAX_CAPACITY: usize = 16 * 1024 * 1024;

    /// Create a new empty pool which keeps at most `max_idle` idle buffers of at most
    /// `max_capacity` bytes each.
    pub fn new(max_idle: usize, max_capacity: usize) -> Self {
        BufferPool {
            buffers: Mutex::new(Vec::new()),
            max_idle,
            max_capacity,
        }
    }

    /// Return the process-wide pool.
    pub fn global() -> Arc<BufferPool> {
        Arc::clone(&GLOBAL_POOL)
    }

    /// Check out an empty buffer from the pool.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buffer = self
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        PooledBuffer {
            pool: self,
            buffer,
        }
    }

    /// Return the number of idle buffers in the pool.
    pub fn idle(&self) -> usize {
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, mut buffer: Vec<u8>) {
        if buffer.capacity() > self.max_capacity {
            return;
        }
        buffer.clear();
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if buffers.len() < self.max_idle {
            buffers.push(buffer);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(Self::DEFAULT_MAX_IDLE, Self::DEFAULT_MAX_CAPACITY)
    }
}

/// A buffer checked out from a [`BufferPool`].
///
/// The buffer is returned to the pool when this value is dropped.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: Vec<u8>,
}

impl<'a> Deref for PooledBuffer<'a> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<'a> DerefMut for PooledBuffer<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<'a> Drop for PooledBuffer<'a> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
