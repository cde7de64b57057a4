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

//! Reliable retrieval of chunk content from replica locations.
//!
//! A chunk's content is stored at one or more replica locations. A [`LookupChunk`] resolves a
//! [`ChunkId`] to those locations and a [`ReadLocation`] performs a single streamed read against
//! one of them. Both are implemented outside this crate. [`ChunkFetcher`] combines the two and
//! retries failed reads across replicas with a growing delay between rounds, so transient faults
//! in individual replicas are never surfaced to the caller.
//!
//! [`ChunkId`]: crate::chunk::ChunkId

use std::sync::Arc;

use static_assertions::assert_obj_safe;

pub use self::config::{Backoff, FetchConfig, BACKOFF_MULTIPLIER};
pub use self::fetcher::ChunkFetcher;
pub use self::pool::{BufferPool, PooledBuffer};
pub use self::transport::{ReadRequest, TransportError};

use crate::chunk::ChunkId;

mod config;
mod dedup;
mod fetcher;
mod pool;
mod transport;

/// A function which resolves a chunk to the locations of its replicas.
///
/// Locations are returned in the order they should be tried. Any resilience needed to perform
/// the lookup itself is the responsibility of the implementation; the fetcher never retries a
/// failed lookup.
pub trait LookupChunk: Send + Sync {
    /// Return the locations of the replicas of the chunk with the given `id`.
    fn lookup(&self, id: &ChunkId) -> anyhow::Result<Vec<String>>;
}

assert_obj_safe!(LookupChunk);

impl<F> LookupChunk for F
where
    F: Fn(&ChunkId) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    fn lookup(&self, id: &ChunkId) -> anyhow::Result<Vec<String>> {
        self(id)
    }
}

/// A transport which reads chunk content from a single replica location.
pub trait ReadLocation: Send + Sync {
    /// Read chunk content from `location` as described by `request`.
    ///
    /// Decoded content is passed to `on_data` as it arrives. Every call starts delivering from the
    /// requested offset; a read never resumes where a previous call stopped.
    ///
    /// If this returns `Err`, the [`TransportError`] says whether the read is worth retrying.
    fn read(
        &self,
        location: &str,
        request: &ReadRequest<'_>,
        on_data: &mut dyn FnMut(&[u8]),
    ) -> Result<(), TransportError>;
}

assert_obj_safe!(ReadLocation);

impl<T: ReadLocation + ?Sized> ReadLocation for &T {
    fn read(
        &self,
        location: &str,
        request: &ReadRequest<'_>,
        on_data: &mut dyn FnMut(&[u8]),
    ) -> Result<(), TransportError> {
        (**self).read(location, request, on_data)
    }
}

impl<T: ReadLocation + ?Sized> ReadLocation for Arc<T> {
    fn read(
        &self,
        location: &str,
        request: &ReadRequest<'_>,
        on_data: &mut dyn FnMut(&[u8]),
    ) -> Result<(), TransportError> {
        self.as_ref().read(location, request, on_data)
    }
}

impl ReadLocation for Box<dyn ReadLocation> {
    fn read(
        &self,
        location: &str,
        request: &ReadRequest<'_>,
        on_data: &mut dyn FnMut(&[u8]),
    ) -> Result<(), TransportError> {
        self.as_ref().read(location, request, on_data)
    }
}
