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

use std::cmp::min;
use std::fmt::{self, Debug, Formatter};
use std::io::Write;
use std::result;
use std::sync::Arc;
use std::thread;

use anyhow::anyhow;
use tracing::{debug, error, warn};

use crate::chunk::{ChunkId, FileChunk};
use crate::error::{Error, Result};

use super::config::{Backoff, FetchConfig};
use super::dedup::DedupWriter;
use super::pool::BufferPool;
use super::transport::{ReadRequest, TransportError};
use super::{LookupChunk, ReadLocation};

/// Fetches chunk content from replica locations, retrying failed reads.
///
/// A fetch resolves the chunk to its replica locations and then works in rounds. Each round tries
/// every location once, in order, and stops at the first successful read. A read which fails with
/// a terminal [`TransportError`] ends the fetch immediately. When a whole round fails, the fetcher
/// sleeps for the next wait in its [`Backoff`] schedule and starts another round, giving up with
/// the last error once the schedule is exhausted.
///
/// Fetching blocks the calling thread, including while waiting between rounds. A `ChunkFetcher`
/// holds no mutable state, so it can be shared between threads to serve concurrent fetches.
pub struct ChunkFetcher<L, T> {
    lookup: L,
    transport: T,
    config: FetchConfig,
    pool: Arc<BufferPool>,
}

impl<L, T> Debug for ChunkFetcher<L, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkFetcher")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl<L: LookupChunk, T: ReadLocation> ChunkFetcher<L, T> {
    /// Create a new fetcher which uses the process-wide [`BufferPool`].
    pub fn new(lookup: L, transport: T, config: FetchConfig) -> Self {
        Self::with_pool(lookup, transport, config, BufferPool::global())
    }

    /// Create a new fetcher which checks out buffers from the given `pool`.
    pub fn with_pool(lookup: L, transport: T, config: FetchConfig, pool: Arc<BufferPool>) -> Self {
        ChunkFetcher {
            lookup,
            transport,
            config,
            pool,
        }
    }

    /// Return the configuration of this fetcher.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Return the pool this fetcher checks out buffers from.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Write the whole content of the chunk with the given `id` to `sink`.
    ///
    /// The content is decrypted with `cipher_key` and decompressed if `is_compressed`. Even when
    /// reads are retried, every byte of the content is written to `sink` exactly once.
    ///
    /// This returns the number of bytes written.
    ///
    /// # Errors
    /// - `Error::Lookup`: The chunk could not be resolved to any location.
    /// - `Error::Fetch`: No replica could serve the chunk.
    /// - `Error::Io`: Writing to `sink` failed.
    pub fn fetch_all(
        &self,
        id: &ChunkId,
        cipher_key: Option<&[u8]>,
        is_compressed: bool,
        sink: impl Write,
    ) -> Result<u64> {
        let locations = self.locations(id)?;
        let request = ReadRequest::full(cipher_key, is_compressed);
        let mut writer = DedupWriter::new(sink);

        let result = self.retry(id, &locations, |location| {
            writer.begin_attempt();
            let result = self
                .transport
                .read(location, &request, &mut |data: &[u8]| writer.accept(data));
            if writer.has_failed() {
                return Err(TransportError::terminal(anyhow!(
                    "Failed to write the content of chunk {}.",
                    id
                )));
            }
            result
        });

        let written = writer.finish()?;
        result.map(|()| written)
    }

    /// Write the whole content of `chunk` to `sink`.
    ///
    /// See [`fetch_all`] for details.
    ///
    /// [`fetch_all`]: crate::fetch::ChunkFetcher::fetch_all
    pub fn fetch_chunk(&self, chunk: &FileChunk, sink: impl Write) -> Result<u64> {
        self.fetch_all(
            &chunk.id,
            chunk.cipher_key.as_deref(),
            chunk.is_compressed,
            sink,
        )
    }

    /// Fill `buffer` with the content of the chunk with the given `id` starting at `offset`.
    ///
    /// This fills at most `buffer.len()` bytes and returns the number of bytes filled, which is
    /// less than `buffer.len()` if the content ends first.
    ///
    /// # Errors
    /// - `Error::Lookup`: The chunk could not be resolved to any location.
    /// - `Error::Fetch`: No replica could serve the chunk.
    pub fn fetch_range(
        &self,
        id: &ChunkId,
        cipher_key: Option<&[u8]>,
        is_compressed: bool,
        offset: i64,
        buffer: &mut [u8],
    ) -> Result<usize> {
        let locations = self.locations(id)?;
        let request = ReadRequest::range(cipher_key, is_compressed, offset, buffer.len());
        let mut filled = 0;

        self.retry(id, &locations, |location| {
            filled = 0;
            self.transport
                .read(location, &request, &mut |data: &[u8]| {
                    let count = min(buffer.len() - filled, data.len());
                    buffer[filled..filled + count].copy_from_slice(&data[..count]);
                    filled += count;
                })
        })?;

        Ok(filled)
    }

    /// Resolve the chunk with the given `id` to its replica locations.
    fn locations(&self, id: &ChunkId) -> Result<Vec<String>> {
        let result = match self.lookup.lookup(id) {
            Ok(locations) if locations.is_empty() => Err(anyhow!("No locations were found.")),
            result => result,
        };
        result.map_err(|source| {
            error!(chunk = %id, error = %source, "failed to look up chunk");
            Error::Lookup {
                id: id.clone(),
                source,
            }
        })
    }

    /// Call `attempt` for each of the `locations` in rounds until one succeeds.
    fn retry<F>(&self, id: &ChunkId, locations: &[String], mut attempt: F) -> Result<()>
    where
        F: FnMut(&str) -> result::Result<(), TransportError>,
    {
        let mut backoff = Backoff::new(&self.config);
        loop {
            let source = match try_round(locations, &mut attempt) {
                Ok(()) => return Ok(()),
                Err(error) if !error.is_retryable() => error,
                Err(error) => match backoff.next() {
                    Some(wait) => {
                        debug!(chunk = %id, wait = ?wait, "retrying fetch");
                        thread::sleep(wait);
                        continue;
                    }
                    None => error,
                },
            };
            return Err(Error::Fetch {
                id: id.clone(),
                source,
            });
        }
    }
}

/// Try each of the `locations` once, stopping at the first success or terminal failure.
///
/// If every location fails, this returns the error from the last one.
fn try_round<F>(locations: &[String], attempt: &mut F) -> result::Result<(), TransportError>
where
    F: FnMut(&str) -> result::Result<(), TransportError>,
{
    let mut last_error = None;
    for location in locations {
        match attempt(location.as_str()) {
            Ok(()) => return Ok(()),
            Err(error) => {
                warn!(location = %location, error = %error, "failed to read chunk");
                if !error.is_retryable() {
                    return Err(error);
                }
                last_error = Some(error);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| TransportError::terminal_msg("No locations to read from.")))
}
