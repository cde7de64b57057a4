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

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use uuid::Uuid;

use crate::chunk::{ChunkId, FileChunk};
use crate::fetch::{LookupChunk, ReadLocation, ReadRequest, TransportError};

use super::compression::Compression;
use super::save_chunk::{SaveChunk, SavedChunk};

/// The prefix of the locations of chunks in a `MemoryChunkStore`.
const LOCATION_SCHEME: &str = "memory://";

/// The largest piece of content delivered to a reader at once.
const STREAM_PIECE_SIZE: usize = 32 * 1024;

/// A chunk store which keeps chunks in memory.
///
/// Unlike real chunk stores, chunks in a `MemoryChunkStore` are not stored persistently and are only
/// accessible to the current process. Clones of a `MemoryChunkStore` share the same chunks, so one
/// clone can be used to look up and read chunks while another saves them. This store is useful for
/// testing.
///
/// Each chunk is reported as having `replicas` locations, all of which serve the same bytes.
/// Encrypted chunks are not supported.
#[derive(Debug, Clone)]
pub struct MemoryChunkStore {
    blobs: Arc<RwLock<HashMap<ChunkId, Vec<u8>>>>,
    replicas: usize,
    compression: Compression,
    collection: String,
    replication: String,
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChunkStore {
    /// Create a new empty `MemoryChunkStore` which reports one replica per chunk.
    pub fn new() -> Self {
        MemoryChunkStore {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            replicas: 1,
            compression: Compression::None,
            collection: String::new(),
            replication: String::from("000"),
        }
    }

    /// Report `replicas` locations for each chunk.
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas.max(1);
        self
    }

    /// Compress saved chunks using `compression`.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Store chunks in the given `collection`.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Store `data` uncompressed as a new data chunk at `offset` and return it.
    pub fn insert(&self, offset: i64, data: &[u8]) -> FileChunk {
        let id = ChunkId::new(Uuid::new_v4().to_string());
        self.write_blobs().insert(id.clone(), data.to_vec());
        FileChunk {
            etag: etag(data),
            modified_ts_ns: now_ns(),
            ..FileChunk::new(id, offset, data.len() as u64)
        }
    }

    /// Replace the stored bytes of the chunk with the given `id`.
    pub fn overwrite(&self, id: &ChunkId, data: &[u8]) {
        self.write_blobs().insert(id.clone(), data.to_vec());
    }

    /// Return the stored bytes of the chunk with the given `id`.
    pub fn get(&self, id: &ChunkId) -> Option<Vec<u8>> {
        self.read_blobs().get(id).cloned()
    }

    /// Remove the chunk with the given `id`, returning whether it existed.
    pub fn remove(&self, id: &ChunkId) -> bool {
        self.write_blobs().remove(id).is_some()
    }

    /// Return the number of chunks in the store.
    pub fn len(&self) -> usize {
        self.read_blobs().len()
    }

    /// Return whether the store contains no chunks.
    pub fn is_empty(&self) -> bool {
        self.read_blobs().is_empty()
    }

    /// Return the location of the given `replica` of the chunk with the given `id`.
    pub fn location(id: &ChunkId, replica: usize) -> String {
        format!("{}{}/{}", LOCATION_SCHEME, id, replica)
    }

    fn read_blobs(&self) -> RwLockReadGuard<'_, HashMap<ChunkId, Vec<u8>>> {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_blobs(&self) -> RwLockWriteGuard<'_, HashMap<ChunkId, Vec<u8>>> {
        self.blobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parse the chunk ID out of a location returned by `MemoryChunkStore::location`.
fn parse_location(location: &str) -> Option<ChunkId> {
    let path = location.strip_prefix(LOCATION_SCHEME)?;
    let (id, _replica) = path.rsplit_once('/')?;
    Some(ChunkId::from(id))
}

fn etag(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or_default()
}

impl LookupChunk for MemoryChunkStore {
    fn lookup(&self, id: &ChunkId) -> anyhow::Result<Vec<String>> {
        if !self.read_blobs().contains_key(id) {
            return Err(anyhow!("Chunk {} was not found.", id));
        }
        Ok((0..self.replicas)
            .map(|replica| Self::location(id, replica))
            .collect())
    }
}

impl ReadLocation for MemoryChunkStore {
    fn read(
        &self,
        location: &str,
        request: &ReadRequest<'_>,
        on_data: &mut dyn FnMut(&[u8]),
    ) -> Result<(), TransportError> {
        if request.cipher_key.is_some() {
            return Err(TransportError::terminal_msg(
                "Encrypted chunks are not supported.",
            ));
        }

        let id = parse_location(location).ok_or_else(|| {
            TransportError::terminal(anyhow!("{} is not a valid location.", location))
        })?;
        let stored = self
            .get(&id)
            .ok_or_else(|| TransportError::terminal(anyhow!("Chunk {} was not found.", id)))?;

        let content = if request.is_compressed {
            self.compression
                .decompress(&stored)
                .with_context(|| format!("Failed to decompress chunk {}.", id))
                .map_err(TransportError::terminal)?
        } else {
            stored
        };

        let content = if request.is_full_read {
            &content[..]
        } else {
            let start = usize::try_from(request.offset)
                .map_err(|_| TransportError::terminal(anyhow!("Invalid offset {}.", request.offset)))?
                .min(content.len());
            let end = start.saturating_add(request.size).min(content.len());
            &content[start..end]
        };

        for piece in content.chunks(STREAM_PIECE_SIZE) {
            on_data(piece);
        }

        Ok(())
    }
}

impl SaveChunk for MemoryChunkStore {
    fn save_chunk(&self, data: &mut dyn Read, _name: &str, offset: i64) -> anyhow::Result<SavedChunk> {
        let mut content = Vec::new();
        data.read_to_end(&mut content)?;
        let stored = self.compression.compress(&content)?;

        let id = ChunkId::new(Uuid::new_v4().to_string());
        let chunk = FileChunk {
            cipher_key: None,
            is_compressed: self.compression.is_compressed(),
            is_manifest: false,
            modified_ts_ns: now_ns(),
            etag: etag(&stored),
            ..FileChunk::new(id.clone(), offset, stored.len() as u64)
        };
        self.write_blobs().insert(id, stored);

        Ok(SavedChunk {
            chunk,
            collection: self.collection.clone(),
            replication: self.replication.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_round_trip() {
        let id = ChunkId::new("3,01637037d6");

        assert_eq!(parse_location(&MemoryChunkStore::location(&id, 2)), Some(id));
        assert_eq!(parse_location("http://volume/3,01637037d6"), None);
    }

    #[test]
    fn lookup_reports_every_replica() {
        let store = MemoryChunkStore::new().with_replicas(3);
        let chunk = store.insert(0, b"data");

        let locations = store.lookup(&chunk.id).unwrap();

        assert_eq!(locations.len(), 3);
        assert!(store.lookup(&ChunkId::new("missing")).is_err());
    }
}
