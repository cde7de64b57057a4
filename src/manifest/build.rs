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

use std::io::Cursor;

use tracing::debug;

use crate::chunk::{encode_chunks, FileChunk};
use crate::error::{Error, Result};
use crate::store::SaveChunk;

use super::config::ManifestConfig;
use super::separate_manifest_chunks;

/// The default number of data chunks stored in each manifest chunk.
pub const MANIFEST_BATCH: usize = 10000;

/// Compacts chunk lists by storing batches of data chunks in manifest chunks.
#[derive(Debug)]
pub struct ManifestBuilder<S> {
    store: S,
    batch_size: usize,
}

impl<S: SaveChunk> ManifestBuilder<S> {
    /// Create a builder which persists new manifest chunks to `store`.
    pub fn new(store: S, config: &ManifestConfig) -> Self {
        ManifestBuilder {
            store,
            batch_size: config.batch_size,
        }
    }

    /// Compact `chunks` by moving each full batch of data chunks into a new manifest chunk.
    ///
    /// This returns the existing manifest chunks, followed by one new manifest chunk for each full
    /// batch of data chunks, followed by the remaining data chunks which don't fill a batch. A list
    /// with fewer data chunks than the batch size is returned unchanged apart from this ordering.
    ///
    /// If any batch fails, nothing is compacted and this returns the error. The caller's `chunks`
    /// are left untouched so they can be compacted again later.
    ///
    /// # Errors
    /// - `Error::Serialize`: A manifest could not be serialized.
    /// - `Error::Persist`: A manifest could not be persisted to the store.
    pub fn maybe_manifestize(&self, chunks: &[FileChunk]) -> Result<Vec<FileChunk>> {
        let (mut compacted, data_chunks) = separate_manifest_chunks(chunks);
        if self.batch_size == 0 {
            compacted.extend(data_chunks);
            return Ok(compacted);
        }

        let batches = data_chunks.chunks_exact(self.batch_size);
        let remainder = batches.remainder();
        for batch in batches {
            compacted.push(self.merge_into_manifest(batch)?);
        }
        compacted.extend_from_slice(remainder);

        Ok(compacted)
    }

    /// Store `chunks` in a new manifest chunk and return it.
    ///
    /// The returned chunk covers the range spanned by `chunks`, from the lowest offset to the
    /// highest end, regardless of the size of the stored manifest.
    ///
    /// # Errors
    /// - `Error::Serialize`: The manifest could not be serialized.
    /// - `Error::Persist`: The manifest could not be persisted to the store.
    pub fn merge_into_manifest(&self, chunks: &[FileChunk]) -> Result<FileChunk> {
        let data = encode_chunks(chunks)?;

        let (start, end) = chunks
            .iter()
            .map(|chunk| (chunk.offset, chunk.end()))
            .reduce(|(start, end), (offset, chunk_end)| (start.min(offset), end.max(chunk_end)))
            .unwrap_or_default();

        let saved = self
            .store
            .save_chunk(&mut Cursor::new(data), "", 0)
            .map_err(Error::Persist)?;

        debug!(
            chunk = %saved.chunk.id,
            children = chunks.len(),
            start,
            end,
            "merged chunks into manifest"
        );

        Ok(FileChunk {
            is_manifest: true,
            offset: start,
            size: (end - start) as u64,
            ..saved.chunk
        })
    }
}
