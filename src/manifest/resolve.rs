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

use std::vec;

use tracing::{debug, warn};

use crate::chunk::{FileChunk, Manifest};
use crate::error::{Error, Result};
use crate::fetch::{ChunkFetcher, LookupChunk, ReadLocation};

use super::config::ManifestConfig;

/// The chunks found by resolving a chunk list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedChunks {
    /// The data chunks which overlap the resolved range, in the order they were found.
    pub data_chunks: Vec<FileChunk>,

    /// The manifest chunks which were expanded, in the order they were expanded.
    pub manifest_chunks: Vec<FileChunk>,
}

/// Expands manifest chunks into the data chunks they list.
#[derive(Debug)]
pub struct ManifestResolver<'a, L, T> {
    fetcher: &'a ChunkFetcher<L, T>,
    max_depth: usize,
}

impl<'a, L: LookupChunk, T: ReadLocation> ManifestResolver<'a, L, T> {
    /// Create a resolver which reads manifests using `fetcher`.
    pub fn new(fetcher: &'a ChunkFetcher<L, T>, config: &ManifestConfig) -> Self {
        ManifestResolver {
            fetcher,
            max_depth: config.max_depth,
        }
    }

    /// Return the data chunks in `chunks` which overlap the range `[start, stop)`.
    ///
    /// Manifest chunks which overlap the range are read in full and their chunks are resolved in
    /// turn, depth-first, so data chunks are returned in the order they are reached. Chunks which
    /// only touch the boundary of the range are skipped.
    ///
    /// If any manifest can't be read, this returns the error and nothing else. The caller's
    /// `chunks` are left untouched and remain the fallback.
    ///
    /// # Errors
    /// - `Error::Lookup`: A manifest chunk could not be resolved to any location.
    /// - `Error::Fetch`: A manifest chunk could not be fetched.
    /// - `Error::Deserialize`: A manifest chunk does not contain a valid manifest.
    /// - `Error::ManifestDepth`: Manifests are nested deeper than the configured limit.
    pub fn resolve_manifest(
        &self,
        chunks: &[FileChunk],
        start: i64,
        stop: i64,
    ) -> Result<ResolvedChunks> {
        let mut resolved = ResolvedChunks::default();

        // Each frame holds the chunks of one level which haven't been visited yet.
        let mut frames: Vec<vec::IntoIter<FileChunk>> = vec![chunks.to_vec().into_iter()];

        while let Some(frame) = frames.last_mut() {
            let chunk = match frame.next() {
                Some(chunk) => chunk,
                None => {
                    frames.pop();
                    continue;
                }
            };

            if !chunk.overlaps(start, stop) {
                continue;
            }

            if !chunk.is_manifest {
                resolved.data_chunks.push(chunk);
                continue;
            }

            if frames.len() > self.max_depth {
                warn!(chunk = %chunk.id, max_depth = self.max_depth, "manifests are nested too deeply");
                return Err(Error::ManifestDepth {
                    max_depth: self.max_depth,
                });
            }

            let children = self.resolve_one_manifest(&chunk)?;
            resolved.manifest_chunks.push(chunk);
            frames.push(children.into_iter());
        }

        Ok(resolved)
    }

    /// Return the chunks listed in the manifest stored in `chunk`.
    ///
    /// The whole manifest is read regardless of what range of the file is needed. If `chunk` is
    /// not a manifest chunk, this returns an empty list.
    ///
    /// # Errors
    /// - `Error::Lookup`: The chunk could not be resolved to any location.
    /// - `Error::Fetch`: The chunk could not be fetched.
    /// - `Error::Deserialize`: The chunk does not contain a valid manifest.
    pub fn resolve_one_manifest(&self, chunk: &FileChunk) -> Result<Vec<FileChunk>> {
        if !chunk.is_manifest {
            return Ok(Vec::new());
        }

        let mut buffer = self.fetcher.pool().acquire();
        self.fetcher.fetch_chunk(chunk, &mut *buffer)?;

        let manifest = Manifest::decode(&buffer).map_err(|error| {
            warn!(chunk = %chunk.id, error = %error, "failed to decode manifest");
            error
        })?;

        debug!(chunk = %chunk.id, children = manifest.chunks.len(), "expanded manifest");
        Ok(manifest.chunks)
    }
}
