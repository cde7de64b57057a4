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

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The identifier of a chunk's stored content.
///
/// A `ChunkId` is opaque to this crate. It is resolved to replica locations by a [`LookupChunk`].
///
/// [`LookupChunk`]: crate::fetch::LookupChunk
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Construct a new `ChunkId` from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        ChunkId(id.into())
    }

    /// Return the string form of this ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChunkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChunkId {
    fn from(id: String) -> Self {
        ChunkId(id)
    }
}

impl From<&str> for ChunkId {
    fn from(id: &str) -> Self {
        ChunkId(id.to_owned())
    }
}

impl Display for ChunkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contiguous logical byte range of a file backed by stored content.
///
/// The chunk covers the range `[offset, offset + size)` of the file. If `is_manifest` is `true`,
/// the stored content is not file data but an encoded [`Manifest`] whose chunks share the same
/// file coordinate space. In that case `offset` and `size` describe the range spanned by the
/// manifest's children, not the length of the encoded manifest. This lets leaf chunks and
/// manifest chunks be filtered by range the same way without expanding them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileChunk {
    /// The ID of the stored content.
    pub id: ChunkId,

    /// The offset of this chunk within the file.
    pub offset: i64,

    /// The logical size of this chunk in bytes.
    pub size: u64,

    /// The key used to decrypt the stored content, or `None` if it is stored in cleartext.
    #[serde(default)]
    pub cipher_key: Option<Vec<u8>>,

    /// Whether the stored content must be decompressed.
    #[serde(default)]
    pub is_compressed: bool,

    /// Whether the stored content is an encoded manifest.
    #[serde(default)]
    pub is_manifest: bool,

    /// The time this chunk was written, in nanoseconds since the Unix epoch.
    #[serde(default)]
    pub modified_ts_ns: i64,

    /// The checksum of the stored content as reported by the store.
    #[serde(default)]
    pub etag: String,
}

impl FileChunk {
    /// Create a new cleartext, uncompressed leaf chunk.
    pub fn new(id: impl Into<ChunkId>, offset: i64, size: u64) -> Self {
        FileChunk {
            id: id.into(),
            offset,
            size,
            ..Default::default()
        }
    }

    /// Return the offset one past the last byte covered by this chunk.
    pub fn end(&self) -> i64 {
        self.offset.saturating_add(self.size as i64)
    }

    /// Return whether this chunk shares at least one byte with the range `[start, stop)`.
    ///
    /// A range which only touches the boundary of this chunk does not overlap it.
    pub fn overlaps(&self, start: i64, stop: i64) -> bool {
        self.offset.max(start) < self.end().min(stop)
    }
}

/// An ordered list of chunks stored as the content of a manifest chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub chunks: Vec<FileChunk>,
}

impl Manifest {
    /// Encode this manifest in its wire format.
    ///
    /// # Errors
    /// - `Error::Serialize`: The manifest could not be serialized.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_chunks(&self.chunks)
    }

    /// Decode a manifest from its wire format.
    ///
    /// # Errors
    /// - `Error::Deserialize`: The `data` is not a valid encoded manifest.
    pub fn decode(data: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(data).map_err(Error::Deserialize)
    }
}

/// A borrowed view of a [`Manifest`] with the same wire format.
#[derive(Serialize)]
struct ManifestRef<'a> {
    chunks: &'a [FileChunk],
}

/// Encode the given `chunks` as a manifest without copying them.
///
/// # Errors
/// - `Error::Serialize`: The manifest could not be serialized.
pub fn encode_chunks(chunks: &[FileChunk]) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(&ManifestRef { chunks }).map_err(Error::Serialize)
}
