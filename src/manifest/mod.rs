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

//! Manifest chunks, which store lists of other chunks.
//!
//! A file with many chunks keeps its chunk list small by moving batches of chunks into manifest
//! chunks. The content of a manifest chunk is an encoded [`Manifest`], and a manifest may itself
//! list other manifest chunks, forming a tree.
//!
//! [`ManifestBuilder`] compacts a long chunk list into manifest chunks. [`ManifestResolver`]
//! expands manifest chunks back into the data chunks which cover a range of the file.
//!
//! [`Manifest`]: crate::chunk::Manifest

pub use self::build::{ManifestBuilder, MANIFEST_BATCH};
pub use self::config::ManifestConfig;
pub use self::resolve::{ManifestResolver, ResolvedChunks};

use crate::chunk::FileChunk;

mod build;
mod config;
mod resolve;

/// Return whether any of the given `chunks` is a manifest chunk.
pub fn has_manifest(chunks: &[FileChunk]) -> bool {
    chunks.iter().any(|chunk| chunk.is_manifest)
}

/// Split `chunks` into manifest chunks and data chunks.
///
/// Chunks keep their relative order within each of the returned lists.
pub fn separate_manifest_chunks(chunks: &[FileChunk]) -> (Vec<FileChunk>, Vec<FileChunk>) {
    chunks.iter().cloned().partition(|chunk| chunk.is_manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(id: &str, offset: i64, size: u64) -> FileChunk {
        FileChunk {
            is_manifest: true,
            ..FileChunk::new(id, offset, size)
        }
    }

    #[test]
    fn no_manifest_in_data_chunks() {
        let chunks = vec![FileChunk::new("1", 0, 10), FileChunk::new("2", 10, 10)];

        assert!(!has_manifest(&chunks));
        assert!(!has_manifest(&[]));
    }

    #[test]
    fn separating_keeps_order() {
        let chunks = vec![
            FileChunk::new("1", 0, 10),
            manifest("2", 10, 100),
            FileChunk::new("3", 110, 10),
            manifest("4", 120, 100),
        ];

        let (manifests, data) = separate_manifest_chunks(&chunks);

        assert!(has_manifest(&chunks));
        assert_eq!(manifests, vec![chunks[1].clone(), chunks[3].clone()]);
        assert_eq!(data, vec![chunks[0].clone(), chunks[2].clone()]);
    }
}
