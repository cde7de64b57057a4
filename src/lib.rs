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

//! `chunk-manifest` is the chunk manifest layer of a distributed file store.
//!
//! A file in the store is a list of chunks, each covering a range of the file and backed by
//! content stored at one or more replica locations. Once a file has many chunks, batches of them
//! are moved into manifest chunks, whose content is itself an encoded list of chunks. This keeps
//! the metadata for each file small.
//!
//! This crate provides:
//! - [`ChunkFetcher`], which reads chunk content from replicas and retries transient failures
//! with backoff.
//! - [`ManifestResolver`], which expands manifest chunks into the data chunks covering a range
//! of a file.
//! - [`ManifestBuilder`], which compacts a long chunk list into manifest chunks.
//!
//! Resolving chunks to locations, reading from a location, and persisting new chunks are left to
//! the [`LookupChunk`], [`ReadLocation`], and [`SaveChunk`] traits. [`MemoryChunkStore`]
//! implements all three in memory.
//!
//! # Examples
//! ```
//! use chunk_manifest::chunk::FileChunk;
//! use chunk_manifest::fetch::{ChunkFetcher, FetchConfig};
//! use chunk_manifest::manifest::{ManifestBuilder, ManifestConfig, ManifestResolver};
//! use chunk_manifest::store::MemoryChunkStore;
//!
//! fn main() -> chunk_manifest::Result<()> {
//!     let store = MemoryChunkStore::new();
//!     let chunks: Vec<FileChunk> = (0..10)
//!         .map(|i| store.insert(i * 4, b"data"))
//!         .collect();
//!
//!     // Compact the chunk list into manifests of four chunks each.
//!     let mut config = ManifestConfig::default();
//!     config.batch_size = 4;
//!     let builder = ManifestBuilder::new(store.clone(), &config);
//!     let compacted = builder.maybe_manifestize(&chunks)?;
//!     assert_eq!(compacted.len(), 4);
//!
//!     // Find the data chunks covering bytes 6 through 13 of the file.
//!     let fetcher = ChunkFetcher::new(store.clone(), store, FetchConfig::default());
//!     let resolver = ManifestResolver::new(&fetcher, &config);
//!     let resolved = resolver.resolve_manifest(&compacted, 6, 14)?;
//!     assert_eq!(resolved.data_chunks, chunks[1..4].to_vec());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//! Some functionality is gated behind cargo features:
//!
//! Type | Cargo Feature
//! --- | ---
//! `Compression::Lz4` | `compression`

pub use error::{Error, Result};

pub mod chunk;
mod error;
pub mod fetch;
pub mod manifest;
pub mod store;

#[doc(no_inline)]
pub use chunk::{ChunkId, FileChunk};
#[doc(no_inline)]
pub use fetch::{ChunkFetcher, LookupChunk, ReadLocation};
#[doc(no_inline)]
pub use manifest::{ManifestBuilder, ManifestResolver};
#[doc(no_inline)]
pub use store::{MemoryChunkStore, SaveChunk};
