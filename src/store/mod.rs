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

//! Persistence of new chunks.
//!
//! Manifest chunks built by a [`ManifestBuilder`] are persisted through the [`SaveChunk`] trait,
//! which stores a stream of bytes and returns a descriptor for the new chunk.
//!
//! [`MemoryChunkStore`] keeps chunks in memory and implements [`SaveChunk`] as well as the
//! [`LookupChunk`] and [`ReadLocation`] traits used to fetch chunks, so a single store can serve
//! every side of this crate. It is useful for testing.
//!
//! [`ManifestBuilder`]: crate::manifest::ManifestBuilder
//! [`LookupChunk`]: crate::fetch::LookupChunk
//! [`ReadLocation`]: crate::fetch::ReadLocation

pub use self::compression::Compression;
pub use self::memory_store::MemoryChunkStore;
pub use self::save_chunk::{SaveChunk, SavedChunk};

mod compression;
mod memory_store;
mod save_chunk;
