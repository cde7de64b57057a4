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

use std::io::Read;

use static_assertions::assert_obj_safe;

use crate::chunk::FileChunk;

/// A chunk which was persisted by a [`SaveChunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedChunk {
    /// The descriptor of the new chunk.
    ///
    /// Its `offset` and `size` describe the stored blob, not a range of any file.
    pub chunk: FileChunk,

    /// The collection the chunk was stored in.
    pub collection: String,

    /// The replication policy the chunk was stored with.
    pub replication: String,
}

/// A function which persists bytes as a new chunk.
pub trait SaveChunk: Send + Sync {
    /// Persist the bytes read from `data` as a new chunk.
    ///
    /// The `name` and `offset` describe where the data belongs in a file, if anywhere. If this
    /// returns `Err`, no chunk was created.
    fn save_chunk(&self, data: &mut dyn Read, name: &str, offset: i64) -> anyhow::Result<SavedChunk>;
}

assert_obj_safe!(SaveChunk);

impl<T: SaveChunk + ?Sized> SaveChunk for &T {
    fn save_chunk(&self, data: &mut dyn Read, name: &str, offset: i64) -> anyhow::Result<SavedChunk> {
        (**self).save_chunk(data, name, offset)
    }
}

impl SaveChunk for Box<dyn SaveChunk> {
    fn save_chunk(&self, data: &mut dyn Read, name: &str, offset: i64) -> anyhow::Result<SavedChunk> {
        self.as_ref().save_chunk(data, name, offset)
    }
}
