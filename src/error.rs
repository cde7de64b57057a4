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
use std::io;
use std::result;

use thiserror::Error as DeriveError;

use crate::chunk::ChunkId;
use crate::fetch::TransportError;

/// The error type for operations on chunks and manifests.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// The chunk could not be resolved to any replica location.
    #[error("Could not look up the locations of chunk {id}.")]
    Lookup {
        id: ChunkId,
        #[source]
        source: anyhow::Error,
    },

    /// Every replica failed until the retry budget was exhausted, or a replica reported a failure
    /// which is not worth retrying.
    ///
    /// This carries the error from the last attempt.
    #[error("Could not fetch chunk {id}.")]
    Fetch {
        id: ChunkId,
        #[source]
        source: TransportError,
    },

    /// A manifest could not be deserialized.
    #[error("A manifest could not be deserialized.")]
    Deserialize(#[source] rmp_serde::decode::Error),

    /// A manifest could not be serialized.
    #[error("A manifest could not be serialized.")]
    Serialize(#[source] rmp_serde::encode::Error),

    /// A manifest could not be persisted to the store.
    #[error("A manifest could not be persisted.")]
    Persist(#[source] anyhow::Error),

    /// Manifests are nested deeper than the configured limit.
    #[error("Manifests are nested more than {max_depth} levels deep.")]
    ManifestDepth { max_depth: usize },

    /// An I/O error occurred.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// The result type for operations on chunks and manifests.
pub type Result<T> = result::Result<T, Error>;
