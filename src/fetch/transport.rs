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

use std::fmt::Display;

use thiserror::Error as DeriveError;

/// A description of a single read against a replica location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest<'a> {
    /// The key to decrypt the content with, or `None` if it is stored in cleartext.
    pub cipher_key: Option<&'a [u8]>,

    /// Whether the stored content must be decompressed.
    pub is_compressed: bool,

    /// Whether the whole chunk is being read.
    ///
    /// If this is `true`, `offset` and `size` are ignored.
    pub is_full_read: bool,

    /// The offset within the decoded content to start delivering from.
    pub offset: i64,

    /// The maximum number of bytes the caller wants.
    pub size: usize,

    /// Whether replicas should serve content whose file entry has been deleted.
    ///
    /// Manifests keep referencing chunks after the entry which wrote them is gone, so the fetcher
    /// always sets this.
    pub read_deleted: bool,
}

impl<'a> ReadRequest<'a> {
    /// A request for the whole content of a chunk.
    pub fn full(cipher_key: Option<&'a [u8]>, is_compressed: bool) -> Self {
        ReadRequest {
            cipher_key,
            is_compressed,
            is_full_read: true,
            offset: 0,
            size: 0,
            read_deleted: true,
        }
    }

    /// A request for at most `size` bytes of a chunk starting at `offset`.
    pub fn range(
        cipher_key: Option<&'a [u8]>,
        is_compressed: bool,
        offset: i64,
        size: usize,
    ) -> Self {
        ReadRequest {
            cipher_key,
            is_compressed,
            is_full_read: false,
            offset,
            size,
            read_deleted: true,
        }
    }
}

/// A failed read against a replica location.
#[derive(Debug, DeriveError)]
#[error("{source}")]
pub struct TransportError {
    retryable: bool,
    #[source]
    source: anyhow::Error,
}

impl TransportError {
    /// A failure which may succeed if the read is tried again, possibly against another replica.
    pub fn retryable(error: impl Into<anyhow::Error>) -> Self {
        TransportError {
            retryable: true,
            source: error.into(),
        }
    }

    /// A failure which is not worth retrying against any replica.
    pub fn terminal(error: impl Into<anyhow::Error>) -> Self {
        TransportError {
            retryable: false,
            source: error.into(),
        }
    }

    /// A retryable failure with the given message.
    pub fn retryable_msg<M: Display + std::fmt::Debug + Send + Sync + 'static>(message: M) -> Self {
        Self::retryable(anyhow::Error::msg(message))
    }

    /// A terminal failure with the given message.
    pub fn terminal_msg<M: Display + std::fmt::Debug + Send + Sync + 'static>(message: M) -> Self {
        Self::terminal(anyhow::Error::msg(message))
    }

    /// Return whether the read should be retried.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Return the underlying error.
    pub fn into_inner(self) -> anyhow::Error {
        self.source
    }
}
