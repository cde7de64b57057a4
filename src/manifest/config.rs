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

use super::build::MANIFEST_BATCH;

/// The configuration for building and resolving manifests.
///
/// This type implements `Default` to provide a reasonable default configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ManifestConfig {
    /// The number of data chunks to store in each manifest chunk.
    ///
    /// Chunk lists with fewer data chunks than this are never compacted. If this is `0`, chunk
    /// lists are never compacted. The default value is [`MANIFEST_BATCH`].
    pub batch_size: usize,

    /// The maximum number of levels of manifests which will be expanded.
    ///
    /// Resolving a chunk list whose manifests are nested deeper than this fails. This guards
    /// against cyclic or adversarial manifests. The default value is `32`.
    pub max_depth: usize,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            batch_size: MANIFEST_BATCH,
            max_depth: 32,
        }
    }
}
