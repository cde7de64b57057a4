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

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rstest::*;

use chunk_manifest::chunk::FileChunk;
use chunk_manifest::fetch::{ChunkFetcher, FetchConfig};
use chunk_manifest::manifest::{ManifestBuilder, ManifestConfig};
use chunk_manifest::store::MemoryChunkStore;

/// The minimum size of test data buffers.
const MIN_BUFFER_SIZE: usize = 2048;

/// The maximum size of test data buffers.
const MAX_BUFFER_SIZE: usize = 4096;

/// Return a buffer containing `size` random bytes for testing purposes.
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut rng = SmallRng::from_entropy();
    let mut buffer = vec![0u8; size];
    rng.fill_bytes(&mut buffer);
    buffer
}

/// Return a buffer of `size` bytes where each byte is its offset modulo 256.
pub fn counting_bytes(size: usize) -> Vec<u8> {
    (0..size).map(|i| i as u8).collect()
}

/// Return a randomly sized buffer of random bytes.
#[fixture]
pub fn buffer() -> Vec<u8> {
    let mut rng = SmallRng::from_entropy();
    random_bytes(rng.gen_range(MIN_BUFFER_SIZE..MAX_BUFFER_SIZE))
}

/// Return an empty in-memory chunk store.
#[fixture]
pub fn store() -> MemoryChunkStore {
    MemoryChunkStore::new()
}

/// Return a fetch config which retries quickly.
pub fn fast_fetch_config() -> FetchConfig {
    let mut config = FetchConfig::default();
    config.initial_wait = Duration::from_millis(1);
    config.max_wait = Duration::from_millis(10);
    config
}

/// Return a fetch config which retries quickly.
#[fixture]
pub fn fetch_config() -> FetchConfig {
    fast_fetch_config()
}

/// Return a manifest config which puts `batch_size` chunks in each manifest.
pub fn manifest_config(batch_size: usize) -> ManifestConfig {
    let mut config = ManifestConfig::default();
    config.batch_size = batch_size;
    config
}

/// Return a fetcher which reads from `store` and retries quickly.
pub fn memory_fetcher(store: &MemoryChunkStore) -> ChunkFetcher<MemoryChunkStore, MemoryChunkStore> {
    ChunkFetcher::new(store.clone(), store.clone(), fast_fetch_config())
}

/// Store `count` consecutive data chunks of `size` bytes each in `store` starting at `offset`.
pub fn data_chunks(store: &MemoryChunkStore, offset: i64, count: usize, size: usize) -> Vec<FileChunk> {
    let data = random_bytes(size);
    (0..count)
        .map(|i| store.insert(offset + (i * size) as i64, &data))
        .collect()
}

/// Store `children` in a new manifest chunk in `store` and return it.
pub fn manifest_chunk(store: &MemoryChunkStore, children: &[FileChunk]) -> FileChunk {
    ManifestBuilder::new(store.clone(), &ManifestConfig::default())
        .merge_into_manifest(children)
        .unwrap()
}
