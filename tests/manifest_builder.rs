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
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use chunk_manifest::chunk::{encode_chunks, ChunkId, FileChunk, Manifest};
use chunk_manifest::manifest::{
    has_manifest, separate_manifest_chunks, ManifestBuilder, ManifestConfig, ManifestResolver,
    MANIFEST_BATCH,
};
use chunk_manifest::store::{MemoryChunkStore, SaveChunk, SavedChunk};
use chunk_manifest::Error;
use common::*;

mod common;

/// A store which fails every save after the first `succeed` saves.
#[derive(Debug)]
struct FailingStore {
    inner: MemoryChunkStore,
    succeed: usize,
    saves: AtomicUsize,
}

impl SaveChunk for FailingStore {
    fn save_chunk(&self, data: &mut dyn Read, name: &str, offset: i64) -> anyhow::Result<SavedChunk> {
        if self.saves.fetch_add(1, Ordering::SeqCst) >= self.succeed {
            return Err(anyhow!("The volume is read-only."));
        }
        self.inner.save_chunk(data, name, offset)
    }
}

/// Return `count` chunks with made-up IDs which are not stored anywhere.
fn unstored_chunks(count: usize, size: u64) -> Vec<FileChunk> {
    (0..count)
        .map(|i| FileChunk::new(format!("7,{:08x}", i), (i as u64 * size) as i64, size))
        .collect()
}

#[rstest]
fn compacting_default_batches(store: MemoryChunkStore) -> anyhow::Result<()> {
    let chunks = unstored_chunks(25000, 16);
    let builder = ManifestBuilder::new(store.clone(), &ManifestConfig::default());

    let compacted = builder.maybe_manifestize(&chunks)?;
    let (manifests, data) = separate_manifest_chunks(&compacted);

    assert_that!(MANIFEST_BATCH).is_equal_to(10000);
    assert_that!(compacted).has_length(2 + 5000);
    assert_that!(has_manifest(&compacted)).is_true();
    assert_that!(manifests).has_length(2);
    assert_that!(data).is_equal_to(chunks[20000..].to_vec());
    assert_that!(store.len()).is_equal_to(2);

    Ok(())
}

#[rstest]
fn compacted_list_resolves_to_original(store: MemoryChunkStore) -> anyhow::Result<()> {
    let chunks = unstored_chunks(25000, 16);
    let config = ManifestConfig::default();
    let compacted = ManifestBuilder::new(store.clone(), &config).maybe_manifestize(&chunks)?;

    let fetcher = memory_fetcher(&store);
    let resolver = ManifestResolver::new(&fetcher, &config);
    let resolved = resolver.resolve_manifest(&compacted, 0, i64::MAX)?;

    assert_that!(resolved.data_chunks).is_equal_to(chunks);
    assert_that!(resolved.manifest_chunks).has_length(2);

    Ok(())
}

#[rstest]
fn short_list_is_not_compacted(store: MemoryChunkStore) -> anyhow::Result<()> {
    let chunks = unstored_chunks(9, 16);
    let builder = ManifestBuilder::new(store.clone(), &manifest_config(10));

    let compacted = builder.maybe_manifestize(&chunks)?;

    assert_that!(compacted).is_equal_to(chunks);
    assert_that!(store.is_empty()).is_true();

    Ok(())
}

#[rstest]
fn zero_batch_size_never_compacts(store: MemoryChunkStore) -> anyhow::Result<()> {
    let chunks = unstored_chunks(30, 16);
    let builder = ManifestBuilder::new(store.clone(), &manifest_config(0));

    assert_that!(builder.maybe_manifestize(&chunks)?).is_equal_to(chunks);
    assert_that!(store.is_empty()).is_true();

    Ok(())
}

#[rstest]
fn existing_manifests_come_first(store: MemoryChunkStore) -> anyhow::Result<()> {
    let existing = manifest_chunk(&store, &unstored_chunks(3, 16));
    let mut chunks = unstored_chunks(7, 16);
    chunks.insert(4, existing.clone());
    let builder = ManifestBuilder::new(store.clone(), &manifest_config(3));

    let compacted = builder.maybe_manifestize(&chunks)?;

    assert_that!(compacted).has_length(1 + 2 + 1);
    assert_that!(compacted[0]).is_equal_to(existing);
    assert_that!(compacted[1].is_manifest).is_true();
    assert_that!(compacted[2].is_manifest).is_true();
    assert_that!(compacted[3]).is_equal_to(chunks[7].clone());

    Ok(())
}

#[rstest]
fn manifest_covers_children_range(store: MemoryChunkStore) -> anyhow::Result<()> {
    let children = vec![
        FileChunk::new("1,01", 4096, 1024),
        FileChunk::new("1,02", 1000, 24),
        FileChunk::new("1,03", 9000, 1000),
        FileChunk::new("1,04", 2000, 100),
    ];
    let builder = ManifestBuilder::new(store.clone(), &ManifestConfig::default());

    let manifest = builder.merge_into_manifest(&children)?;
    let stored = store.get(&manifest.id).unwrap();

    assert_that!(manifest.is_manifest).is_true();
    assert_that!(manifest.offset).is_equal_to(1000);
    assert_that!(manifest.size).is_equal_to(9000);
    assert_that!(manifest.size).is_not_equal_to(stored.len() as u64);
    assert_that!(Manifest::decode(&stored)?.chunks).is_equal_to(children);

    Ok(())
}

#[rstest]
fn failed_batch_fails_whole_compaction() {
    let store = FailingStore {
        inner: MemoryChunkStore::new(),
        succeed: 1,
        saves: AtomicUsize::new(0),
    };
    let chunks = unstored_chunks(25, 16);
    let builder = ManifestBuilder::new(&store, &manifest_config(10));

    let result = builder.maybe_manifestize(&chunks);

    assert!(matches!(result, Err(Error::Persist(_))));
    assert_that!(store.saves.load(Ordering::SeqCst)).is_equal_to(2);
}

#[rstest]
fn manifest_round_trips() -> anyhow::Result<()> {
    let mut rng = SmallRng::from_entropy();
    let batch: Vec<FileChunk> = (0..64)
        .map(|i| FileChunk {
            id: ChunkId::new(format!("{},{:x}", rng.gen_range(1..100), rng.gen::<u64>())),
            offset: rng.gen_range(0..i64::MAX / 2),
            size: rng.gen_range(0..u64::MAX / 4),
            cipher_key: if i % 3 == 0 { Some(random_bytes(32)) } else { None },
            is_compressed: rng.gen(),
            is_manifest: rng.gen(),
            modified_ts_ns: rng.gen(),
            etag: format!("{:x}", rng.gen::<u128>()),
        })
        .collect();

    let encoded = encode_chunks(&batch)?;

    assert_that!(Manifest::decode(&encoded)?.chunks).is_equal_to(batch.clone());
    assert_that!(Manifest { chunks: batch }.encode()?).is_equal_to(encoded);

    Ok(())
}
