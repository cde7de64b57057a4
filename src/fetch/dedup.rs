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

use std::io::{self, Write};

/// A sink which receives the content of a chunk exactly once across retried reads.
///
/// Every read attempt delivers the content from the start again. Bytes which were already written
/// to the sink by an earlier attempt are skipped, so only new bytes reach the sink.
#[derive(Debug)]
pub(super) struct DedupWriter<W> {
    sink: W,

    /// The number of bytes written to the sink across all attempts.
    total_written: u64,

    /// The number of bytes delivered by the current attempt so far.
    processed: u64,

    /// The first error returned by the sink.
    error: Option<io::Error>,
}

impl<W: Write> DedupWriter<W> {
    pub fn new(sink: W) -> Self {
        DedupWriter {
            sink,
            total_written: 0,
            processed: 0,
            error: None,
        }
    }

    /// Start a new attempt, which delivers the content from the start.
    pub fn begin_attempt(&mut self) {
        self.processed = 0;
    }

    /// Accept the next `data` delivered by the current attempt.
    ///
    /// Once the sink returns an error, all further data is dropped.
    pub fn accept(&mut self, data: &[u8]) {
        if self.error.is_some() {
            return;
        }

        let mut data = data;
        if self.total_written > self.processed {
            let to_skip = self.total_written - self.processed;
            if data.len() as u64 <= to_skip {
                self.processed += data.len() as u64;
                return;
            }
            data = &data[to_skip as usize..];
            self.processed += to_skip;
        }

        match self.sink.write_all(data) {
            Ok(()) => {
                self.processed += data.len() as u64;
                self.total_written += data.len() as u64;
            }
            Err(error) => self.error = Some(error),
        }
    }

    /// Return whether the sink has returned an error.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Consume this writer, returning the number of bytes written or the sink's error.
    pub fn finish(self) -> io::Result<u64> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.total_written),
        }
    }
}
