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

use std::collections::VecDeque;
use std::sync::Mutex;

use chunk_manifest::chunk::ChunkId;
use chunk_manifest::fetch::{ReadLocation, ReadRequest, TransportError};

/// The size of the pieces a `ScriptedTransport` delivers content in.
const PIECE_SIZE: usize = 16;

/// What a `ScriptedTransport` does on one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Deliver all the requested content and succeed.
    Succeed,

    /// Deliver the first `delivered` bytes of the requested content and then fail.
    Fail { delivered: usize, retryable: bool },
}

impl Step {
    pub const RETRYABLE: Step = Step::Fail {
        delivered: 0,
        retryable: true,
    };

    pub const TERMINAL: Step = Step::Fail {
        delivered: 0,
        retryable: false,
    };
}

/// A transport which serves fixed content and follows a script of successes and failures.
///
/// Each read takes the next step from the script. Once the script runs out, every read follows the
/// `fallback` step. Every location read from is recorded.
#[derive(Debug)]
pub struct ScriptedTransport {
    content: Vec<u8>,
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    attempts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(content: Vec<u8>, steps: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        ScriptedTransport {
            content,
            steps: Mutex::new(steps.into_iter().collect()),
            fallback,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Return the locations read from, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl ReadLocation for ScriptedTransport {
    fn read(
        &self,
        location: &str,
        request: &ReadRequest<'_>,
        on_data: &mut dyn FnMut(&[u8]),
    ) -> Result<(), TransportError> {
        self.attempts.lock().unwrap().push(location.to_owned());
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(self.fallback);

        let content = if request.is_full_read {
            &self.content[..]
        } else {
            let start = (request.offset as usize).min(self.content.len());
            let end = (start + request.size).min(self.content.len());
            &self.content[start..end]
        };

        match step {
            Step::Succeed => {
                content.chunks(PIECE_SIZE).for_each(|piece| on_data(piece));
                Ok(())
            }
            Step::Fail {
                delivered,
                retryable,
            } => {
                content[..delivered.min(content.len())]
                    .chunks(PIECE_SIZE)
                    .for_each(|piece| on_data(piece));
                let message = format!("Read from {} failed.", location);
                if retryable {
                    Err(TransportError::retryable_msg(message))
                } else {
                    Err(TransportError::terminal_msg(message))
                }
            }
        }
    }
}

/// Return a lookup function which resolves every chunk to the given `locations`.
pub fn fixed_locations(
    locations: &[&str],
) -> impl Fn(&ChunkId) -> anyhow::Result<Vec<String>> + Send + Sync {
    let locations: Vec<String> = locations.iter().map(|location| location.to_string()).collect();
    move |_: &ChunkId| Ok(locations.clone())
}
