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

/// The factor the wait between retry rounds grows by after each round.
pub const BACKOFF_MULTIPLIER: f64 = 1.5;

/// The shortest wait a [`Backoff`] will produce.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// The configuration for a [`ChunkFetcher`].
///
/// This type implements `Default` to provide a reasonable default configuration.
///
/// [`ChunkFetcher`]: crate::fetch::ChunkFetcher
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct FetchConfig {
    /// How long to wait after the first round of attempts fails.
    ///
    /// The default value is one second.
    pub initial_wait: Duration,

    /// The ceiling on the wait between rounds.
    ///
    /// Once the wait grows to this value, the fetcher gives up and returns the last error instead
    /// of starting another round. The default value is six seconds.
    pub max_wait: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            initial_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(6),
        }
    }
}

/// The schedule of waits between retry rounds.
///
/// This yields `initial_wait`, then grows each wait by [`BACKOFF_MULTIPLIER`] until it reaches
/// `max_wait`, at which point it is exhausted.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max_wait: Duration,
}

impl Backoff {
    /// Create the backoff schedule described by `config`.
    pub fn new(config: &FetchConfig) -> Self {
        Backoff {
            next: config.initial_wait.max(MIN_WAIT),
            max_wait: config.max_wait,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.max_wait {
            return None;
        }
        let wait = self.next;
        self.next = wait.mul_f64(BACKOFF_MULTIPLIER);
        Some(wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_grows_by_half() {
        let waits: Vec<_> = Backoff::new(&FetchConfig::default()).collect();

        assert_eq!(
            waits,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(1500),
                Duration::from_millis(2250),
                Duration::from_micros(3_375_000),
                Duration::from_micros(5_062_500),
            ]
        );
    }

    #[test]
    fn schedule_is_empty_when_ceiling_is_below_initial_wait() {
        let mut config = FetchConfig::default();
        config.max_wait = Duration::from_millis(500);

        assert_eq!(Backoff::new(&config).count(), 0);
    }

    #[test]
    fn zero_initial_wait_still_terminates() {
        let mut config = FetchConfig::default();
        config.initial_wait = Duration::ZERO;
        config.max_wait = Duration::from_millis(10);

        let waits: Vec<_> = Backoff::new(&config).collect();

        assert!(!waits.is_empty());
        assert!(waits.iter().all(|wait| *wait < config.max_wait));
    }
}
