// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A small sliding-window call limiter, used by source adapters and
//! narrative generators that sit in front of a rate-limited upstream.
//!
//! Single synchronization primitive guarding access to a resource,
//! constructed once and shared behind an `Arc` -- a rate limiter over
//! wall-clock time rather than concurrency.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Tracks call timestamps within a trailing time window and admits new
/// calls only while the window holds fewer than `max_calls`.
pub struct RateLimiter {
    max_calls: usize,
    window: chrono::Duration,
    calls: Mutex<Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window_seconds: i64) -> Self {
        Self {
            max_calls,
            window: chrono::Duration::seconds(window_seconds),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Drops calls older than the window and reports whether another
    /// call would still fit under `max_calls`. Does not itself record
    /// anything -- callers that proceed must call [`record_call`].
    ///
    /// [`record_call`]: RateLimiter::record_call
    pub fn can_proceed(&self, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        let mut calls = self.calls.lock();
        calls.retain(|&call| call > cutoff);
        calls.len() < self.max_calls
    }

    pub fn record_call(&self, now: DateTime<Utc>) {
        self.calls.lock().push(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn admits_calls_until_the_limit_is_reached() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.can_proceed(ts(0)));
        limiter.record_call(ts(0));
        assert!(limiter.can_proceed(ts(1)));
        limiter.record_call(ts(1));
        assert!(!limiter.can_proceed(ts(2)));
    }

    #[test]
    fn calls_expire_after_the_window() {
        let limiter = RateLimiter::new(1, 10);
        limiter.record_call(ts(0));
        assert!(!limiter.can_proceed(ts(5)));
        assert!(limiter.can_proceed(ts(11)));
    }
}
