// src/wiki/pacer.rs
// =============================================================================
// Politeness delay for the Wikipedia API.
//
// The Pacer remembers when the last request *finished* and makes the next
// caller wait until `finished + interval`. The very first request also waits
// one full interval. A slow request therefore never eats into the gap.
//
// `wait()` hands back a `PacerSlot`. The request runs while the slot is held,
// and dropping the slot stamps the finish time. Because the state sits behind
// a mutex, one Pacer can be shared (via Arc) by several tasks and acts as a
// single rate limiter: the next caller only gets in after the current request
// is done.
// =============================================================================

use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

/// Permission to send one request. Dropping it marks the request finished.
#[must_use = "the request must run while the slot is held"]
pub struct PacerSlot<'a> {
    last_finished: MutexGuard<'a, Option<Instant>>,
}

impl Drop for PacerSlot<'_> {
    fn drop(&mut self) {
        *self.last_finished = Some(Instant::now());
    }
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: Mutex::new(None),
        }
    }

    /// Waits until the next request is allowed, then claims the slot.
    pub async fn wait(&self) -> PacerSlot<'_> {
        let last_finished = self.last_finished.lock().await;
        let deadline = match *last_finished {
            Some(previous) => previous + self.interval,
            None => Instant::now() + self.interval,
        };
        sleep_until(deadline).await;
        PacerSlot { last_finished }
    }
}
