// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-rate polling with switch-to-latest delivery.
//!
//! A poll fetches immediately, then once per interval measured from the
//! start (not from the previous completion). When a tick fires while the
//! previous fetch is still pending, the pending fetch is dropped, so only the
//! most recently started fetch can ever deliver. Failures are handed to the
//! caller like any other result and are not retried here.

use crate::services::FetchError;
use futures_util::future::OptionFuture;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Handle to a running poll. Cancels the poll when dropped.
pub struct PollHandle {
    label: &'static str,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the timer and discard any in-flight fetch. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(poll = self.label, "Poll cancelled");
        }
        self.cancel.cancel();
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling `fetch` every `interval`, handing each delivered result to
/// `on_result`.
///
/// Must be called from within a Tokio runtime.
pub fn start_polling<T, F, Fut, R>(
    label: &'static str,
    interval: Duration,
    fetch: F,
    on_result: R,
) -> PollHandle
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    R: FnMut(Result<T, FetchError>) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let task = tokio::spawn(
        run(label, interval, fetch, on_result, cancel.clone()).in_current_span(),
    );

    tracing::debug!(poll = label, interval_secs = interval.as_secs(), "Poll started");
    PollHandle {
        label,
        cancel,
        task,
    }
}

async fn run<T, F, Fut, R>(
    label: &'static str,
    interval: Duration,
    fetch: F,
    mut on_result: R,
    cancel: CancellationToken,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    R: FnMut(Result<T, FetchError>),
{
    // First tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<Pin<Box<Fut>>> = None;
    let mut generation: u64 = 0;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(result) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                in_flight = None;
                if cancel.is_cancelled() {
                    break;
                }
                tracing::debug!(poll = label, generation, ok = result.is_ok(), "Poll fetch completed");
                on_result(result);
            }

            _ = ticker.tick() => {
                generation += 1;
                if in_flight.is_some() {
                    tracing::debug!(poll = label, generation, "Superseding in-flight fetch");
                }
                // Replacing the future drops the stale fetch.
                in_flight = Some(Box::pin(fetch()));
            }
        }
    }
}
