// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-connection session: owns the polls feeding one client.
//!
//! State machine:
//! - `AwaitingParams`: entered on connect; the activity poll runs.
//! - `Active`: a valid coordinate arrived; the weather poll runs too.
//! - `Closed`: terminal; every poll is cancelled and nothing is sent again.
//!
//! Deliveries and `close()` take the same per-session lock, so once `close()`
//! returns no further message reaches the outbox.

use crate::models::{parse_client_message, ActivityRecord, Coordinate, PushMessage};
use crate::models::{MessageError, WeatherSnapshot};
use crate::poller::{start_polling, PollHandle};
use crate::services::{ActivityProvider, FetchError, WeatherProvider};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

/// Sending half of a connection's outgoing message queue.
pub type Outbox = mpsc::UnboundedSender<PushMessage>;

/// Shared collaborators handed to every session.
#[derive(Clone)]
pub struct SessionDeps {
    pub weather: Arc<dyn WeatherProvider>,
    pub activities: Arc<dyn ActivityProvider>,
    pub weather_interval: Duration,
    pub activity_interval: Duration,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingParams,
    Active,
    Closed,
}

struct Inner {
    state: SessionState,
    coordinate: Option<Coordinate>,
    activity_poll: Option<PollHandle>,
    weather_poll: Option<PollHandle>,
    /// Bumped whenever the weather poll is replaced; stale deliveries carry
    /// an older value and are dropped.
    weather_epoch: u64,
}

struct Shared {
    id: u64,
    outbox: Outbox,
    inner: Mutex<Inner>,
}

/// Server-side state bound to one client connection.
pub struct Session {
    shared: Arc<Shared>,
    deps: SessionDeps,
}

impl Session {
    /// Create the session and start its activity poll immediately.
    pub fn connect(id: u64, deps: SessionDeps, outbox: Outbox) -> Self {
        let session = Self {
            shared: Arc::new(Shared {
                id,
                outbox,
                inner: Mutex::new(Inner {
                    state: SessionState::AwaitingParams,
                    coordinate: None,
                    activity_poll: None,
                    weather_poll: None,
                    weather_epoch: 0,
                }),
            }),
            deps,
        };

        let poll = session.start_activity_poll();
        session.shared.inner.lock().activity_poll = Some(poll);

        tracing::info!(connection_id = id, "Session started");
        session
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    /// Coordinate driving the weather poll, once one has been received.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.shared.inner.lock().coordinate
    }

    /// Number of polls currently owned by this session.
    pub fn live_polls(&self) -> usize {
        let inner = self.shared.inner.lock();
        usize::from(inner.activity_poll.is_some()) + usize::from(inner.weather_poll.is_some())
    }

    /// Handle a raw text frame from the client.
    ///
    /// Malformed messages are logged and ignored. A valid coordinate starts
    /// the weather poll; a different coordinate later replaces it.
    pub fn on_message(&self, raw: &str) -> Result<(), MessageError> {
        let coord = match parse_client_message(raw) {
            Ok(coord) => coord,
            Err(e) => {
                tracing::warn!(
                    connection_id = self.id(),
                    error = %e,
                    "Ignoring client message"
                );
                return Err(e);
            }
        };

        let mut inner = self.shared.inner.lock();
        match inner.state {
            SessionState::Closed => return Ok(()),
            SessionState::Active if inner.coordinate == Some(coord) => {
                tracing::debug!(connection_id = self.id(), "Coordinate unchanged");
                return Ok(());
            }
            _ => {}
        }

        // Cancel the old poll before the new one exists.
        if let Some(old) = inner.weather_poll.take() {
            old.cancel();
            tracing::info!(connection_id = self.id(), "Replacing weather poll");
        }

        inner.weather_epoch += 1;
        inner.weather_poll = Some(self.start_weather_poll(coord, inner.weather_epoch));
        inner.coordinate = Some(coord);
        inner.state = SessionState::Active;

        tracing::info!(
            connection_id = self.id(),
            lat = coord.lat,
            lon = coord.lon,
            "Weather poll started"
        );
        Ok(())
    }

    /// Cancel every poll and mark the session closed.
    ///
    /// Returns `true` only for the call that actually closed the session.
    pub fn close(&self) -> bool {
        let mut inner = self.shared.inner.lock();
        if inner.state == SessionState::Closed {
            return false;
        }

        inner.state = SessionState::Closed;
        for poll in [inner.activity_poll.take(), inner.weather_poll.take()]
            .into_iter()
            .flatten()
        {
            poll.cancel();
        }

        tracing::info!(connection_id = self.id(), "Session closed");
        true
    }

    fn start_activity_poll(&self) -> PollHandle {
        let provider = self.deps.activities.clone();
        let fetch = move || {
            let provider = provider.clone();
            async move { provider.recent_activities().await }
        };

        let shared = Arc::downgrade(&self.shared);
        let on_result = move |result: Result<Vec<ActivityRecord>, FetchError>| match result {
            Ok(activities) => deliver(&shared, None, PushMessage::Garmin(activities.into())),
            Err(e) => log_fetch_error(&shared, "garmin", &e),
        };

        start_polling("garmin", self.deps.activity_interval, fetch, on_result)
    }

    fn start_weather_poll(&self, coord: Coordinate, epoch: u64) -> PollHandle {
        let provider = self.deps.weather.clone();
        let fetch = move || {
            let provider = provider.clone();
            async move { provider.snapshot(coord).await }
        };

        let shared = Arc::downgrade(&self.shared);
        let on_result = move |result: Result<WeatherSnapshot, FetchError>| match result {
            Ok(snapshot) => deliver(&shared, Some(epoch), PushMessage::Weather(snapshot)),
            Err(e) => log_fetch_error(&shared, "weather", &e),
        };

        start_polling("weather", self.deps.weather_interval, fetch, on_result)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Push a message unless the session closed or the poll was superseded.
/// A connection that went away in the meantime is not an error.
fn deliver(shared: &Weak<Shared>, weather_epoch: Option<u64>, message: PushMessage) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let inner = shared.inner.lock();
    if inner.state == SessionState::Closed {
        return;
    }
    if weather_epoch.is_some_and(|epoch| epoch != inner.weather_epoch) {
        tracing::debug!(connection_id = shared.id, "Dropping superseded weather result");
        return;
    }

    let channel = message.channel();
    if shared.outbox.send(message).is_err() {
        tracing::debug!(
            connection_id = shared.id,
            channel,
            "Connection gone, dropping message"
        );
    } else {
        tracing::debug!(connection_id = shared.id, channel, "Message queued");
    }
}

fn log_fetch_error(shared: &Weak<Shared>, channel: &str, error: &FetchError) {
    let connection_id = shared.upgrade().map(|s| s.id);
    tracing::warn!(
        connection_id = ?connection_id,
        channel,
        error = %error,
        "Fetch failed, waiting for next tick"
    );
}
