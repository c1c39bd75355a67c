// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registry of live push connections, owned by the server state.

use crate::session::Session;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live sessions keyed by connection ID. Clones share the same map.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    sessions: Arc<DashMap<u64, Arc<Session>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh connection ID (never reused within a process).
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Track a session under its connection ID.
    pub fn register(&self, session: Arc<Session>) {
        let id = session.id();
        self.sessions.insert(id, session);
        tracing::debug!(
            connection_id = id,
            connections = self.sessions.len(),
            "Connection registered"
        );
    }

    pub fn get(&self, id: u64) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Close a session and forget it. Safe to call more than once; returns
    /// `true` only when this call removed the entry.
    pub fn close(&self, id: u64) -> bool {
        let Some((_, session)) = self.sessions.remove(&id) else {
            return false;
        };
        session.close();

        tracing::debug!(
            connection_id = id,
            connections = self.sessions.len(),
            "Connection unregistered"
        );
        true
    }

    /// Close every open session (best effort, no draining).
    pub fn close_all(&self) -> usize {
        let ids = self.ids();
        let closed = ids.into_iter().filter(|&id| self.close(id)).count();
        tracing::info!(closed, "Closed all connections");
        closed
    }

    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
