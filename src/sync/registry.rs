//! Per-connection ephemeral state.
//!
//! The registry is the only shared mutable state of the sync engine. Its
//! lock is taken for the duration of a single call and never held across
//! an `.await`, so every mutation happens inside one event's synchronous
//! window.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tokio::sync::mpsc;

use super::event::{ConnectionId, ServerEvent};

pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnState {
    Anonymous,
    /// Room existence is being checked with the store.
    Joining,
    Joined { username: String, room_code: String },
}

#[derive(Debug)]
pub(crate) struct Connection {
    pub(crate) outbox: Outbox,
    pub(crate) state: ConnState,
    /// Position in join order, valid while `Joined`.
    pub(crate) joined_at: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is already bound to a room")]
    AlreadyBound(ConnectionId),
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
}

#[derive(Default)]
pub(crate) struct Inner {
    pub(crate) conns: HashMap<ConnectionId, Connection>,
    next_seq: u64,
}

#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a freshly accepted connection as `Anonymous`.
    pub fn connect(&self, id: ConnectionId, outbox: Outbox) {
        self.lock().conns.insert(id, Connection {
            outbox,
            state: ConnState::Anonymous,
            joined_at: 0,
        });
    }

    /// Destroys the connection entry. Returns the binding it still held, if any.
    pub fn remove(&self, id: ConnectionId) -> Option<(String, String)> {
        match self.lock().conns.remove(&id)?.state {
            ConnState::Joined { username, room_code } => Some((username, room_code)),
            _ => None,
        }
    }

    pub fn state(&self, id: ConnectionId) -> Option<ConnState> {
        self.lock().conns.get(&id).map(|c| c.state.clone())
    }

    /// `Anonymous -> Joining`. False if the connection is unknown or not anonymous.
    pub fn begin_join(&self, id: ConnectionId) -> bool {
        let mut inner = self.lock();
        match inner.conns.get_mut(&id) {
            Some(conn) if conn.state == ConnState::Anonymous => {
                conn.state = ConnState::Joining;
                true
            }
            _ => false,
        }
    }

    /// `Joining -> Anonymous` after a failed join.
    pub fn abort_join(&self, id: ConnectionId) {
        if let Some(conn) = self.lock().conns.get_mut(&id) {
            if conn.state == ConnState::Joining {
                conn.state = ConnState::Anonymous;
            }
        }
    }

    pub fn bind(&self, id: ConnectionId, username: &str, room_code: &str) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        let seq = inner.next_seq;

        let conn = inner.conns.get_mut(&id).ok_or(RegistryError::UnknownConnection(id))?;
        if matches!(conn.state, ConnState::Joined { .. }) {
            return Err(RegistryError::AlreadyBound(id));
        }

        conn.state = ConnState::Joined {
            username: username.to_owned(),
            room_code: room_code.to_owned(),
        };
        conn.joined_at = seq;
        inner.next_seq += 1;
        Ok(())
    }

    /// Idempotent. Returns the previous `(username, room_code)`.
    pub fn unbind(&self, id: ConnectionId) -> Option<(String, String)> {
        let mut inner = self.lock();
        let conn = inner.conns.get_mut(&id)?;

        match std::mem::replace(&mut conn.state, ConnState::Anonymous) {
            ConnState::Joined { username, room_code } => Some((username, room_code)),
            other => {
                conn.state = other;
                None
            }
        }
    }

    pub fn lookup(&self, id: ConnectionId) -> Option<(String, String)> {
        match &self.lock().conns.get(&id)?.state {
            ConnState::Joined { username, room_code } => Some((username.clone(), room_code.clone())),
            _ => None,
        }
    }

    pub(crate) fn outbox(&self, id: ConnectionId) -> Option<Outbox> {
        self.lock().conns.get(&id).map(|c| c.outbox.clone())
    }
}
