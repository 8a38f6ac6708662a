//! Room rosters, computed on demand from the registry.

use super::{
    event::ConnectionId,
    registry::{ConnState, Registry},
};

/// A point-in-time view of one room, in join order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    members: Vec<(ConnectionId, String)>,
}

impl Roster {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn usernames(&self) -> Vec<String> {
        self.members.iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.iter().map(|(id, _)| *id)
    }

    /// Earliest joined member that isn't `except`.
    pub fn first_other(&self, except: ConnectionId) -> Option<ConnectionId> {
        self.ids().find(|id| *id != except)
    }
}

impl Registry {
    pub fn roster(&self, room_code: &str) -> Roster {
        let inner = self.lock();
        let mut members: Vec<_> = inner
            .conns
            .iter()
            .filter_map(|(id, conn)| match &conn.state {
                ConnState::Joined { username, room_code: code } if code == room_code => {
                    Some((conn.joined_at, *id, username.clone()))
                }
                _ => None,
            })
            .collect();
        drop(inner);

        members.sort_by_key(|(seq, _, _)| *seq);
        Roster {
            members: members.into_iter().map(|(_, id, name)| (id, name)).collect(),
        }
    }

    pub fn count(&self, room_code: &str) -> usize {
        self.roster(room_code).count()
    }

    pub fn members(&self, room_code: &str) -> Vec<String> {
        self.roster(room_code).usernames()
    }
}
