//! Fire-and-forget fan-out over room rosters.
//!
//! Delivery is at-most-once: a send to a connection whose socket has
//! already closed is dropped without telling the sender.

use std::sync::Arc;

use tracing::debug;

use super::{
    event::{ConnectionId, ServerEvent},
    registry::Registry,
};

pub struct Relay {
    registry: Arc<Registry>,
}

impl Relay {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn broadcast_to_others(&self, room_code: &str, sender: ConnectionId, event: ServerEvent) {
        self.fan_out(room_code, Some(sender), event);
    }

    pub fn broadcast_to_all(&self, room_code: &str, event: ServerEvent) {
        self.fan_out(room_code, None, event);
    }

    pub fn unicast(&self, id: ConnectionId, event: ServerEvent) {
        match self.registry.outbox(id) {
            Some(outbox) => {
                let _ = outbox.send(event);
            }
            None => debug!(%id, "unicast target is gone"),
        }
    }

    fn fan_out(&self, room_code: &str, exclude: Option<ConnectionId>, event: ServerEvent) {
        let roster = self.registry.roster(room_code);
        for id in roster.ids().filter(|id| Some(*id) != exclude) {
            self.unicast(id, event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn member(
        reg: &Registry,
        username: &str,
        room: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        reg.connect(id, tx);
        reg.bind(id, username, room).unwrap();
        (id, rx)
    }

    fn msg(text: &str) -> ServerEvent {
        ServerEvent::NewMessage { username: "A".into(), message: text.into() }
    }

    #[test]
    fn others_excludes_sender_and_other_rooms() {
        let reg = Arc::new(Registry::new());
        let relay = Relay::new(reg.clone());
        let (a, mut a_rx) = member(&reg, "A", "R1");
        let (_, mut b_rx) = member(&reg, "B", "R1");
        let (_, mut c_rx) = member(&reg, "C", "R2");

        relay.broadcast_to_others("R1", a, msg("hi"));

        assert_eq!(b_rx.try_recv().unwrap(), msg("hi"));
        assert!(a_rx.try_recv().is_err());
        assert!(c_rx.try_recv().is_err());
    }

    #[test]
    fn all_includes_sender() {
        let reg = Arc::new(Registry::new());
        let relay = Relay::new(reg.clone());
        let (_, mut a_rx) = member(&reg, "A", "R1");
        let (_, mut b_rx) = member(&reg, "B", "R1");

        relay.broadcast_to_all("R1", msg("hi"));

        assert_eq!(a_rx.try_recv().unwrap(), msg("hi"));
        assert_eq!(b_rx.try_recv().unwrap(), msg("hi"));
    }

    #[test]
    fn unicast_to_missing_connection_is_a_no_op() {
        let reg = Arc::new(Registry::new());
        let relay = Relay::new(reg.clone());
        let (a, a_rx) = member(&reg, "A", "R1");

        relay.unicast(ConnectionId::new(), msg("lost"));

        drop(a_rx);
        relay.unicast(a, msg("closed socket"));

        reg.remove(a);
        relay.unicast(a, msg("removed"));
    }
}
