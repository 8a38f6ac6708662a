//! Real-time presence and playback synchronization.

pub mod event;
pub mod hub;
pub mod membership;
pub mod registry;
pub mod relay;
pub mod ws;

pub use event::{ClientEvent, ConnectionId, ServerEvent};
pub use hub::SyncHub;
pub use membership::Roster;
pub use registry::{ConnState, Registry, RegistryError};
pub use relay::Relay;
