// =====================================================================================
// PRESENCE CELL - REALTIME CHANNEL SUPERVISION
// =====================================================================================
//
// Keeps the client's realtime data link honest:
// - Samples every registered channel on a fixed period
// - Publishes an aggregate connectivity verdict
// - Tears all channels down after sustained degradation and signals the
//   owning layer to resubscribe
//
// The supervisor never creates channels; resubscribing on `PresenceEvent::Escalated`
// is the owner's job.
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{
    ChannelHandle, ChannelState, PresenceConfig, PresenceError, PresenceEvent, PresenceState,
    PresenceVerdict, RegistryError,
};

pub use services::{ChannelRegistry, InMemoryChannelRegistry, PresenceSupervisor, SupervisorHandle};
