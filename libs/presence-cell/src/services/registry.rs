use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use crate::models::{ChannelHandle, ChannelState, RegistryError};

/// The realtime client's view of its live subscriptions.
///
/// Injected into the supervisor; the supervisor only lists and removes.
pub trait ChannelRegistry: Send + Sync {
    /// Current channels, in registration order.
    fn list_channels(&self) -> Result<Vec<ChannelHandle>, RegistryError>;

    /// Tears a channel down. Must succeed for channels that are already gone.
    fn remove(&self, handle: &ChannelHandle) -> Result<(), RegistryError>;
}

/// Thread-safe registry kept in process memory.
#[derive(Default)]
pub struct InMemoryChannelRegistry {
    channels: RwLock<Vec<ChannelHandle>>,
    list_calls: AtomicUsize,
}

impl InMemoryChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new channel in the `Connecting` state.
    pub fn subscribe(&self, topic: impl Into<String>) -> Result<ChannelHandle, RegistryError> {
        let handle = ChannelHandle::new(topic, ChannelState::Connecting);
        self.write()?.push(handle.clone());
        debug!("Subscribed realtime channel {} ({})", handle.topic, handle.id);
        Ok(handle)
    }

    /// Returns `false` when no channel with `id` is registered.
    pub fn set_state(&self, id: Uuid, state: ChannelState) -> Result<bool, RegistryError> {
        let mut channels = self.write()?;
        match channels.iter_mut().find(|channel| channel.id == id) {
            Some(channel) => {
                debug!("Channel {} {} -> {}", channel.topic, channel.state, state);
                channel.state = state;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.read()?.is_empty())
    }

    /// Number of times `list_channels` has been called.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<ChannelHandle>>, RegistryError> {
        self.channels
            .read()
            .map_err(|_| RegistryError::Unavailable("channel registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<ChannelHandle>>, RegistryError> {
        self.channels
            .write()
            .map_err(|_| RegistryError::Unavailable("channel registry lock poisoned".to_string()))
    }
}

impl ChannelRegistry for InMemoryChannelRegistry {
    fn list_channels(&self) -> Result<Vec<ChannelHandle>, RegistryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.read()?.clone())
    }

    fn remove(&self, handle: &ChannelHandle) -> Result<(), RegistryError> {
        let mut channels = self.write()?;
        let before = channels.len();
        channels.retain(|channel| channel.id != handle.id);

        if channels.len() < before {
            debug!("Removed realtime channel {} ({})", handle.topic, handle.id);
        }
        Ok(())
    }
}
