pub mod registry;
pub mod supervisor;

pub use registry::{ChannelRegistry, InMemoryChannelRegistry};
pub use supervisor::{PresenceSupervisor, SupervisorHandle};
