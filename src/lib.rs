// Herald - named events and late-bound listeners
//
// This library wires the event registry, the component store and logging
// together behind a single host object.

// Re-export the event system
pub use herald_events::*;

// Re-export logging setup
pub use herald_log;

pub mod error;
pub mod host;
pub mod store;

pub use error::HostError;
pub use host::{Host, HostBuilder};
pub use store::ComponentStore;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::host::{Host, HostBuilder};
    pub use crate::store::ComponentStore;
    pub use herald_events::{
        BindingDescriptor, Callback, ComponentRef, CyclePolicy, DynamicBinding, Event, EventArgs,
        EventError, EventKind, EventRegistry, ListenerError, ListenerResult, MethodTableBuilder,
        ObjectId, Reflect, RegistryBuilder, RegistryConfig, Signal,
    };
}
