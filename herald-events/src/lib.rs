//! Named events and late-bound listeners for Herald
//!
//! This crate provides in-process, synchronous event broadcasting.
//!
//! ## Features
//!
//! - **Events** - Ordered listener lists, parameterless or carrying a payload
//! - **Dynamic Bindings** - Listeners that name a method on a component and
//!   resolve it at call time
//! - **Registry** - String keyed events, created on demand
//! - **Resilient** - Listeners whose target is gone are dropped, not fatal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald_events::*;
//!
//! let jumped: Signal = Event::new("jump");
//! jumped.add_listener(Callback::action(|| println!("jumped")));
//! jumped.fire()?;
//! ```
//!
//! ## Dynamic Bindings
//!
//! ```rust,ignore
//! struct Lamp { level: AtomicU32 }
//!
//! impl Reflect for Lamp {
//!     fn register_methods(methods: &mut MethodTableBuilder<Self>) {
//!         methods.method_with("dim", "level", |lamp, level: &u32| {
//!             lamp.level.store(*level, Ordering::SeqCst);
//!             Ok(())
//!         });
//!     }
//! }
//!
//! let lamp = Arc::new(Lamp { level: AtomicU32::new(100) });
//! let dimmed: Event<u32> = Event::new("dimmed");
//! dimmed.add_binding(DynamicBinding::to_component(
//!     ComponentRef::new(ObjectId::new(), &lamp),
//!     "dim",
//! ));
//!
//! dimmed.invoke(&40)?;
//!
//! // Once the lamp is dropped the binding is pruned on the next invoke
//! drop(lamp);
//! dimmed.invoke(&10)?;
//! ```
//!
//! ## Registry
//!
//! ```rust,ignore
//! let registry: EventRegistry = RegistryBuilder::new()
//!     .continue_on_error(true)
//!     .enable_logging(true)
//!     .build();
//!
//! registry.add_listener("jump", Callback::action(|| println!("jumped")));
//! registry.invoke("jump", false)?;
//!
//! match registry.invoke("missing", false) {
//!     Err(EventError::UnknownEvent(key)) => eprintln!("no event {}", key),
//!     other => other?,
//! }
//! ```

pub mod args;
pub mod binding;
pub mod callback;
pub mod component;
pub mod config;
pub mod error;
pub mod event;
pub mod extensions;
pub mod registry;

pub use args::EventArgs;
pub use binding::{BindingDescriptor, DynamicBinding};
pub use callback::Callback;
pub use component::{
    Arity, ComponentLookup, ComponentRef, MethodEntry, MethodTable, MethodTableBuilder, ObjectId,
    Reflect,
};
pub use config::{CyclePolicy, DispatchPolicy, RegistryConfig};
pub use error::{DispatchError, EventError, ListenerError, ListenerResult, Result};
pub use event::{Event, Signal};
pub use registry::{EventKey, EventKind, EventRegistry, RegistryBuilder};
