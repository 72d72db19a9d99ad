//! Type-erased event payload

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// Default payload of parameterized events in an
/// [`EventRegistry`](crate::EventRegistry).
///
/// Carries any `Send + Sync` value; listeners downcast to the type they
/// expect.
#[derive(Clone, Default)]
pub struct EventArgs {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: Option<&'static str>,
}

impl EventArgs {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
            type_name: Some(type_name::<T>()),
        }
    }

    /// Payload without a value
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl fmt::Debug for EventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name {
            Some(name) => write!(f, "EventArgs({})", name),
            None => write!(f, "EventArgs(empty)"),
        }
    }
}
