//! Directly attached listeners

use crate::error::{ListenerError, ListenerResult};
use crate::event::Event;
use std::fmt;
use std::sync::Arc;

type ListenerFn<A> = Arc<dyn Fn(&A) -> ListenerResult + Send + Sync>;

/// A listener attached to an event without going through a binding.
///
/// Callbacks compare by identity: two clones of the same callback are equal,
/// two callbacks built from identical closures are not. A callback that
/// forwards to another event compares equal to any forwarder of that event.
pub struct Callback<A: 'static> {
    kind: Kind<A>,
}

enum Kind<A: 'static> {
    Func(ListenerFn<A>),
    Forward(Event<A>),
}

impl<A: Send + Sync + 'static> Callback<A> {
    /// Wrap a fallible listener
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            kind: Kind::Func(Arc::new(f)),
        }
    }

    /// Wrap a listener that cannot fail
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        Self::new(move |arg| {
            f(arg);
            Ok(())
        })
    }

    pub(crate) fn forward(event: Event<A>) -> Self {
        Self {
            kind: Kind::Forward(event),
        }
    }

    /// Run the listener
    pub fn call(&self, arg: &A) -> ListenerResult {
        match &self.kind {
            Kind::Func(f) => f(arg),
            Kind::Forward(event) => event.invoke(arg).map_err(|source| ListenerError::Forwarded {
                event: event.id(),
                source: Box::new(source),
            }),
        }
    }

    /// The event this callback forwards to, if it is a forwarder
    pub fn forwards_to(&self) -> Option<&Event<A>> {
        match &self.kind {
            Kind::Forward(event) => Some(event),
            Kind::Func(_) => None,
        }
    }
}

impl Callback<()> {
    /// Wrap a parameterless listener that cannot fail
    pub fn action<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::from_fn(move |_: &()| f())
    }
}

impl<A: 'static> Clone for Callback<A> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Func(f) => Kind::Func(Arc::clone(f)),
            Kind::Forward(event) => Kind::Forward(event.clone()),
        };
        Self { kind }
    }
}

impl<A: 'static> PartialEq for Callback<A> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (Kind::Func(a), Kind::Func(b)) => Arc::ptr_eq(a, b),
            (Kind::Forward(a), Kind::Forward(b)) => a.same_event(b),
            _ => false,
        }
    }
}

impl<A: 'static> Eq for Callback<A> {}

impl<A: 'static> fmt::Debug for Callback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Func(func) => write!(f, "Callback({:p})", Arc::as_ptr(func)),
            Kind::Forward(event) => write!(f, "Callback(forward -> {})", event.uid()),
        }
    }
}
