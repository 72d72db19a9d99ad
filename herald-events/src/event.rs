//! Events: named listener lists invoked together

use crate::binding::DynamicBinding;
use crate::callback::Callback;
use crate::config::{CyclePolicy, DispatchPolicy};
use crate::error::{DispatchError, ListenerError, ListenerResult};
use crate::extensions::bindings_to_callbacks;
use parking_lot::RwLock;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{trace, warn};
use uuid::Uuid;

/// A named set of listeners broadcast to on [`invoke`](Event::invoke).
///
/// `Event<()>` is the parameterless variant; any other `A` is the payload
/// handed to every listener. Events are cheap handles: clones share the same
/// listener lists, so an event registered in an
/// [`EventRegistry`](crate::EventRegistry) can still be used by whoever
/// created it.
///
/// Invocation order is fixed: dynamic bindings newest first, then direct
/// callbacks newest first. Listener lists are only locked while they are
/// copied or changed, never while a listener runs, so listeners may add or
/// remove listeners (on this event too) while a broadcast is in flight.
pub struct Event<A: 'static = ()> {
    inner: Arc<EventInner<A>>,
}

struct EventInner<A: 'static> {
    uid: Uuid,
    id: RwLock<String>,
    use_instance_id: bool,
    policy: RwLock<DispatchPolicy>,
    bindings: RwLock<Vec<DynamicBinding>>,
    callbacks: RwLock<Vec<Callback<A>>>,
}

/// Parameterless event
pub type Signal = Event<()>;

impl<A: 'static> Event<A> {
    fn build(id: String, use_instance_id: bool) -> Self {
        Self {
            inner: Arc::new(EventInner {
                uid: Uuid::new_v4(),
                id: RwLock::new(id),
                use_instance_id,
                policy: RwLock::new(DispatchPolicy::default()),
                bindings: RwLock::new(Vec::new()),
                callbacks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Unique identity of this event instance
    pub fn uid(&self) -> Uuid {
        self.inner.uid
    }

    /// Whether both handles point at the same event
    pub fn same_event(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Effective id, including the instance token when enabled
    pub fn id(&self) -> String {
        let base = self.inner.id.read();
        if self.inner.use_instance_id {
            format!("{}#{}", base.as_str(), self.instance_token())
        } else {
            base.clone()
        }
    }

    /// Explicit id without the instance token
    pub fn base_id(&self) -> String {
        self.inner.id.read().clone()
    }

    /// Rename the event. Listeners are untouched.
    pub fn set_id(&self, id: impl Into<String>) {
        *self.inner.id.write() = id.into();
    }

    pub fn uses_instance_id(&self) -> bool {
        self.inner.use_instance_id
    }

    fn instance_token(&self) -> String {
        let simple = self.inner.uid.simple().to_string();
        simple[..8].to_string()
    }

    pub fn policy(&self) -> DispatchPolicy {
        *self.inner.policy.read()
    }

    pub fn set_policy(&self, policy: DispatchPolicy) {
        *self.inner.policy.write() = policy;
    }
}

impl<A: Send + Sync + 'static> Event<A> {
    /// Create an event with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self::build(id.into(), false)
    }

    /// Create an event whose effective id carries a per-instance token, so
    /// two events sharing an explicit id stay distinguishable.
    pub fn with_instance_id(id: impl Into<String>) -> Self {
        Self::build(id.into(), true)
    }

    /// Builder style policy override
    pub fn with_policy(self, policy: DispatchPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    /// Builder style [`add_listener`](Self::add_listener)
    pub fn with_listener(self, callback: Callback<A>) -> Self {
        self.add_listener(callback);
        self
    }

    /// Wrap a single callback into a fresh, unnamed event
    pub fn from_callback(callback: Callback<A>) -> Self {
        Self::new(String::new()).with_listener(callback)
    }

    /// A callback that invokes this event, seeing its listeners at call time
    pub fn as_callback(&self) -> Callback<A> {
        Callback::forward(self.clone())
    }

    /// Flatten the direct callbacks into one callback that runs them in
    /// insertion order. Dynamic bindings are not included, and callbacks
    /// added afterwards are not seen.
    pub fn as_combined_callback(&self) -> Callback<A> {
        let callbacks = self.inner.callbacks.read().clone();
        Callback::new(move |arg: &A| {
            for callback in &callbacks {
                callback.call(arg)?;
            }
            Ok(())
        })
    }

    /// Append a direct callback
    pub fn add_listener(&self, callback: Callback<A>) {
        self.inner.callbacks.write().push(callback);
    }

    /// Forward to `other` whenever this event fires
    pub fn add_event_listener(&self, other: &Event<A>) {
        self.add_listener(other.as_callback());
    }

    /// Remove the first matching direct callback
    pub fn remove_listener(&self, callback: &Callback<A>) -> bool {
        let mut callbacks = self.inner.callbacks.write();
        match callbacks.iter().position(|c| c == callback) {
            Some(idx) => {
                callbacks.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Stop forwarding to `other`
    pub fn remove_event_listener(&self, other: &Event<A>) -> bool {
        self.remove_listener(&other.as_callback())
    }

    /// Membership test on the direct callbacks only
    pub fn is_listening(&self, callback: &Callback<A>) -> bool {
        self.inner.callbacks.read().contains(callback)
    }

    pub fn is_listening_event(&self, other: &Event<A>) -> bool {
        self.is_listening(&other.as_callback())
    }

    /// Append a dynamic binding
    pub fn add_binding(&self, binding: DynamicBinding) {
        self.inner.bindings.write().push(binding);
    }

    pub fn remove_binding(&self, uid: Uuid) -> bool {
        let mut bindings = self.inner.bindings.write();
        let before = bindings.len();
        bindings.retain(|b| b.uid() != uid);
        bindings.len() != before
    }

    /// Edit a binding in place; the change applies from the next invocation
    pub fn edit_binding(&self, uid: Uuid, edit: impl FnOnce(&mut DynamicBinding)) -> bool {
        let mut bindings = self.inner.bindings.write();
        match bindings.iter_mut().find(|b| b.uid() == uid) {
            Some(binding) => {
                edit(binding);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the dynamic bindings
    pub fn bindings(&self) -> Vec<DynamicBinding> {
        self.inner.bindings.read().clone()
    }

    /// Effective listeners: bindings (as callbacks) followed by direct callbacks.
    ///
    /// Recomputed on every call.
    pub fn listeners(&self) -> Vec<Callback<A>> {
        let mut listeners = bindings_to_callbacks(&self.inner.bindings.read());
        listeners.extend(self.inner.callbacks.read().iter().cloned());
        listeners
    }

    pub fn listener_count(&self) -> usize {
        self.inner.bindings.read().len() + self.inner.callbacks.read().len()
    }

    /// Broadcast `arg` to every listener.
    ///
    /// Bindings whose target is gone (or whose method no longer resolves) are
    /// dropped from the event, as are direct callbacks that report
    /// [`ListenerError::StaleTarget`]; neither counts as a failure. Other
    /// failures, panics included, are collected and returned once every
    /// listener has run, unless the policy disables `continue_on_error`, in
    /// which case the first failure ends the broadcast.
    pub fn invoke(&self, arg: &A) -> Result<(), DispatchError> {
        let policy = self.policy();

        let Some(_guard) = DispatchGuard::enter(self.inner.uid) else {
            let id = self.id();
            return match policy.on_cycle {
                CyclePolicy::Skip => {
                    warn!(event = %id, "Event is already dispatching, skipping nested invoke");
                    Ok(())
                }
                CyclePolicy::Fail => Err(DispatchError::CycleDetected(id)),
            };
        };

        trace!(event = %self.id(), listeners = self.listener_count(), "Invoking event");

        let mut failures = Vec::new();
        self.run_bindings(arg, policy, &mut failures)?;
        self.run_callbacks(arg, policy, &mut failures)?;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::ListenersFailed {
                event: self.id(),
                failures,
            })
        }
    }

    fn run_bindings(
        &self,
        arg: &A,
        policy: DispatchPolicy,
        failures: &mut Vec<ListenerError>,
    ) -> Result<(), DispatchError> {
        let snapshot = self.inner.bindings.read().clone();
        let mut stale = Vec::new();
        let mut aborted = None;

        for binding in snapshot.iter().rev() {
            match isolate(|| binding.invoke(arg)) {
                Ok(()) => {}
                Err(err) if err.is_stale() => {
                    warn!(
                        event = %self.id(),
                        method = binding.method_name(),
                        error = %err,
                        "Dropping stale binding"
                    );
                    stale.push(binding.uid());
                }
                Err(err) => {
                    if let Some(abort) = self.record(err, policy, failures) {
                        aborted = Some(abort);
                        break;
                    }
                }
            }
        }

        if !stale.is_empty() {
            self.inner
                .bindings
                .write()
                .retain(|b| !stale.contains(&b.uid()));
        }

        aborted.map_or(Ok(()), Err)
    }

    fn run_callbacks(
        &self,
        arg: &A,
        policy: DispatchPolicy,
        failures: &mut Vec<ListenerError>,
    ) -> Result<(), DispatchError> {
        let snapshot = self.inner.callbacks.read().clone();
        let mut stale = Vec::new();
        let mut aborted = None;

        for callback in snapshot.iter().rev() {
            match isolate(|| callback.call(arg)) {
                Ok(()) => {}
                Err(ListenerError::StaleTarget(reason)) => {
                    warn!(event = %self.id(), %reason, "Dropping stale listener");
                    stale.push(callback);
                }
                Err(err) => {
                    if let Some(abort) = self.record(err, policy, failures) {
                        aborted = Some(abort);
                        break;
                    }
                }
            }
        }

        if !stale.is_empty() {
            let mut callbacks = self.inner.callbacks.write();
            for dead in stale {
                if let Some(idx) = callbacks.iter().position(|c| c == dead) {
                    callbacks.remove(idx);
                }
            }
        }

        aborted.map_or(Ok(()), Err)
    }

    fn record(
        &self,
        err: ListenerError,
        policy: DispatchPolicy,
        failures: &mut Vec<ListenerError>,
    ) -> Option<DispatchError> {
        warn!(event = %self.id(), error = %err, "Listener failed");
        failures.push(err);
        if policy.continue_on_error {
            None
        } else {
            Some(DispatchError::ListenersFailed {
                event: self.id(),
                failures: std::mem::take(failures),
            })
        }
    }
}

impl Event<()> {
    /// Invoke a parameterless event
    pub fn fire(&self) -> Result<(), DispatchError> {
        self.invoke(&())
    }
}

impl<A: Send + Sync + 'static> Default for Event<A> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<A: 'static> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: 'static> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id())
            .field("uid", &self.inner.uid)
            .field("bindings", &self.inner.bindings.read().len())
            .field("callbacks", &self.inner.callbacks.read().len())
            .finish()
    }
}

/// Run a listener, turning a panic into a listener error
fn isolate(f: impl FnOnce() -> ListenerResult) -> ListenerResult {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(ListenerError::Panicked(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

thread_local! {
    static DISPATCHING: RefCell<Vec<Uuid>> = const { RefCell::new(Vec::new()) };
}

/// Marks an event as dispatching on the current thread
struct DispatchGuard {
    uid: Uuid,
}

impl DispatchGuard {
    fn enter(uid: Uuid) -> Option<Self> {
        DISPATCHING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&uid) {
                None
            } else {
                stack.push(uid);
                Some(Self { uid })
            }
        })
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(idx) = stack.iter().rposition(|uid| *uid == self.uid) {
                stack.remove(idx);
            }
        });
    }
}
