//! Event registry: string keyed lookup of events

use crate::args::EventArgs;
use crate::binding::DynamicBinding;
use crate::callback::Callback;
use crate::config::{CyclePolicy, RegistryConfig};
use crate::error::{EventError, Result};
use crate::event::Event;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Anything that names an event in the registry
pub trait EventKey {
    fn event_key(&self) -> String;
}

impl EventKey for str {
    fn event_key(&self) -> String {
        self.to_string()
    }
}

impl EventKey for String {
    fn event_key(&self) -> String {
        self.clone()
    }
}

impl<A: 'static> EventKey for Event<A> {
    fn event_key(&self) -> String {
        self.id()
    }
}

/// Namespace an event lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Parameterless events
    Signal,
    /// Events carrying a payload
    Parameterized,
}

/// Registry of named events.
///
/// Holds two independent namespaces: parameterless events (`Event<()>`) and
/// parameterized events (`Event<A>`). Using the same key in both is allowed
/// but the two events have nothing to do with each other.
///
/// Lookups of unknown keys never panic: they log an error and return
/// [`EventError::UnknownEvent`], or create the event where the operation
/// says so.
///
/// # Examples
///
/// ```rust,ignore
/// let registry: EventRegistry = EventRegistry::new();
///
/// registry.add_listener("jump", Callback::action(|| println!("jumped")));
/// registry.invoke("jump", false)?;
/// ```
pub struct EventRegistry<A: Send + Sync + 'static = EventArgs> {
    signals: Arc<DashMap<String, Event<()>>>,
    events: Arc<DashMap<String, Event<A>>>,
    config: Arc<RegistryConfig>,
}

impl<A: Send + Sync + 'static> EventRegistry<A> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create registry with custom config
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            signals: Arc::new(DashMap::new()),
            events: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Create an empty event of the given kind unless the key already exists
    pub fn add_event(&self, key: &str, kind: EventKind) {
        match kind {
            EventKind::Signal => {
                self.signal_or_create(key);
            }
            EventKind::Parameterized => {
                self.event_or_create(key);
            }
        }
    }

    /// Create the parameterless event if needed, then attach `callback`
    pub fn add_event_with(&self, key: &str, callback: Callback<()>) {
        self.signal_or_create(key).add_listener(callback);
    }

    /// Create the parameterized event if needed, then attach `callback`
    pub fn add_parameter_event_with(&self, key: &str, callback: Callback<A>) {
        self.event_or_create(key).add_listener(callback);
    }

    /// Register an existing parameterless event under its id.
    ///
    /// If an event with that id is already registered, `event` is chained
    /// onto it as a forwarding listener instead.
    pub fn register_event(&self, event: Event<()>) {
        let key = event.id();
        match self.signals.entry(key.clone()) {
            Entry::Occupied(existing) => {
                let existing = existing.get().clone();
                if !existing.same_event(&event) {
                    existing.add_event_listener(&event);
                    self.log_debug(&key, "Chained event onto existing event");
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(event);
                self.log_debug(&key, "Registered event");
            }
        }
    }

    /// Register an existing parameterized event under its id, chaining it
    /// onto an already registered one with the same id
    pub fn register_parameter_event(&self, event: Event<A>) {
        let key = event.id();
        match self.events.entry(key.clone()) {
            Entry::Occupied(existing) => {
                let existing = existing.get().clone();
                if !existing.same_event(&event) {
                    existing.add_event_listener(&event);
                    self.log_debug(&key, "Chained parameterized event onto existing event");
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(event);
                self.log_debug(&key, "Registered parameterized event");
            }
        }
    }

    /// Remove the event from whichever namespace holds it
    pub fn remove_event<K: EventKey + ?Sized>(&self, key: &K) -> Result<EventKind> {
        let key = key.event_key();
        if self.signals.remove(&key).is_some() {
            self.log_debug(&key, "Removed event");
            Ok(EventKind::Signal)
        } else if self.events.remove(&key).is_some() {
            self.log_debug(&key, "Removed parameterized event");
            Ok(EventKind::Parameterized)
        } else {
            Err(self.unknown(&key))
        }
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Attach `callback`, creating the event if it does not exist
    pub fn add_listener<K: EventKey + ?Sized>(&self, key: &K, callback: Callback<()>) {
        self.signal_or_create(&key.event_key()).add_listener(callback);
    }

    /// Attach `callback` to a parameterized event, creating it if needed
    pub fn add_parameter_listener<K: EventKey + ?Sized>(&self, key: &K, callback: Callback<A>) {
        self.event_or_create(&key.event_key()).add_listener(callback);
    }

    /// Attach a dynamic binding, creating the event if needed
    pub fn add_binding<K: EventKey + ?Sized>(&self, key: &K, binding: DynamicBinding) {
        self.signal_or_create(&key.event_key()).add_binding(binding);
    }

    /// Attach a dynamic binding to a parameterized event, creating it if needed
    pub fn add_parameter_binding<K: EventKey + ?Sized>(&self, key: &K, binding: DynamicBinding) {
        self.event_or_create(&key.event_key()).add_binding(binding);
    }

    /// Detach `callback`. Returns whether it was attached.
    pub fn remove_listener<K: EventKey + ?Sized>(
        &self,
        key: &K,
        callback: &Callback<()>,
    ) -> Result<bool> {
        let key = key.event_key();
        match self.find_signal(&key) {
            Some(event) => Ok(event.remove_listener(callback)),
            None => Err(self.unknown(&key)),
        }
    }

    /// Detach `callback` from a parameterized event
    pub fn remove_parameter_listener<K: EventKey + ?Sized>(
        &self,
        key: &K,
        callback: &Callback<A>,
    ) -> Result<bool> {
        let key = key.event_key();
        match self.find_event(&key) {
            Some(event) => Ok(event.remove_listener(callback)),
            None => Err(self.unknown(&key)),
        }
    }

    /// Effective listeners of a parameterless event
    pub fn listeners<K: EventKey + ?Sized>(&self, key: &K) -> Result<Vec<Callback<()>>> {
        let key = key.event_key();
        self.find_signal(&key)
            .map(|event| event.listeners())
            .ok_or_else(|| self.unknown(&key))
    }

    /// Effective listeners of a parameterized event
    pub fn parameter_listeners<K: EventKey + ?Sized>(&self, key: &K) -> Result<Vec<Callback<A>>> {
        let key = key.event_key();
        self.find_event(&key)
            .map(|event| event.listeners())
            .ok_or_else(|| self.unknown(&key))
    }

    pub fn is_listening<K: EventKey + ?Sized>(&self, key: &K, callback: &Callback<()>) -> bool {
        self.find_signal(&key.event_key())
            .is_some_and(|event| event.is_listening(callback))
    }

    pub fn is_listening_parameter<K: EventKey + ?Sized>(
        &self,
        key: &K,
        callback: &Callback<A>,
    ) -> bool {
        self.find_event(&key.event_key())
            .is_some_and(|event| event.is_listening(callback))
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Invoke a parameterless event.
    ///
    /// An unknown key is an error unless `create_if_missing` is set, in which
    /// case an empty event is created and invoked (a no-op).
    pub fn invoke<K: EventKey + ?Sized>(&self, key: &K, create_if_missing: bool) -> Result<()> {
        let key = key.event_key();
        let event = match self.find_signal(&key) {
            Some(event) => event,
            None if create_if_missing => self.signal_or_create(&key),
            None => return Err(self.unknown(&key)),
        };

        if self.config.enable_logging {
            debug!(event = %key, listeners = event.listener_count(), "Invoking event");
        }
        event.fire().map_err(EventError::from)
    }

    /// Invoke a parameterized event with `arg`
    pub fn invoke_with<K: EventKey + ?Sized>(
        &self,
        key: &K,
        arg: &A,
        create_if_missing: bool,
    ) -> Result<()> {
        let key = key.event_key();
        let event = match self.find_event(&key) {
            Some(event) => event,
            None if create_if_missing => self.event_or_create(&key),
            None => return Err(self.unknown(&key)),
        };

        if self.config.enable_logging {
            debug!(event = %key, listeners = event.listener_count(), "Invoking parameterized event");
        }
        event.invoke(arg).map_err(EventError::from)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Handle to a registered parameterless event
    pub fn get_event<K: EventKey + ?Sized>(&self, key: &K) -> Option<Event<()>> {
        let key = key.event_key();
        let event = self.find_signal(&key);
        if event.is_none() {
            self.unknown(&key);
        }
        event
    }

    /// Handle to a registered parameterized event
    pub fn get_parameter_event<K: EventKey + ?Sized>(&self, key: &K) -> Option<Event<A>> {
        let key = key.event_key();
        let event = self.find_event(&key);
        if event.is_none() {
            self.unknown(&key);
        }
        event
    }

    /// Whether either namespace holds `key`
    pub fn contains<K: EventKey + ?Sized>(&self, key: &K) -> bool {
        let key = key.event_key();
        self.signals.contains_key(&key) || self.events.contains_key(&key)
    }

    /// Listener count across both namespaces
    pub fn listener_count<K: EventKey + ?Sized>(&self, key: &K) -> usize {
        let key = key.event_key();
        self.find_signal(&key).map_or(0, |e| e.listener_count())
            + self.find_event(&key).map_or(0, |e| e.listener_count())
    }

    /// Number of registered events
    pub fn len(&self) -> usize {
        self.signals.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.events.is_empty()
    }

    /// Sorted keys of every registered event
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .signals
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.events.iter().map(|entry| entry.key().clone()))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Drop every event
    pub fn clear(&self) {
        self.signals.clear();
        self.events.clear();
        if self.config.enable_logging {
            info!("Cleared all events");
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn find_signal(&self, key: &str) -> Option<Event<()>> {
        self.signals.get(key).map(|entry| entry.value().clone())
    }

    fn find_event(&self, key: &str) -> Option<Event<A>> {
        self.events.get(key).map(|entry| entry.value().clone())
    }

    fn signal_or_create(&self, key: &str) -> Event<()> {
        match self.signals.entry(key.to_string()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let event = Event::new(key).with_policy(self.config.dispatch_policy());
                slot.insert(event.clone());
                self.log_debug(key, "Created event");
                event
            }
        }
    }

    fn event_or_create(&self, key: &str) -> Event<A> {
        match self.events.entry(key.to_string()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let event = Event::new(key).with_policy(self.config.dispatch_policy());
                slot.insert(event.clone());
                self.log_debug(key, "Created parameterized event");
                event
            }
        }
    }

    fn unknown(&self, key: &str) -> EventError {
        error!(event = %key, "Could not find event");
        EventError::UnknownEvent(key.to_string())
    }

    fn log_debug(&self, key: &str, message: &str) {
        if self.config.enable_logging {
            debug!(event = %key, "{}", message);
        }
    }
}

impl<A: Send + Sync + 'static> Default for EventRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + Sync + 'static> Clone for EventRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            signals: Arc::clone(&self.signals),
            events: Arc::clone(&self.events),
            config: Arc::clone(&self.config),
        }
    }
}

/// Event registry builder
pub struct RegistryBuilder {
    config: RegistryConfig,
}

impl RegistryBuilder {
    /// Create new registry builder
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Enable/disable continue on error
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.config.continue_on_error = enabled;
        self
    }

    /// Enable/disable logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Set the re-entrant dispatch policy
    pub fn on_cycle(mut self, policy: CyclePolicy) -> Self {
        self.config.on_cycle = policy;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Build the registry
    pub fn build<A: Send + Sync + 'static>(self) -> EventRegistry<A> {
        EventRegistry::with_config(self.config)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
