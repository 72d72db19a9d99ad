// Component store

use crate::error::{HostError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use herald_events::extensions::component_names;
use herald_events::{
    BindingDescriptor, ComponentLookup, ComponentRef, DynamicBinding, ObjectId, Reflect,
};
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

struct StoredComponent {
    seq: u64,
    type_id: TypeId,
    instance: Arc<dyn Any + Send + Sync>,
    reference: ComponentRef,
}

/// Owns the live components that bindings point at.
///
/// Components are attached to a host object (`owner`). Bindings hold weak
/// references. Destroying a component retires its handle, so every binding
/// to it goes stale even while a handle from [`get`](Self::get) is alive.
#[derive(Clone)]
pub struct ComponentStore {
    components: Arc<DashMap<ObjectId, StoredComponent>>,
    singletons: Arc<DashMap<TypeId, ObjectId>>,
    next_seq: Arc<AtomicU64>,
}

impl ComponentStore {
    pub fn new() -> Self {
        debug!("Creating new component store");
        Self {
            components: Arc::new(DashMap::new()),
            singletons: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach `component` to `owner`
    pub fn insert<T: Reflect>(&self, owner: ObjectId, component: T) -> ObjectId {
        let id = ObjectId::new();
        let instance = Arc::new(component);
        let reference = ComponentRef::new(id, &instance).with_owner(owner);

        self.components.insert(
            id,
            StoredComponent {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                type_id: TypeId::of::<T>(),
                instance,
                reference,
            },
        );

        debug!(component = type_name::<T>(), %id, %owner, "Component attached");
        id
    }

    /// Attach a component that may exist at most once per store.
    ///
    /// A second instance of the same type is rejected and dropped.
    pub fn insert_unique<T: Reflect>(&self, owner: ObjectId, component: T) -> Result<ObjectId> {
        match self.singletons.entry(TypeId::of::<T>()) {
            Entry::Occupied(existing) => {
                warn!(
                    component = type_name::<T>(),
                    existing = %existing.get(),
                    "Single-instance component already exists, discarding the new one"
                );
                Err(HostError::DuplicateSingleton(type_name::<T>()))
            }
            Entry::Vacant(slot) => {
                let id = self.insert(owner, component);
                slot.insert(id);
                Ok(id)
            }
        }
    }

    /// Destroy one component. Bindings to it go stale.
    pub fn destroy(&self, id: ObjectId) -> bool {
        let Some((_, stored)) = self.components.remove(&id) else {
            trace!(%id, "Destroy requested for unknown component");
            return false;
        };

        stored.reference.retire();
        self.singletons
            .remove_if(&stored.type_id, |_, singleton| *singleton == id);
        debug!(component = stored.reference.type_name(), %id, "Component destroyed");
        true
    }

    /// Destroy every component attached to `owner`, returning how many went
    pub fn destroy_object(&self, owner: ObjectId) -> usize {
        let ids: Vec<ObjectId> = self
            .components
            .iter()
            .filter(|entry| entry.reference.owner() == Some(owner))
            .map(|entry| *entry.key())
            .collect();

        ids.into_iter().filter(|id| self.destroy(*id)).count()
    }

    /// Strong handle to a component of type `T`.
    ///
    /// Holding it keeps the value readable after [`destroy`](Self::destroy),
    /// but no binding dispatches to it any more.
    pub fn get<T: Any + Send + Sync>(&self, id: ObjectId) -> Option<Arc<T>> {
        let instance = self
            .components
            .get(&id)
            .map(|entry| Arc::clone(&entry.instance));
        instance.and_then(|instance| instance.downcast::<T>().ok())
    }

    /// The single instance of `T`, if one was inserted with
    /// [`insert_unique`](Self::insert_unique)
    pub fn singleton<T: Reflect>(&self) -> Option<Arc<T>> {
        let id = self.singletons.get(&TypeId::of::<T>()).map(|entry| *entry.value());
        id.and_then(|id| self.get::<T>(id))
    }

    /// Weak handle suitable for binding
    pub fn component_ref(&self, id: ObjectId) -> Option<ComponentRef> {
        self.components.get(&id).map(|entry| entry.reference.clone())
    }

    /// Components attached to `owner`, in insertion order
    pub fn components_of(&self, owner: ObjectId) -> Vec<ComponentRef> {
        let mut found: Vec<(u64, ComponentRef)> = self
            .components
            .iter()
            .filter(|entry| entry.reference.owner() == Some(owner))
            .map(|entry| (entry.seq, entry.reference.clone()))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, reference)| reference).collect()
    }

    /// Picker labels for the components of `owner`
    pub fn component_names(&self, owner: ObjectId) -> Vec<String> {
        component_names(&self.components_of(owner))
    }

    /// Attach a serialized binding to the component it names
    pub fn bind(&self, descriptor: BindingDescriptor) -> DynamicBinding {
        DynamicBinding::attach(descriptor, self)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentLookup for ComponentStore {
    fn lookup(&self, id: ObjectId) -> Option<ComponentRef> {
        self.component_ref(id)
    }
}
