//! Components and their method capability tables
//!
//! A component is any `Send + Sync` value that publishes a table of callable
//! methods through [`Reflect`]. The table is built once, when a
//! [`ComponentRef`] is created, and dynamic bindings look methods up in it by
//! name at call time. A `ComponentRef` only holds a weak reference to the
//! component, so bindings never keep a destroyed component alive.

use crate::error::{ListenerError, ListenerResult};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Identifier of a host object or component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Argument shape of a published method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Takes no argument
    Zero,
    /// Takes one argument of the given type
    One {
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl Arity {
    /// Arity a listener of an `Event<A>` must have.
    ///
    /// `()` is the payload of parameterless events, so it maps to [`Arity::Zero`].
    pub fn of<A: Any>() -> Self {
        if TypeId::of::<A>() == TypeId::of::<()>() {
            Arity::Zero
        } else {
            Arity::One {
                type_id: TypeId::of::<A>(),
                type_name: type_name::<A>(),
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Arity::Zero => "no arguments".to_string(),
            Arity::One { type_name, .. } => format!("one `{}` argument", type_name),
        }
    }
}

type ErasedMethod =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Option<&dyn Any>) -> ListenerResult + Send + Sync>;

/// One published method
#[derive(Clone)]
pub struct MethodEntry {
    name: String,
    arity: Arity,
    param_name: Option<&'static str>,
    call: ErasedMethod,
}

impl MethodEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Declared name of the single parameter, if any
    pub fn param_name(&self) -> Option<&'static str> {
        self.param_name
    }

    pub(crate) fn call(
        &self,
        target: &(dyn Any + Send + Sync),
        arg: Option<&dyn Any>,
    ) -> ListenerResult {
        (self.call)(target, arg)
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Method lookup table of one component type
#[derive(Debug, Clone)]
pub struct MethodTable {
    type_name: &'static str,
    methods: Vec<MethodEntry>,
}

impl MethodTable {
    /// Build the table for `T` by running its registration hook
    pub fn of<T: Reflect>() -> Self {
        let mut builder = MethodTableBuilder::<T> {
            table: MethodTable {
                type_name: type_name::<T>(),
                methods: Vec::new(),
            },
            _marker: PhantomData,
        };
        T::register_methods(&mut builder);
        builder.table
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Find the single method called `name` taking `arity`
    pub fn resolve(&self, name: &str, arity: Arity) -> Result<&MethodEntry, ListenerError> {
        let mut named = self.methods.iter().filter(|m| m.name == name).peekable();
        if named.peek().is_none() {
            return Err(ListenerError::MissingMethod {
                type_name: self.type_name.to_string(),
                method: name.to_string(),
            });
        }

        let mut matching = named.filter(|m| m.arity == arity);
        match (matching.next(), matching.next()) {
            (Some(entry), None) => Ok(entry),
            (Some(_), Some(_)) => Err(ListenerError::AmbiguousMethod {
                type_name: self.type_name.to_string(),
                method: name.to_string(),
            }),
            (None, _) => Err(ListenerError::SignatureMismatch {
                type_name: self.type_name.to_string(),
                method: name.to_string(),
                expected: arity.describe(),
            }),
        }
    }
}

/// Collects the methods a component type publishes
pub struct MethodTableBuilder<T> {
    table: MethodTable,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Reflect> MethodTableBuilder<T> {
    /// Publish a method without arguments
    pub fn method<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&T) -> ListenerResult + Send + Sync + 'static,
    {
        let call: ErasedMethod = Arc::new(
            move |target: &(dyn Any + Send + Sync), _arg: Option<&dyn Any>| -> ListenerResult {
                f(downcast_target::<T>(target)?)
            },
        );
        self.push(name, Arity::Zero, None, call)
    }

    /// Publish a method taking one argument of type `P`
    pub fn method_with<P, F>(&mut self, name: &str, param_name: &'static str, f: F) -> &mut Self
    where
        P: Any,
        F: Fn(&T, &P) -> ListenerResult + Send + Sync + 'static,
    {
        let method = name.to_string();
        let call: ErasedMethod = Arc::new(
            move |target: &(dyn Any + Send + Sync), arg: Option<&dyn Any>| -> ListenerResult {
                let target = downcast_target::<T>(target)?;
                let arg = arg
                    .and_then(|arg| arg.downcast_ref::<P>())
                    .ok_or_else(|| ListenerError::SignatureMismatch {
                        type_name: type_name::<T>().to_string(),
                        method: method.clone(),
                        expected: Arity::of::<P>().describe(),
                    })?;
                f(target, arg)
            },
        );
        self.push(name, Arity::of::<P>(), Some(param_name), call)
    }

    fn push(
        &mut self,
        name: &str,
        arity: Arity,
        param_name: Option<&'static str>,
        call: ErasedMethod,
    ) -> &mut Self {
        self.table.methods.push(MethodEntry {
            name: name.to_string(),
            arity,
            param_name,
            call,
        });
        self
    }
}

fn downcast_target<T: Any>(target: &(dyn Any + Send + Sync)) -> Result<&T, ListenerError> {
    target.downcast_ref::<T>().ok_or_else(|| {
        ListenerError::StaleTarget(format!("target is not a {}", type_name::<T>()))
    })
}

/// A component type that publishes methods for dynamic binding.
///
/// ```rust,ignore
/// struct Door { open: AtomicBool }
///
/// impl Reflect for Door {
///     fn register_methods(methods: &mut MethodTableBuilder<Self>) {
///         methods.method("open", |door| {
///             door.open.store(true, Ordering::SeqCst);
///             Ok(())
///         });
///     }
/// }
/// ```
pub trait Reflect: Any + Send + Sync {
    fn register_methods(methods: &mut MethodTableBuilder<Self>)
    where
        Self: Sized;
}

/// Weak, type-erased handle to a live component
#[derive(Clone)]
pub struct ComponentRef {
    id: ObjectId,
    owner: Option<ObjectId>,
    instance: Weak<dyn Any + Send + Sync>,
    methods: Arc<MethodTable>,
    retired: Arc<AtomicBool>,
}

impl ComponentRef {
    /// Register `component` under `id`, building its method table
    pub fn new<T: Reflect>(id: ObjectId, component: &Arc<T>) -> Self {
        let weak: Weak<T> = Arc::downgrade(component);
        let instance: Weak<dyn Any + Send + Sync> = weak;
        Self {
            id,
            owner: None,
            instance,
            methods: Arc::new(MethodTable::of::<T>()),
            retired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Record the host object this component is attached to
    pub fn with_owner(mut self, owner: ObjectId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    pub fn type_name(&self) -> &'static str {
        self.methods.type_name()
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn is_alive(&self) -> bool {
        !self.is_retired() && self.instance.strong_count() > 0
    }

    /// Mark the component destroyed.
    ///
    /// Shared by every clone of this handle: bindings made from any of them
    /// go stale even if someone still holds a strong reference.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Upgrade to a strong reference if the component still exists
    pub fn upgrade(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        if self.is_retired() {
            return None;
        }
        self.instance.upgrade()
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("type_name", &self.type_name())
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Source of live components, queried when binding descriptors are attached
pub trait ComponentLookup {
    fn lookup(&self, id: ObjectId) -> Option<ComponentRef>;
}
