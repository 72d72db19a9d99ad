//! Declarative listener bindings
//!
//! A [`BindingDescriptor`] is the serialized form an editor or config file
//! produces: which object, which component on it, and which method to call.
//! A [`DynamicBinding`] is that descriptor attached to a live component. It
//! resolves the method on every call, so edits to the descriptor apply to
//! the next invocation.

use crate::component::{Arity, ComponentLookup, ComponentRef, ObjectId};
use crate::error::{ListenerError, ListenerResult};
use crate::extensions::strip_argument_list;
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// Serialized shape of a binding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDescriptor {
    /// Host object selected by the user
    #[serde(default)]
    pub target_object: Option<ObjectId>,

    /// Component whose method will be called
    #[serde(default)]
    pub target_component: Option<ObjectId>,

    /// Bare method name
    #[serde(default)]
    pub method_name: String,

    /// Picker cursor, not used for dispatch
    #[serde(default)]
    pub selected_component_index: i32,

    /// Picker cursor, not used for dispatch
    #[serde(default)]
    pub selected_method_index: i32,
}

impl BindingDescriptor {
    pub fn new(target_component: ObjectId, method_name: impl Into<String>) -> Self {
        Self {
            target_component: Some(target_component),
            method_name: method_name.into(),
            ..Default::default()
        }
    }

    pub fn with_target_object(mut self, object: ObjectId) -> Self {
        self.target_object = Some(object);
        self
    }
}

/// A descriptor attached to a (possibly dead) component
#[derive(Debug, Clone)]
pub struct DynamicBinding {
    uid: Uuid,
    descriptor: BindingDescriptor,
    component: Option<ComponentRef>,
}

impl DynamicBinding {
    /// Attach `descriptor` to whatever `lookup` knows as its target component
    pub fn attach(descriptor: BindingDescriptor, lookup: &impl ComponentLookup) -> Self {
        let component = descriptor.target_component.and_then(|id| lookup.lookup(id));
        Self {
            uid: Uuid::new_v4(),
            descriptor,
            component,
        }
    }

    /// Bind directly to a known component
    pub fn to_component(component: ComponentRef, method_name: impl Into<String>) -> Self {
        let descriptor = BindingDescriptor {
            target_object: component.owner(),
            target_component: Some(component.id()),
            method_name: method_name.into(),
            ..Default::default()
        };
        Self {
            uid: Uuid::new_v4(),
            descriptor,
            component: Some(component),
        }
    }

    /// Identity of this binding within an event
    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn descriptor(&self) -> &BindingDescriptor {
        &self.descriptor
    }

    pub fn method_name(&self) -> &str {
        &self.descriptor.method_name
    }

    pub fn set_method_name(&mut self, method_name: impl Into<String>) {
        self.descriptor.method_name = method_name.into();
    }

    /// Replace the descriptor and re-attach to the component it names.
    ///
    /// The uid is kept, so the binding stays in place within its event.
    pub fn retarget(&mut self, descriptor: BindingDescriptor, lookup: &impl ComponentLookup) {
        self.component = descriptor.target_component.and_then(|id| lookup.lookup(id));
        self.descriptor = descriptor;
    }

    pub fn component(&self) -> Option<&ComponentRef> {
        self.component.as_ref()
    }

    /// Whether the target component still exists
    pub fn is_alive(&self) -> bool {
        self.component.as_ref().is_some_and(ComponentRef::is_alive)
    }

    /// Resolve and call the bound method with `arg`.
    ///
    /// For `A = ()` the method must take no arguments; otherwise it must take
    /// exactly one `A`.
    pub fn invoke<A: Any>(&self, arg: &A) -> ListenerResult {
        let component = self.component.as_ref().ok_or_else(|| {
            ListenerError::StaleTarget(format!(
                "binding `{}` has no target component",
                self.descriptor.method_name
            ))
        })?;

        let instance = component.upgrade().ok_or_else(|| {
            ListenerError::StaleTarget(format!(
                "{} {} was destroyed",
                component.type_name(),
                component.id()
            ))
        })?;

        let method_name = strip_argument_list(&self.descriptor.method_name);
        let arity = Arity::of::<A>();
        let method = component.methods().resolve(method_name, arity)?;

        let arg: Option<&dyn Any> = match arity {
            Arity::Zero => None,
            Arity::One { .. } => Some(arg),
        };
        method.call(instance.as_ref(), arg)
    }
}
