//! Helpers for turning bindings into callbacks and for naming things in pickers

use crate::binding::DynamicBinding;
use crate::callback::Callback;
use crate::component::{Arity, ComponentRef, MethodEntry, MethodTable};
use std::collections::HashMap;

/// Convert bindings into callbacks that resolve the binding on every call
pub fn bindings_to_callbacks<A: Send + Sync + 'static>(
    bindings: &[DynamicBinding],
) -> Vec<Callback<A>> {
    bindings
        .iter()
        .cloned()
        .map(|binding| Callback::new(move |arg: &A| binding.invoke(arg)))
        .collect()
}

/// Last path segment of a type name, keeping generic arguments intact.
///
/// `my_game::actors::Player` becomes `Player`,
/// `alloc::vec::Vec<u8>` becomes `Vec<u8>`. Tuples, arrays, slices,
/// references, pointers and trait objects are returned unchanged.
pub fn short_type_name(full: &str) -> &str {
    if full.starts_with(['(', '[', '&', '*']) || full.starts_with("dyn ") {
        return full;
    }
    let path_end = full.find('<').unwrap_or(full.len());
    match full[..path_end].rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Display name of `T`
pub fn type_display_name<T: ?Sized>() -> &'static str {
    short_type_name(std::any::type_name::<T>())
}

/// Display names for a list of components.
///
/// Repeated types are numbered in order of appearance: `Light`, `Light(1)`,
/// `Light(2)`.
pub fn component_names(components: &[ComponentRef]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    components
        .iter()
        .map(|component| {
            let name = short_type_name(component.type_name());
            match seen.get_mut(name) {
                Some(count) => {
                    *count += 1;
                    format!("{}({})", name, count)
                }
                None => {
                    seen.insert(name, 0);
                    name.to_string()
                }
            }
        })
        .collect()
}

/// Signature shown for a method, e.g. `dim(u32 level)`
pub fn describe_method(method: &MethodEntry) -> String {
    match method.arity() {
        Arity::Zero => format!("{}()", method.name()),
        Arity::One { type_name, .. } => format!(
            "{}({} {})",
            method.name(),
            short_type_name(type_name),
            method.param_name().unwrap_or("arg")
        ),
    }
}

/// Signatures of every method in `table`, in publication order
pub fn describe_methods(table: &MethodTable) -> Vec<String> {
    table.methods().iter().map(describe_method).collect()
}

/// Strip a trailing argument list: `dim(u32 level)` becomes `dim`
pub fn strip_argument_list(name: &str) -> &str {
    let name = name.trim();
    match name.find('(') {
        Some(idx) if name.ends_with(')') => name[..idx].trim_end(),
        _ => name,
    }
}
