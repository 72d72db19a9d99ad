//! Dispatch and registry configuration

use std::env;

/// What to do when an event is invoked while it is already dispatching on
/// the same thread (for example through a forwarding loop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Log a warning and skip the nested dispatch
    #[default]
    Skip,
    /// Fail the nested dispatch with `DispatchError::CycleDetected`
    Fail,
}

impl CyclePolicy {
    /// Parse a policy name
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Some(CyclePolicy::Skip),
            "fail" | "error" => Some(CyclePolicy::Fail),
            _ => None,
        }
    }
}

/// Per-event dispatch behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Keep broadcasting after a listener fails
    pub continue_on_error: bool,

    /// Re-entrant dispatch handling
    pub on_cycle: CyclePolicy,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            on_cycle: CyclePolicy::Skip,
        }
    }
}

/// Event registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Keep broadcasting after a listener fails
    pub continue_on_error: bool,

    /// Log registry traffic (registration, removal, dispatch)
    pub enable_logging: bool,

    /// Re-entrant dispatch handling for events the registry creates
    pub on_cycle: CyclePolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            enable_logging: true,
            on_cycle: CyclePolicy::Skip,
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables.
    ///
    /// - `HERALD_CONTINUE_ON_ERROR=1|0`
    /// - `HERALD_EVENT_LOGGING=1|0`
    /// - `HERALD_ON_CYCLE=skip|fail`
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Create config from an arbitrary variable source
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            var(name)
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(default)
        };

        Self {
            continue_on_error: flag("HERALD_CONTINUE_ON_ERROR", defaults.continue_on_error),
            enable_logging: flag("HERALD_EVENT_LOGGING", defaults.enable_logging),
            on_cycle: var("HERALD_ON_CYCLE")
                .and_then(|s| CyclePolicy::from_str(&s))
                .unwrap_or(defaults.on_cycle),
        }
    }

    /// Dispatch policy applied to events created by the registry
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            continue_on_error: self.continue_on_error,
            on_cycle: self.on_cycle,
        }
    }
}
