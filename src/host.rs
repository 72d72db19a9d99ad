// Composition root

use crate::error::{HostError, Result};
use crate::store::ComponentStore;
use herald_events::{CyclePolicy, EventRegistry, RegistryBuilder, RegistryConfig};
use herald_log::{LogConfig, LogError};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

static GLOBAL: OnceCell<Host> = OnceCell::new();

/// Owns the event registry and the component store of an application.
///
/// Construct one at startup and hand out references (or clones, which share
/// state). Code that cannot be given a reference can reach a process-wide
/// instance through [`Host::global`].
#[derive(Clone)]
pub struct Host {
    registry: EventRegistry,
    components: ComponentStore,
}

impl Host {
    /// Host with default configuration
    pub fn new() -> Self {
        HostBuilder::new().build()
    }

    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Make this host the process-wide instance.
    ///
    /// Fails if one is already installed, including one created lazily by
    /// [`Host::global`].
    pub fn install_global(self) -> Result<&'static Host> {
        GLOBAL.set(self).map_err(|_| HostError::AlreadyInstalled)?;
        info!("Global host installed");
        GLOBAL.get().ok_or(HostError::AlreadyInstalled)
    }

    /// The process-wide host, created from the environment on first access
    /// when none was installed.
    pub fn global() -> &'static Host {
        GLOBAL.get_or_init(|| {
            debug!("Creating global host from environment");
            HostBuilder::from_env().build()
        })
    }

    /// The process-wide host, if one exists
    pub fn try_global() -> Option<&'static Host> {
        GLOBAL.get()
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

/// Host builder
pub struct HostBuilder {
    registry: RegistryBuilder,
    logging: Option<LogConfig>,
}

impl HostBuilder {
    pub fn new() -> Self {
        Self {
            registry: RegistryBuilder::new(),
            logging: None,
        }
    }

    /// Registry settings from `HERALD_*` environment variables
    pub fn from_env() -> Self {
        Self {
            registry: RegistryBuilder::from_config(RegistryConfig::from_env()),
            logging: None,
        }
    }

    /// Replace the registry configuration
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry = RegistryBuilder::from_config(config);
        self
    }

    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.registry = self.registry.continue_on_error(enabled);
        self
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.registry = self.registry.enable_logging(enabled);
        self
    }

    pub fn on_cycle(mut self, policy: CyclePolicy) -> Self {
        self.registry = self.registry.on_cycle(policy);
        self
    }

    /// Install a log subscriber when the host is built
    pub fn with_logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Build the host
    pub fn build(self) -> Host {
        if let Some(logging) = self.logging {
            match logging.try_init() {
                Ok(()) | Err(LogError::AlreadyInitialized) => {}
                Err(e) => warn!(error = %e, "Logging setup failed"),
            }
        }

        let host = Host {
            registry: self.registry.build(),
            components: ComponentStore::new(),
        };
        debug!(config = ?host.registry.config(), "Host built");
        host
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}
