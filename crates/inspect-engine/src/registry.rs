//! Plugin registry and shared plugin handles

use crate::error::{Error, Result};
use crate::plugin::{Capabilities, Capability, FieldInfo, Plugin, PluginDescriptor};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

struct PluginSlot {
    descriptor: &'static PluginDescriptor,
    instance: Mutex<Box<dyn Plugin>>,
}

/// Shared handle to an initialized plugin
#[derive(Clone)]
pub struct PluginHandle(Arc<PluginSlot>);

impl PluginHandle {
    /// Plugin name
    pub fn name(&self) -> &'static str {
        self.0.descriptor.name
    }

    /// Plugin version
    pub fn version(&self) -> &'static str {
        self.0.descriptor.version
    }

    /// Declared capabilities
    pub fn capabilities(&self) -> Capabilities {
        self.0.descriptor.capabilities
    }

    /// Whether the plugin declares `capability`
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// The event source the plugin generates, if any
    pub fn event_source(&self) -> Option<&'static str> {
        self.0.descriptor.event_source
    }

    /// Field table
    pub fn fields(&self) -> &'static [FieldInfo] {
        self.0.descriptor.fields
    }

    /// Sources this plugin works on
    ///
    /// The declared extraction sources when there are any, otherwise the
    /// plugin's own event source. An empty list means every source.
    pub fn compatible_sources(&self) -> Vec<&'static str> {
        let declared = self.0.descriptor.extract_event_sources;
        if !declared.is_empty() {
            return declared.to_vec();
        }
        self.event_source().into_iter().collect()
    }

    /// Whether the plugin works on events of `source`
    pub fn is_source_compatible(&self, source: &str) -> bool {
        let sources = self.compatible_sources();
        sources.is_empty() || sources.contains(&source)
    }

    /// Run `f` with exclusive access to the plugin instance
    pub fn with_plugin<R>(&self, f: impl FnOnce(&mut dyn Plugin) -> R) -> R {
        let mut instance = self
            .0
            .instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(instance.as_mut())
    }

    /// Whether both handles refer to the same plugin instance
    pub fn ptr_eq(&self, other: &PluginHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Initialized plugins, in registration order
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginHandle>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and initialize a plugin with `config`
    pub fn register(
        &mut self,
        descriptor: &'static PluginDescriptor,
        config: &str,
    ) -> Result<PluginHandle> {
        if descriptor.capabilities.is_empty() {
            return Err(Error::NoCapabilities(descriptor.name.to_string()));
        }
        if self.find(descriptor.name).is_some() {
            return Err(Error::DuplicatePlugin(descriptor.name.to_string()));
        }

        debug!("Initializing plugin {} {}", descriptor.name, descriptor.version);
        let instance = (descriptor.init)(config).map_err(|e| Error::Plugin {
            plugin: descriptor.name.to_string(),
            message: e.to_string(),
        })?;

        let handle = PluginHandle(Arc::new(PluginSlot {
            descriptor,
            instance: Mutex::new(instance),
        }));
        self.plugins.push(handle.clone());

        info!(
            "Registered plugin {} with capabilities {:?}",
            descriptor.name, descriptor.capabilities
        );
        Ok(handle)
    }

    /// Look a plugin up by name
    pub fn find(&self, name: &str) -> Option<&PluginHandle> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// All plugins in registration order
    pub fn plugins(&self) -> &[PluginHandle] {
        &self.plugins
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Forget every plugin
    pub fn clear(&mut self) {
        self.plugins.clear();
    }
}
