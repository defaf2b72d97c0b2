//! Host integration lifecycle
//!
//! Install/teardown state and scene event callbacks live on an explicit
//! [`HostIntegration`] owned by the host adapter, never in process-wide state.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::codec::ContainerCodec;
use crate::config::ContainerConfig;

/// Scene file events a host adapter forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    Open,
    New,
    Save,
}

type Callback = Box<dyn FnMut(HostEvent)>;

/// Lifecycle of one host integration
#[derive(Default)]
pub struct HostIntegration {
    installed: bool,
    hosts: Vec<String>,
    codec: Option<ContainerCodec>,
    callbacks: HashMap<HostEvent, Vec<Callback>>,
}

impl fmt::Debug for HostIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostIntegration")
            .field("installed", &self.installed)
            .field("hosts", &self.hosts)
            .field("callbacks", &self.callbacks.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl HostIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the configured hosts and build the codec.
    ///
    /// Installing twice tears the previous installation down first.
    pub fn install(&mut self, config: &ContainerConfig) {
        if self.installed {
            self.teardown();
        }

        self.hosts = config.host.names.clone();
        self.codec = Some(ContainerCodec::from_config(config));
        self.installed = true;
        info!(hosts = ?self.hosts, "host integration installed");
    }

    /// Deregister hosts and drop all callbacks. No-op when not installed.
    pub fn teardown(&mut self) {
        if !self.installed {
            return;
        }

        self.installed = false;
        self.hosts.clear();
        self.codec = None;
        self.callbacks.clear();
        info!("host integration torn down");
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Host names registered by the current installation
    pub fn registered_hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Codec built on install
    pub fn codec(&self) -> Option<&ContainerCodec> {
        self.codec.as_ref()
    }

    /// Register a callback for `event`
    pub fn on(&mut self, event: HostEvent, callback: impl FnMut(HostEvent) + 'static) {
        self.callbacks.entry(event).or_default().push(Box::new(callback));
    }

    /// Invoke every callback registered for `event`; returns how many ran.
    pub fn emit(&mut self, event: HostEvent) -> usize {
        let Some(callbacks) = self.callbacks.get_mut(&event) else {
            return 0;
        };
        debug!(?event, count = callbacks.len(), "emitting host event");
        for callback in callbacks.iter_mut() {
            callback(event);
        }
        callbacks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_install_and_teardown() {
        let mut integration = HostIntegration::new();
        assert!(!integration.is_installed());
        assert!(integration.codec().is_none());

        integration.install(&ContainerConfig::default());
        assert!(integration.is_installed());
        assert_eq!(integration.registered_hosts(), ["houdini", "hython", "hpython"]);
        assert!(integration.codec().is_some());

        integration.teardown();
        assert!(!integration.is_installed());
        assert!(integration.registered_hosts().is_empty());
        integration.teardown();
    }

    #[test]
    fn test_reinstall_clears_callbacks() {
        let mut integration = HostIntegration::new();
        integration.install(&ContainerConfig::default());
        integration.on(HostEvent::Save, |_| {});

        integration.install(&ContainerConfig::default());
        assert_eq!(integration.emit(HostEvent::Save), 0);
        assert!(integration.is_installed());
    }

    #[test]
    fn test_emit_runs_matching_callbacks() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut integration = HostIntegration::new();
        integration.install(&ContainerConfig::default());

        for event in [HostEvent::Open, HostEvent::New] {
            let seen = Rc::clone(&seen);
            integration.on(event, move |event| seen.borrow_mut().push(event));
        }

        assert_eq!(integration.emit(HostEvent::Open), 1);
        assert_eq!(integration.emit(HostEvent::Save), 0);
        assert_eq!(*seen.borrow(), vec![HostEvent::Open]);
    }
}
