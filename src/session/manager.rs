//! Connection lifecycle manager
//!
//! Binds connections to the device registry and the subscription router.
//! Every client event goes through [`ConnectionLifecycleManager::handle`],
//! which dispatches over the closed [`ClientEvent`] set. Handlers never fail:
//! unknown devices, empty identifiers and events for connections that are
//! already gone are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use crate::protocol::{ClientEvent, DeviceRef, Frame, ServerEvent, Subscribe};
use crate::registry::{DeviceRegistry, DisconnectPolicy, RegistryConfig};
use crate::router::{Connection, ConnectionId, SubscriptionRouter};
use crate::telemetry::{DeviceId, Sample, Snapshot};

use super::state::SessionState;

/// Relay-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Known devices
    pub devices: usize,
    /// Live connections
    pub connections: usize,
    /// Devices with a bound producer connection
    pub producers: usize,
    /// Connections viewing a device
    pub viewers: usize,
}

/// Owns the registry, the router and per-connection state
pub struct ConnectionLifecycleManager {
    registry: DeviceRegistry,
    router: SubscriptionRouter,
    sessions: HashMap<ConnectionId, SessionState>,
}

impl ConnectionLifecycleManager {
    /// Create a manager with fresh, empty state
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            registry: DeviceRegistry::with_config(config),
            router: SubscriptionRouter::new(),
            sessions: HashMap::new(),
        }
    }

    /// Get the device registry
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Get the subscription router
    pub fn router(&self) -> &SubscriptionRouter {
        &self.router
    }

    /// Get a connection's state
    pub fn session(&self, id: ConnectionId) -> Option<&SessionState> {
        self.sessions.get(&id)
    }

    /// Accept a new connection and send it the current device list
    pub fn connect(&mut self, connection: Arc<dyn Connection>) {
        let id = connection.id();
        if self.sessions.contains_key(&id) {
            tracing::warn!(connection_id = %id, "Duplicate connect ignored");
            return;
        }

        self.router.attach(connection);
        self.sessions.insert(id, SessionState::new(id));

        tracing::info!(
            connection_id = %id,
            connections = self.router.connection_count(),
            "Client connected"
        );

        self.send_device_list(id);
    }

    /// Apply one client event
    pub fn handle(&mut self, id: ConnectionId, event: ClientEvent) {
        let Some(session) = self.sessions.get_mut(&id) else {
            tracing::debug!(connection_id = %id, event = event.name(), "Event for unknown connection");
            return;
        };
        session.record_event();

        match event {
            ClientEvent::RegisterDevice(DeviceRef { device_id }) => {
                self.on_register(id, device_id)
            }
            ClientEvent::ListDevices => self.send_device_list(id),
            ClientEvent::ClearAllDevices => self.on_clear_all(id),
            ClientEvent::SubscribeDevice(subscribe) => self.on_subscribe(id, subscribe),
            ClientEvent::NewSample(sample) => self.on_sample(sample),
            ClientEvent::ClearSamples(DeviceRef { device_id }) => self.on_clear_samples(&device_id),
        }
    }

    /// Release a connection
    ///
    /// Safe to call more than once; returns false if the connection was
    /// already gone.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let Some(mut session) = self.sessions.remove(&id) else {
            return false;
        };

        self.router.detach(id);
        let produced = session.close();

        tracing::info!(
            connection_id = %id,
            device = ?produced.as_ref().map(DeviceId::as_str),
            events = session.events_handled,
            duration_ms = session.duration().as_millis() as u64,
            "Client disconnected"
        );

        if let Some(device_id) = produced {
            self.on_producer_gone(id, &device_id);
        }
        true
    }

    /// Current counters
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            devices: self.registry.len(),
            connections: self.router.connection_count(),
            producers: self.registry.producer_count(),
            viewers: self.sessions.values().filter(|s| s.is_viewing()).count(),
        }
    }

    fn on_register(&mut self, id: ConnectionId, device_id: DeviceId) {
        if !device_id.is_empty() {
            self.registry.register(device_id.clone(), id);

            let previous = self
                .sessions
                .get_mut(&id)
                .and_then(|session| session.bind_producer(device_id));

            // The connection moved on to another device; it no longer owns the old one
            if let Some(previous) = previous {
                self.registry.release_producer(previous.as_str(), id);
            }
        } else {
            tracing::debug!(connection_id = %id, "Registration with empty device id ignored");
        }

        self.broadcast_device_list();
    }

    fn on_clear_all(&mut self, id: ConnectionId) {
        self.registry.clear_all();
        for session in self.sessions.values_mut() {
            session.release_producer();
        }
        self.send_device_list(id);
    }

    fn on_subscribe(&mut self, id: ConnectionId, subscribe: Subscribe) {
        if let Some(previous) = subscribe.previous_device_id.filter(|d| !d.is_empty()) {
            self.router.leave(id, previous.as_str());
        }

        let viewing = if subscribe.device_id.is_empty() {
            // Leave whatever group is left over; there is nothing to join
            if let Some(current) = self.router.group_of(id).cloned() {
                self.router.leave(id, current.as_str());
            }
            None
        } else {
            self.router.join(id, subscribe.device_id.clone());
            Some(subscribe.device_id)
        };

        if let Some(session) = self.sessions.get_mut(&id) {
            session.view(viewing);
        }
    }

    fn on_sample(&mut self, sample: Sample) {
        let device_id = sample.device_id.clone();
        if let Some(snapshot) = self.registry.append_sample(device_id.as_str(), sample) {
            self.broadcast_snapshot(&device_id, snapshot);
        }
    }

    fn on_clear_samples(&mut self, device_id: &DeviceId) {
        if let Some(snapshot) = self.registry.clear_samples(device_id.as_str()) {
            self.broadcast_snapshot(device_id, snapshot);
        }
    }

    fn on_producer_gone(&mut self, id: ConnectionId, device_id: &DeviceId) {
        match self.registry.config().disconnect_policy {
            DisconnectPolicy::Teardown => {
                if self.registry.producer_of(device_id.as_str()) == Some(id) {
                    self.registry.unregister(device_id.as_str());
                    self.broadcast_device_list();
                }
            }
            DisconnectPolicy::Retain => {
                self.registry.release_producer(device_id.as_str(), id);
            }
        }
    }

    fn device_list_frame(&self) -> Option<Frame> {
        let ids = self.registry.list_ids().cloned().collect();
        encode(&ServerEvent::DeviceList(ids))
    }

    fn send_device_list(&self, id: ConnectionId) {
        if let Some(frame) = self.device_list_frame() {
            self.router.send_to(id, frame);
        }
    }

    fn broadcast_device_list(&self) {
        if let Some(frame) = self.device_list_frame() {
            let delivered = self.router.broadcast_global(&frame);
            tracing::debug!(devices = self.registry.len(), delivered = delivered, "Device list broadcast");
        }
    }

    fn broadcast_snapshot(&self, device_id: &DeviceId, snapshot: Snapshot) {
        if let Some(frame) = encode(&ServerEvent::SampleBatch(snapshot)) {
            self.router.broadcast_to_group(device_id.as_str(), &frame);
        }
    }
}

impl Default for ConnectionLifecycleManager {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

fn encode(event: &ServerEvent) -> Option<Frame> {
    match Frame::encode(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(event = event.name(), error = %e, "Failed to encode event");
            None
        }
    }
}
