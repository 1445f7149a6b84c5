//! Subscription groups and scoped fan-out

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::protocol::Frame;
use crate::telemetry::DeviceId;

use super::connection::{Connection, ConnectionId};

/// Routes frames to connections, either to one device's viewers or to everyone
///
/// A connection views at most one device at a time: joining a group always
/// leaves the previous one.
#[derive(Default)]
pub struct SubscriptionRouter {
    /// Every live connection
    connections: HashMap<ConnectionId, Arc<dyn Connection>>,

    /// Viewers per device
    groups: HashMap<DeviceId, HashSet<ConnectionId>>,

    /// Device each viewer currently watches
    memberships: HashMap<ConnectionId, DeviceId>,
}

impl SubscriptionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live connection
    pub fn attach(&mut self, connection: Arc<dyn Connection>) {
        self.connections.insert(connection.id(), connection);
    }

    /// Remove a connection and its group membership
    ///
    /// Returns false if the connection was not attached.
    pub fn detach(&mut self, id: ConnectionId) -> bool {
        if let Some(device_id) = self.memberships.get(&id).cloned() {
            self.leave(id, device_id.as_str());
        }
        self.connections.remove(&id).is_some()
    }

    /// Check if a connection is attached
    pub fn is_attached(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Add a connection to a device's group, leaving any previous group
    ///
    /// Returns false if the connection is not attached or already a member.
    pub fn join(&mut self, id: ConnectionId, device_id: DeviceId) -> bool {
        if !self.is_attached(id) {
            return false;
        }

        match self.memberships.get(&id).cloned() {
            Some(current) if current == device_id => return false,
            Some(current) => {
                self.leave(id, current.as_str());
            }
            None => {}
        }

        self.groups.entry(device_id.clone()).or_default().insert(id);

        tracing::debug!(
            connection_id = %id,
            device = %device_id,
            subscribers = self.subscriber_count(device_id.as_str()),
            "Viewer joined"
        );

        self.memberships.insert(id, device_id);
        true
    }

    /// Remove a connection from a device's group
    ///
    /// Returns false if it was not a member.
    pub fn leave(&mut self, id: ConnectionId, device_id: &str) -> bool {
        let Some(group) = self.groups.get_mut(device_id) else {
            return false;
        };
        if !group.remove(&id) {
            return false;
        }
        if group.is_empty() {
            self.groups.remove(device_id);
        }
        if self.memberships.get(&id).is_some_and(|d| d.as_str() == device_id) {
            self.memberships.remove(&id);
        }

        tracing::debug!(connection_id = %id, device = %device_id, "Viewer left");
        true
    }

    /// Send a frame to one connection
    pub fn send_to(&self, id: ConnectionId, frame: Frame) -> bool {
        match self.connections.get(&id) {
            Some(connection) => connection.send(frame),
            None => false,
        }
    }

    /// Send a frame to every viewer of a device, and to nobody else
    ///
    /// Returns the number of connections that accepted the frame.
    pub fn broadcast_to_group(&self, device_id: &str, frame: &Frame) -> usize {
        let Some(group) = self.groups.get(device_id) else {
            return 0;
        };

        let delivered = group
            .iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|connection| connection.send(frame.clone()))
            .count();

        tracing::debug!(
            device = %device_id,
            subscribers = group.len(),
            delivered = delivered,
            "Group broadcast"
        );
        delivered
    }

    /// Send a frame to every live connection
    pub fn broadcast_global(&self, frame: &Frame) -> usize {
        self.connections
            .values()
            .filter(|connection| connection.send(frame.clone()))
            .count()
    }

    /// Device a connection is currently viewing
    pub fn group_of(&self, id: ConnectionId) -> Option<&DeviceId> {
        self.memberships.get(&id)
    }

    /// Viewers of a device
    pub fn subscribers(&self, device_id: &str) -> Vec<ConnectionId> {
        self.groups
            .get(device_id)
            .map(|group| group.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of viewers of a device
    pub fn subscriber_count(&self, device_id: &str) -> usize {
        self.groups.get(device_id).map_or(0, HashSet::len)
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::router::ChannelConnection;

    fn attach(router: &mut SubscriptionRouter, id: u64) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new(id);
        let (conn, rx) = ChannelConnection::new(id, 16);
        router.attach(Arc::new(conn));
        (id, rx)
    }

    #[test]
    fn test_group_broadcast_is_scoped() {
        let mut router = SubscriptionRouter::new();
        let (a, mut rx_a) = attach(&mut router, 1);
        let (b, mut rx_b) = attach(&mut router, 2);
        let (_c, mut rx_c) = attach(&mut router, 3);

        router.join(a, DeviceId::new("d1"));
        router.join(b, DeviceId::new("d2"));

        let delivered = router.broadcast_to_group("d1", &Frame::from_static("x"));

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[test]
    fn test_join_moves_between_groups() {
        let mut router = SubscriptionRouter::new();
        let (a, mut rx) = attach(&mut router, 1);

        router.join(a, DeviceId::new("d1"));
        router.join(a, DeviceId::new("d2"));

        assert_eq!(router.subscriber_count("d1"), 0);
        assert_eq!(router.subscriber_count("d2"), 1);
        assert_eq!(router.group_of(a).map(DeviceId::as_str), Some("d2"));

        router.broadcast_to_group("d1", &Frame::from_static("old"));
        router.broadcast_to_group("d2", &Frame::from_static("new"));

        assert_eq!(rx.try_recv().unwrap().as_str(), Some("new"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_join_same_group_twice() {
        let mut router = SubscriptionRouter::new();
        let (a, _rx) = attach(&mut router, 1);

        assert!(router.join(a, DeviceId::new("d1")));
        assert!(!router.join(a, DeviceId::new("d1")));
        assert_eq!(router.subscriber_count("d1"), 1);
    }

    #[test]
    fn test_join_requires_attached_connection() {
        let mut router = SubscriptionRouter::new();

        assert!(!router.join(ConnectionId::new(9), DeviceId::new("d1")));
        assert_eq!(router.subscriber_count("d1"), 0);
    }

    #[test]
    fn test_leave_non_member_is_noop() {
        let mut router = SubscriptionRouter::new();
        let (a, _rx) = attach(&mut router, 1);
        router.join(a, DeviceId::new("d1"));

        assert!(!router.leave(a, "d2"));
        assert!(router.leave(a, "d1"));
        assert!(!router.leave(a, "d1"));
        assert!(router.group_of(a).is_none());
    }

    #[test]
    fn test_detach_removes_membership() {
        let mut router = SubscriptionRouter::new();
        let (a, _rx) = attach(&mut router, 1);
        router.join(a, DeviceId::new("d1"));

        assert!(router.detach(a));
        assert!(!router.detach(a));
        assert_eq!(router.subscriber_count("d1"), 0);
        assert_eq!(router.connection_count(), 0);
        assert_eq!(router.broadcast_to_group("d1", &Frame::from_static("x")), 0);
    }

    #[test]
    fn test_broadcast_global_reaches_everyone() {
        let mut router = SubscriptionRouter::new();
        let (a, mut rx_a) = attach(&mut router, 1);
        let (_b, mut rx_b) = attach(&mut router, 2);
        router.join(a, DeviceId::new("d1"));

        assert_eq!(router.broadcast_global(&Frame::from_static("all")), 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_send_to_unknown_connection() {
        let router = SubscriptionRouter::new();
        assert!(!router.send_to(ConnectionId::new(1), Frame::from_static("x")));
    }
}
