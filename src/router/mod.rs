//! Subscription routing
//!
//! Replaces transport-level "rooms" with an explicit map from device to the
//! set of connections viewing it. Delivery goes through the `Connection`
//! trait, so fan-out can be exercised without a network stack.

pub mod connection;
pub mod group;

pub use connection::{ChannelConnection, Connection, ConnectionId};
pub use group::SubscriptionRouter;
