//! Message handling and routing for client-server communication.
//!
//! This module provides the wire types exchanged over a player connection
//! and the router that decodes inbound frames and dispatches them.

pub mod router;
pub mod types;

pub use router::{decode, route_client_message};
pub use types::{ClientMessage, PlayerSnapshot, ServerMessage};
