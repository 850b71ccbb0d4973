//! Core server implementation and connection handling.
//!
//! This module contains the main room server structure, the HTTP endpoints
//! and the logic for handling player connections.

pub mod core;
pub mod handlers;
pub mod http;

pub use core::{AppState, RoomServer};
