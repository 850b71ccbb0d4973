//! Room state: membership, per-player state and the lifecycle manager.

pub mod index;
pub mod manager;
pub mod state;

pub use index::RoomIndex;
pub use manager::{PlayerSession, RoomManager, RoomStats};
pub use state::PlayerStateStore;
