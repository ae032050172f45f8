//! Per-room state machine: phase, state, the command vocabulary, and the
//! controller that owns and serializes all of it.

pub mod command;
pub mod controller;
pub mod phase;
pub mod state;

pub use command::Command;
pub use controller::{CommandSender, RoomController};
pub use phase::Phase;
pub use state::RoomState;
