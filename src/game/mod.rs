//! Game simulation modules

pub mod engine;
pub mod session;

pub use engine::{ArenaConfig, EngineError, PongState, Side, TickInput};
pub use session::{MatchSession, SessionRegistry};
