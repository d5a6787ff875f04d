//! Authoritative Pong game server
//!
//! The server owns the canonical state of every rally: clients push input
//! flags through a pull-based tick endpoint and render whatever state comes
//! back. A single-elimination tournament scheduler sits next to the engine,
//! pairing players, auto-advancing byes, and collecting results until one
//! player remains. Match and tournament records live in Supabase; the
//! scheduler and engine treat those stores as fallible remote collaborators.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod store;
pub mod tournament;
pub mod util;
