//! Persistence layer: match and tournament record stores
//!
//! The scheduler and the orchestrating HTTP layer talk to these as fallible
//! remote collaborators with no automatic retry; a failure surfaces to the
//! caller with scheduler/engine state untouched.

pub mod matches;
pub mod supabase;
pub mod tournaments;

pub use matches::{MatchRecord, MatchRecords, SupabaseMatchStore};
pub use supabase::SupabaseClient;
pub use tournaments::{SupabaseTournamentStore, TournamentRecords};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("Row not found")]
    NotFound,

    #[error("No row returned from insert")]
    NoRowReturned,
}
