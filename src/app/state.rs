//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::SessionRegistry;
use crate::store::{
    MatchRecords, SupabaseClient, SupabaseMatchStore, SupabaseTournamentStore, TournamentRecords,
};
use crate::tournament::TournamentScheduler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub match_store: Arc<dyn MatchRecords>,
    pub sessions: Arc<SessionRegistry>,
    pub scheduler: Arc<TournamentScheduler>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        // Initialize Supabase client and record stores
        let supabase = SupabaseClient::new(&config);
        let match_store: Arc<dyn MatchRecords> =
            Arc::new(SupabaseMatchStore::new(supabase.clone()));
        let tournament_store: Arc<dyn TournamentRecords> =
            Arc::new(SupabaseTournamentStore::new(supabase));

        Self::with_stores(config, match_store, tournament_store)
    }

    /// Wire the state around explicit record stores. Tests drive the full
    /// router against in-memory store implementations through this.
    pub fn with_stores(
        config: Config,
        match_store: Arc<dyn MatchRecords>,
        tournament_store: Arc<dyn TournamentRecords>,
    ) -> Self {
        let config = Arc::new(config);

        // Initialize live session registry
        let sessions = Arc::new(SessionRegistry::new());

        // Initialize the tournament scheduler (single bracket, single lock)
        let scheduler = Arc::new(TournamentScheduler::new(
            match_store.clone(),
            tournament_store,
        ));

        Self {
            config,
            match_store,
            sessions,
            scheduler,
        }
    }
}
