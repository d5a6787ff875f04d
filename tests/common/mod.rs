//! Shared test doubles for the integration suites
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use pong_game_server::store::{MatchRecord, MatchRecords, StoreError, TournamentRecords};
use pong_game_server::tournament::Shuffle;

/// Keeps players in their given order so pairings are predictable
pub struct IdentityShuffle;

impl Shuffle for IdentityShuffle {
    fn shuffle(&mut self, _players: &mut [Uuid]) {}
}

/// In-memory stand-in for the Supabase stores, with injectable failures
#[derive(Default)]
pub struct MemoryStore {
    matches: Mutex<HashMap<Uuid, MatchRecord>>,
    tournament_winners: Mutex<HashMap<Uuid, Uuid>>,
    fail_next_match_create: AtomicBool,
    fail_finalize: AtomicBool,
}

impl MemoryStore {
    /// Fail the next `create_match_record` call, then recover
    pub fn fail_next_match_create(&self) {
        self.fail_next_match_create.store(true, Ordering::SeqCst);
    }

    /// Fail every `finalize_match_record` call until cleared
    pub fn set_fail_finalize(&self, fail: bool) {
        self.fail_finalize.store(fail, Ordering::SeqCst);
    }

    pub fn match_record(&self, id: &Uuid) -> Option<MatchRecord> {
        self.matches.lock().unwrap().get(id).cloned()
    }

    pub fn tournament_winner(&self, tournament_id: &Uuid) -> Option<Uuid> {
        self.tournament_winners
            .lock()
            .unwrap()
            .get(tournament_id)
            .copied()
    }
}

#[async_trait]
impl MatchRecords for MemoryStore {
    async fn create_match_record(
        &self,
        player1_id: Uuid,
        player2_id: Uuid,
        tournament_id: Option<Uuid>,
    ) -> Result<Uuid, StoreError> {
        if self.fail_next_match_create.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                body: "injected failure".to_string(),
            });
        }

        let id = Uuid::new_v4();
        self.matches.lock().unwrap().insert(
            id,
            MatchRecord {
                id,
                player1_id,
                player2_id,
                tournament_id,
                score1: None,
                score2: None,
                winner_id: None,
                created_at: chrono::Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_match_record(&self, id: Uuid) -> Result<MatchRecord, StoreError> {
        self.matches
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn finalize_match_record(
        &self,
        id: Uuid,
        score1: u32,
        score2: u32,
        winner_id: Uuid,
    ) -> Result<(), StoreError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                body: "injected failure".to_string(),
            });
        }

        let mut matches = self.matches.lock().unwrap();
        let record = matches.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.score1 = Some(score1);
        record.score2 = Some(score2);
        record.winner_id = Some(winner_id);
        Ok(())
    }
}

#[async_trait]
impl TournamentRecords for MemoryStore {
    async fn create_tournament_record(&self, _name: &str) -> Result<Uuid, StoreError> {
        Ok(Uuid::new_v4())
    }

    async fn set_tournament_winner(
        &self,
        tournament_id: Uuid,
        winner_id: Uuid,
    ) -> Result<(), StoreError> {
        self.tournament_winners
            .lock()
            .unwrap()
            .insert(tournament_id, winner_id);
        Ok(())
    }
}
