//! Match record persistence

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::SupabaseClient;
use super::StoreError;

/// A persisted match row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub tournament_id: Option<Uuid>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// New match row for insertion
#[derive(Debug, Clone, Serialize)]
struct NewMatchRecord {
    id: Uuid,
    player1_id: Uuid,
    player2_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    tournament_id: Option<Uuid>,
}

/// Final result written once a winner is decided
#[derive(Debug, Clone, Serialize)]
struct MatchFinalize {
    score1: u32,
    score2: u32,
    winner_id: Uuid,
}

/// Match record collaborator contract. The scheduler and orchestrating layer
/// depend on this; the match engine itself never calls it.
#[async_trait]
pub trait MatchRecords: Send + Sync {
    /// Create the backing record for a pairing; returns the record id, which
    /// doubles as the live session id
    async fn create_match_record(
        &self,
        player1_id: Uuid,
        player2_id: Uuid,
        tournament_id: Option<Uuid>,
    ) -> Result<Uuid, StoreError>;

    /// Resolve a record back to its participants
    async fn get_match_record(&self, id: Uuid) -> Result<MatchRecord, StoreError>;

    /// Write the final score and winner
    async fn finalize_match_record(
        &self,
        id: Uuid,
        score1: u32,
        score2: u32,
        winner_id: Uuid,
    ) -> Result<(), StoreError>;
}

/// Supabase-backed match store
#[derive(Clone)]
pub struct SupabaseMatchStore {
    client: SupabaseClient,
}

impl SupabaseMatchStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MatchRecords for SupabaseMatchStore {
    async fn create_match_record(
        &self,
        player1_id: Uuid,
        player2_id: Uuid,
        tournament_id: Option<Uuid>,
    ) -> Result<Uuid, StoreError> {
        let row = NewMatchRecord {
            id: Uuid::new_v4(),
            player1_id,
            player2_id,
            tournament_id,
        };
        let created: MatchRecord = self.client.insert("matches", &row).await?;
        Ok(created.id)
    }

    async fn get_match_record(&self, id: Uuid) -> Result<MatchRecord, StoreError> {
        let query = format!("id=eq.{}", id);
        self.client
            .get_one("matches", &query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn finalize_match_record(
        &self,
        id: Uuid,
        score1: u32,
        score2: u32,
        winner_id: Uuid,
    ) -> Result<(), StoreError> {
        let query = format!("id=eq.{}", id);
        let update = MatchFinalize {
            score1,
            score2,
            winner_id,
        };
        self.client.update("matches", &query, &update).await
    }
}
