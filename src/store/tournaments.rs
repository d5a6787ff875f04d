//! Tournament record persistence

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::SupabaseClient;
use super::StoreError;

/// A persisted tournament row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub id: Uuid,
    pub name: String,
    pub winner_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
struct NewTournamentRecord {
    id: Uuid,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct TournamentWinner {
    winner_id: Uuid,
}

/// Tournament record collaborator contract
#[async_trait]
pub trait TournamentRecords: Send + Sync {
    async fn create_tournament_record(&self, name: &str) -> Result<Uuid, StoreError>;

    async fn set_tournament_winner(
        &self,
        tournament_id: Uuid,
        winner_id: Uuid,
    ) -> Result<(), StoreError>;
}

/// Supabase-backed tournament store
#[derive(Clone)]
pub struct SupabaseTournamentStore {
    client: SupabaseClient,
}

impl SupabaseTournamentStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TournamentRecords for SupabaseTournamentStore {
    async fn create_tournament_record(&self, name: &str) -> Result<Uuid, StoreError> {
        let row = NewTournamentRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let created: TournamentRecord = self.client.insert("tournaments", &row).await?;
        Ok(created.id)
    }

    async fn set_tournament_winner(
        &self,
        tournament_id: Uuid,
        winner_id: Uuid,
    ) -> Result<(), StoreError> {
        let query = format!("id=eq.{}", tournament_id);
        let update = TournamentWinner { winner_id };
        self.client.update("tournaments", &query, &update).await
    }
}
