//! Tournament scheduler - bracket lifecycle under a single lock
//!
//! All bracket operations run under one mutex so pairing, cursor, and
//! accumulator mutations are seen as atomic units by concurrent callers.
//! External store calls happen while the lock is held; on failure the
//! bracket is left exactly as it was, so callers may retry the whole
//! operation.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::store::{MatchRecords, StoreError, TournamentRecords};

use super::bracket::{Bracket, RngShuffle, Shuffle};

/// Scheduler failure taxonomy
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Conflict: {0}")]
    Conflict(&'static str),

    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(&'static str),

    #[error("Collaborator call failed: {0}")]
    Collaborator(#[from] StoreError),
}

/// Outcome of asking for the next playable match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextMatch {
    /// A real pairing was reached; its backing record and session exist.
    /// `byes` lists every player auto-advanced while walking to it.
    MatchReady {
        session_id: Uuid,
        tournament_id: Uuid,
        player1: Uuid,
        player2: Uuid,
        byes: Vec<Uuid>,
    },
    /// The walk determined a sole overall winner; the bracket is gone
    Finished { winner_id: Uuid, byes: Vec<Uuid> },
}

/// Outcome of reporting a match result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The reported winner was the last player standing
    Finished { winner_id: Uuid },
    /// The round rolled over; `remaining` pairings were queued
    NextRoundReady { remaining: usize },
    /// More pairings remain in the current round
    NextMatchReady,
}

struct SchedulerState {
    bracket: Option<Bracket>,
    shuffle: Box<dyn Shuffle>,
}

/// The tournament scheduler. At most one bracket is active at a time.
pub struct TournamentScheduler {
    state: Mutex<SchedulerState>,
    matches: Arc<dyn MatchRecords>,
    tournaments: Arc<dyn TournamentRecords>,
}

impl TournamentScheduler {
    pub fn new(matches: Arc<dyn MatchRecords>, tournaments: Arc<dyn TournamentRecords>) -> Self {
        Self::with_shuffle(matches, tournaments, Box::new(RngShuffle::from_entropy()))
    }

    /// Construct with an explicit permutation source (tests pin ordering
    /// through this)
    pub fn with_shuffle(
        matches: Arc<dyn MatchRecords>,
        tournaments: Arc<dyn TournamentRecords>,
        shuffle: Box<dyn Shuffle>,
    ) -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                bracket: None,
                shuffle,
            }),
            matches,
            tournaments,
        }
    }

    /// Whether a bracket is currently active
    pub async fn active(&self) -> bool {
        self.state.lock().await.bracket.is_some()
    }

    /// Create a tournament from at least 3 distinct players. Duplicate ids
    /// are dropped before the count check.
    pub async fn create_tournament(
        &self,
        player_ids: &[Uuid],
        name: &str,
    ) -> Result<Uuid, SchedulerError> {
        let mut seen = HashSet::new();
        let players: Vec<Uuid> = player_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        if players.len() < 3 {
            return Err(SchedulerError::InvalidArgument(
                "a tournament requires at least 3 distinct players",
            ));
        }
        if name.trim().is_empty() {
            return Err(SchedulerError::InvalidArgument(
                "tournament name must not be empty",
            ));
        }

        let mut state = self.state.lock().await;
        if state.bracket.is_some() {
            return Err(SchedulerError::Conflict("a tournament is already active"));
        }

        let tournament_id = self.tournaments.create_tournament_record(name).await?;
        let bracket = Bracket::new(
            tournament_id,
            name.to_string(),
            players,
            state.shuffle.as_mut(),
        );

        info!(
            tournament_id = %tournament_id,
            players = player_ids.len(),
            pairings = bracket.remaining_pairings(),
            "Tournament created"
        );
        state.bracket = Some(bracket);

        Ok(tournament_id)
    }

    /// Walk the pairing queue to the next real pairing, auto-advancing byes
    /// and rolling rounds over along the way. Creates the backing match
    /// record for the pairing it returns; no bracket mutation is committed
    /// unless that creation succeeds.
    pub async fn next_playable_match(&self) -> Result<NextMatch, SchedulerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(bracket) = state.bracket.as_ref() else {
            return Err(SchedulerError::InvalidArgument("no active tournament"));
        };

        // Work on a scratch copy; commit only after side effects succeed
        let mut scratch = bracket.clone();
        let tournament_id = scratch.tournament_id;
        let bound = scratch.walk_bound();
        let mut byes = Vec::new();

        for _ in 0..bound {
            if scratch.queue_consumed() {
                if scratch.has_open_sessions() {
                    return Err(SchedulerError::Conflict(
                        "matches are still awaiting results",
                    ));
                }
                if let Some(winner_id) = scratch.sole_winner() {
                    self.tournaments
                        .set_tournament_winner(tournament_id, winner_id)
                        .await?;
                    info!(tournament_id = %tournament_id, winner_id = %winner_id, "Tournament finished");
                    state.bracket = None;
                    return Ok(NextMatch::Finished { winner_id, byes });
                }
                scratch.next_round(state.shuffle.as_mut());
                continue;
            }

            // Queue not consumed, so a pairing exists at the cursor
            let Some(pairing) = scratch.current_pairing() else {
                break;
            };

            match pairing.player2 {
                None => {
                    // Byes never create a match or consume a result
                    scratch.advance_bye(pairing.player1);
                    byes.push(pairing.player1);
                }
                Some(player2) => {
                    let session_id = self
                        .matches
                        .create_match_record(pairing.player1, player2, Some(tournament_id))
                        .await?;
                    scratch.advance_played(session_id);
                    state.bracket = Some(scratch);

                    info!(
                        tournament_id = %tournament_id,
                        session_id = %session_id,
                        "Pairing ready to play"
                    );
                    return Ok(NextMatch::MatchReady {
                        session_id,
                        tournament_id,
                        player1: pairing.player1,
                        player2,
                        byes,
                    });
                }
            }
        }

        // A healthy bracket can never take this many steps; the bracket is
        // corrupted and gets discarded rather than left in place.
        error!(tournament_id = %tournament_id, "Pairing queue walk exceeded bound, discarding bracket");
        state.bracket = None;
        Err(SchedulerError::InternalInconsistency(
            "pairing queue walk exceeded bound",
        ))
    }

    /// Report the result of a created session. The winning side index is
    /// 1 (player1) or 2 (player2).
    pub async fn report_match_result(
        &self,
        session_id: Uuid,
        winning_side: u8,
    ) -> Result<ReportOutcome, SchedulerError> {
        if winning_side != 1 && winning_side != 2 {
            return Err(SchedulerError::InvalidArgument(
                "winning side index must be 1 or 2",
            ));
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(bracket) = state.bracket.as_ref() else {
            return Err(SchedulerError::InvalidArgument("no active tournament"));
        };

        if bracket.session_resolved(&session_id) {
            return Err(SchedulerError::Conflict(
                "result already reported for this session",
            ));
        }
        if !bracket.session_open(&session_id) {
            return Err(SchedulerError::InvalidArgument(
                "session does not belong to the active tournament",
            ));
        }

        let record = match self.matches.get_match_record(session_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => {
                return Err(SchedulerError::InvalidArgument("unknown session"));
            }
            Err(e) => return Err(SchedulerError::Collaborator(e)),
        };

        let winner_id = if winning_side == 1 {
            record.player1_id
        } else {
            record.player2_id
        };

        let mut scratch = bracket.clone();
        let tournament_id = scratch.tournament_id;
        scratch.record_result(session_id, winner_id);

        if scratch.round_complete() {
            if let Some(final_winner) = scratch.sole_winner() {
                self.tournaments
                    .set_tournament_winner(tournament_id, final_winner)
                    .await?;
                info!(tournament_id = %tournament_id, winner_id = %final_winner, "Tournament finished");
                state.bracket = None;
                return Ok(ReportOutcome::Finished {
                    winner_id: final_winner,
                });
            }

            let remaining = scratch.next_round(state.shuffle.as_mut());
            info!(
                tournament_id = %tournament_id,
                round = scratch.round,
                pairings = remaining,
                "Round advanced"
            );
            state.bracket = Some(scratch);
            return Ok(ReportOutcome::NextRoundReady { remaining });
        }

        state.bracket = Some(scratch);
        Ok(ReportOutcome::NextMatchReady)
    }

    /// Discard the active bracket without declaring a winner
    pub async fn abandon(&self) -> Result<(), SchedulerError> {
        let mut state = self.state.lock().await;
        let Some(bracket) = state.bracket.take() else {
            return Err(SchedulerError::Conflict("no active tournament"));
        };
        info!(tournament_id = %bracket.tournament_id, "Tournament abandoned");
        Ok(())
    }
}
