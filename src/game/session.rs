//! Live match sessions and the session registry
//!
//! A session ties one engine state to its persisted match record; the
//! session id is the match record id. Each session is wrapped in its own
//! lock so concurrent ticks for the same session are serialized while ticks
//! for different sessions proceed in parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;

use super::engine::{ArenaConfig, EngineError, PongEngine, PongState, Side, TickInput};

/// One live match between two players
pub struct MatchSession {
    pub id: Uuid,
    pub player1: Uuid,
    pub player2: Uuid,
    pub tournament_id: Option<Uuid>,
    pub win_score: u32,
    pub started_at: u64,
    pub limiter: SessionRateLimiter,

    /// Pinned on the first tick; later tick requests may not change it
    arena: Option<ArenaConfig>,
    state: Option<PongState>,
    finalized: bool,
}

/// Result of applying one tick to a session
#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub state: PongState,
    /// True exactly once, on the tick that decided the match
    pub just_decided: bool,
}

impl MatchSession {
    pub fn new(
        id: Uuid,
        player1: Uuid,
        player2: Uuid,
        tournament_id: Option<Uuid>,
        win_score: u32,
    ) -> Self {
        Self {
            id,
            player1,
            player2,
            tournament_id,
            win_score,
            started_at: unix_millis(),
            limiter: SessionRateLimiter::new(),
            arena: None,
            state: None,
            finalized: false,
        }
    }

    /// Apply one tick of input. The first tick pins the arena geometry and
    /// initializes the rally; a tick after the winner is set returns the
    /// frozen terminal state.
    pub fn tick(&mut self, input: &TickInput, arena: ArenaConfig) -> Result<TickOutcome, EngineError> {
        let arena = *self.arena.get_or_insert(arena);
        let state = *self.state.get_or_insert_with(|| PongState::new(&arena));

        let was_decided = state.winner.is_some();
        let next = PongEngine::advance(&state, input, &arena, self.win_score)?;
        self.state = Some(next);

        Ok(TickOutcome {
            state: next,
            just_decided: !was_decided && next.winner.is_some(),
        })
    }

    /// Current state, if at least one tick has run
    pub fn state(&self) -> Option<&PongState> {
        self.state.as_ref()
    }

    /// Player id for the side that won, once decided
    pub fn winner_id(&self) -> Option<Uuid> {
        self.state.as_ref().and_then(|s| s.winner).map(|side| match side {
            Side::Left => self.player1,
            Side::Right => self.player2,
        })
    }

    /// Whether the final result has been written to the match record
    pub fn finalized(&self) -> bool {
        self.finalized
    }

    pub fn mark_finalized(&mut self) {
        self.finalized = true;
    }
}

/// Registry of all live sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<Mutex<MatchSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, session: MatchSession) -> Arc<Mutex<MatchSession>> {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<MatchSession>>> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<Mutex<MatchSession>>> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
