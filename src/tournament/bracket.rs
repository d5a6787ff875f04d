//! Single-elimination bracket state
//!
//! A bracket holds one round's pairing queue, the cursor into it, and the
//! winners accumulated so far. Round rollover reshuffles the accumulated
//! winners into a fresh queue. The shuffle is behind a trait so tests can
//! pin a deterministic order.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use uuid::Uuid;

/// Random permutation source for seeding rounds
pub trait Shuffle: Send {
    fn shuffle(&mut self, players: &mut [Uuid]);
}

/// Production shuffle backed by a seeded ChaCha8 stream
pub struct RngShuffle {
    rng: ChaCha8Rng,
}

impl RngShuffle {
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Shuffle for RngShuffle {
    fn shuffle(&mut self, players: &mut [Uuid]) {
        players.shuffle(&mut self.rng);
    }
}

/// One pairing in the queue. `player2 = None` is a bye: `player1` advances
/// without playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub player1: Uuid,
    pub player2: Option<Uuid>,
}

/// The active single-elimination bracket
#[derive(Debug, Clone)]
pub struct Bracket {
    pub tournament_id: Uuid,
    pub name: String,
    pub round: u32,

    pairings: Vec<Pairing>,
    cursor: usize,
    winners: Vec<Uuid>,

    /// Sessions created for this bracket that have not reported a result
    open_sessions: HashSet<Uuid>,
    /// Sessions whose result has already been consumed; a second report for
    /// one of these is a conflict, not a double-counted winner
    resolved_sessions: HashSet<Uuid>,

    /// Player count at creation, used to bound queue walks
    player_count: usize,
}

impl Bracket {
    /// Seed the first round from a de-duplicated player set. Callers must
    /// have validated the minimum player count already.
    pub fn new(
        tournament_id: Uuid,
        name: String,
        mut players: Vec<Uuid>,
        shuffle: &mut dyn Shuffle,
    ) -> Self {
        let player_count = players.len();
        shuffle.shuffle(&mut players);

        Self {
            tournament_id,
            name,
            round: 1,
            pairings: partition_pairs(&players),
            cursor: 0,
            winners: Vec::new(),
            open_sessions: HashSet::new(),
            resolved_sessions: HashSet::new(),
            player_count,
        }
    }

    /// Pairing at the cursor, if the queue is not yet consumed
    pub fn current_pairing(&self) -> Option<Pairing> {
        self.pairings.get(self.cursor).copied()
    }

    pub fn queue_consumed(&self) -> bool {
        self.cursor >= self.pairings.len()
    }

    /// Pairings left in the current round's queue, counting the cursor's
    pub fn remaining_pairings(&self) -> usize {
        self.pairings.len() - self.cursor
    }

    pub fn has_open_sessions(&self) -> bool {
        !self.open_sessions.is_empty()
    }

    /// Advance the cursor past a bye, accumulating its player as a winner
    pub fn advance_bye(&mut self, player: Uuid) {
        self.winners.push(player);
        self.cursor += 1;
    }

    /// Advance the cursor past a real pairing whose backing session was
    /// created successfully
    pub fn advance_played(&mut self, session_id: Uuid) {
        self.open_sessions.insert(session_id);
        self.cursor += 1;
    }

    /// Whether this session belongs to the bracket and still awaits a result
    pub fn session_open(&self, session_id: &Uuid) -> bool {
        self.open_sessions.contains(session_id)
    }

    /// Whether this session already reported a result
    pub fn session_resolved(&self, session_id: &Uuid) -> bool {
        self.resolved_sessions.contains(session_id)
    }

    /// Consume a reported result, moving the session from open to resolved
    pub fn record_result(&mut self, session_id: Uuid, winner: Uuid) {
        self.open_sessions.remove(&session_id);
        self.resolved_sessions.insert(session_id);
        self.winners.push(winner);
    }

    /// Whether the round can roll over: the queue is fully consumed and
    /// every created session has reported
    pub fn round_complete(&self) -> bool {
        self.queue_consumed() && self.open_sessions.is_empty()
    }

    /// The sole tournament winner, if the completed round produced one
    pub fn sole_winner(&self) -> Option<Uuid> {
        if self.round_complete() && self.winners.len() == 1 {
            Some(self.winners[0])
        } else {
            None
        }
    }

    /// Roll over into the next round: reshuffle the accumulated winners and
    /// repartition into pairs. Returns the number of pairings in the new
    /// round. Callers must have checked `round_complete` and ruled out a
    /// sole winner.
    pub fn next_round(&mut self, shuffle: &mut dyn Shuffle) -> usize {
        let mut players = std::mem::take(&mut self.winners);
        shuffle.shuffle(&mut players);

        self.pairings = partition_pairs(&players);
        self.cursor = 0;
        self.round += 1;
        self.pairings.len()
    }

    /// Upper bound on pairing-queue steps a single walk may take before the
    /// bracket must be considered corrupted
    pub fn walk_bound(&self) -> usize {
        2 * self.player_count + 2
    }
}

/// Partition an ordered player list into pairings; an odd trailing player
/// gets a bye. The bye pairing is queued ahead of the real pairings so a
/// single queue walk surfaces the auto-advanced player together with the
/// round's first playable match.
fn partition_pairs(players: &[Uuid]) -> Vec<Pairing> {
    let mut pairings: Vec<Pairing> = players
        .chunks(2)
        .map(|pair| Pairing {
            player1: pair[0],
            player2: pair.get(1).copied(),
        })
        .collect();
    if let Some(bye) = pairings.iter().position(|p| p.player2.is_none()) {
        let bye = pairings.remove(bye);
        pairings.insert(0, bye);
    }
    pairings
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keeps the input order so pairings are predictable
    struct NoShuffle;

    impl Shuffle for NoShuffle {
        fn shuffle(&mut self, _players: &mut [Uuid]) {}
    }

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn odd_player_count_yields_exactly_one_bye() {
        let pairings = partition_pairs(&ids(5));
        assert_eq!(pairings.len(), 3);

        let byes = pairings.iter().filter(|p| p.player2.is_none()).count();
        assert_eq!(byes, 1);
        // The bye is queued first so one walk covers it and the first
        // playable pairing
        assert!(pairings.first().unwrap().player2.is_none());
    }

    #[test]
    fn seeded_shuffle_is_a_reproducible_permutation() {
        let players = ids(8);

        let mut first = players.clone();
        RngShuffle::seeded(42).shuffle(&mut first);
        let mut second = players.clone();
        RngShuffle::seeded(42).shuffle(&mut second);
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort();
        let mut expected = players;
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn even_player_count_has_no_bye() {
        let pairings = partition_pairs(&ids(4));
        assert_eq!(pairings.len(), 2);
        assert!(pairings.iter().all(|p| p.player2.is_some()));
    }

    #[test]
    fn winners_seed_the_next_round_exactly() {
        let players = ids(4);
        let mut bracket = Bracket::new(
            Uuid::new_v4(),
            "weekly".to_string(),
            players.clone(),
            &mut NoShuffle,
        );

        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        bracket.advance_played(s1);
        bracket.advance_played(s2);
        bracket.record_result(s1, players[0]);
        bracket.record_result(s2, players[2]);

        assert!(bracket.round_complete());
        assert!(bracket.sole_winner().is_none());

        let pairings = bracket.next_round(&mut NoShuffle);
        assert_eq!(pairings, 1);
        assert_eq!(bracket.round, 2);
        assert_eq!(
            bracket.current_pairing(),
            Some(Pairing {
                player1: players[0],
                player2: Some(players[2]),
            })
        );
    }

    #[test]
    fn round_is_not_complete_while_a_session_is_open() {
        let players = ids(4);
        let mut bracket = Bracket::new(
            Uuid::new_v4(),
            "weekly".to_string(),
            players.clone(),
            &mut NoShuffle,
        );

        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        bracket.advance_played(s1);
        bracket.advance_played(s2);
        bracket.record_result(s1, players[0]);

        assert!(bracket.queue_consumed());
        assert!(!bracket.round_complete());
        assert!(bracket.sole_winner().is_none());
    }

    #[test]
    fn resolved_sessions_are_remembered() {
        let players = ids(4);
        let mut bracket = Bracket::new(
            Uuid::new_v4(),
            "weekly".to_string(),
            players.clone(),
            &mut NoShuffle,
        );

        let s1 = Uuid::new_v4();
        bracket.advance_played(s1);
        assert!(bracket.session_open(&s1));

        bracket.record_result(s1, players[0]);
        assert!(!bracket.session_open(&s1));
        assert!(bracket.session_resolved(&s1));
    }
}
