//! Authoritative Pong physics - per-tick state advancement
//!
//! The engine is pure: `advance` takes the previous tick's state plus this
//! tick's input flags and arena dimensions, and returns the next state. It
//! performs no I/O and holds no state of its own; sessions own the state and
//! the orchestrating layer persists results once a winner is set.

use serde::{Deserialize, Serialize};

/// Paddle movement per tick, in arena units. The simulation is a fixed step
/// per tick regardless of wall-clock time; the caller's polling rate is the
/// simulation rate.
pub const PADDLE_SPEED: f32 = 10.0;

/// Default ball velocity after a serve, in arena units per tick
pub const SERVE_SPEED_X: f32 = 7.0;
pub const SERVE_SPEED_Y: f32 = 5.0;

/// Which side of the arena a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Side index on the wire: left = 1, right = 2
    pub fn index(self) -> u8 {
        match self {
            Side::Left => 1,
            Side::Right => 2,
        }
    }
}

/// Fixed arena geometry, supplied by the client driver on the first tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub ball_radius: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 10.0,
            paddle_height: 100.0,
            ball_radius: 10.0,
        }
    }
}

impl ArenaConfig {
    fn validate(&self) -> Result<(), EngineError> {
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("ball_radius", self.ball_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidState { field });
            }
        }
        if self.paddle_height > self.height || self.paddle_width * 2.0 >= self.width {
            return Err(EngineError::InvalidState { field: "arena" });
        }
        Ok(())
    }
}

/// Input flags for one tick. Both flags held (or neither) is a no-op for
/// that side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub left_up: bool,
    pub left_down: bool,
    pub right_up: bool,
    pub right_down: bool,
}

/// Full authoritative state of one rally
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PongState {
    /// Vertical offset of each paddle's top edge, clamped to
    /// [0, height - paddle_height]
    pub left_paddle_y: f32,
    pub right_paddle_y: f32,

    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_vx: f32,
    pub ball_vy: f32,

    pub score_left: u32,
    pub score_right: u32,

    /// Set once a side reaches the win threshold; terminal
    pub winner: Option<Side>,
}

impl PongState {
    /// Initial state for a fresh rally: paddles centered, ball at center
    /// serving toward the left side.
    pub fn new(arena: &ArenaConfig) -> Self {
        Self {
            left_paddle_y: (arena.height - arena.paddle_height) / 2.0,
            right_paddle_y: (arena.height - arena.paddle_height) / 2.0,
            ball_x: arena.width / 2.0,
            ball_y: arena.height / 2.0,
            ball_vx: -SERVE_SPEED_X,
            ball_vy: SERVE_SPEED_Y,
            score_left: 0,
            score_right: 0,
            winner: None,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        for (field, value) in [
            ("left_paddle_y", self.left_paddle_y),
            ("right_paddle_y", self.right_paddle_y),
            ("ball_x", self.ball_x),
            ("ball_y", self.ball_y),
            ("ball_vx", self.ball_vx),
            ("ball_vy", self.ball_vy),
        ] {
            if !value.is_finite() {
                return Err(EngineError::InvalidState { field });
            }
        }
        Ok(())
    }
}

/// Engine failure modes
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid physics state: {field}")]
    InvalidState { field: &'static str },
}

/// The authoritative per-tick simulation
pub struct PongEngine;

impl PongEngine {
    /// Advance one tick.
    ///
    /// A call after `winner` is set is not an error: the frozen terminal
    /// state is returned unchanged, so a client polling past match-end sees
    /// a stable final frame.
    pub fn advance(
        state: &PongState,
        input: &TickInput,
        arena: &ArenaConfig,
        win_score: u32,
    ) -> Result<PongState, EngineError> {
        arena.validate()?;
        state.validate()?;

        if state.winner.is_some() {
            return Ok(*state);
        }

        let mut next = *state;

        // Paddle movement, clamped into the arena immediately
        let paddle_max = arena.height - arena.paddle_height;
        next.left_paddle_y =
            step_paddle(next.left_paddle_y, input.left_up, input.left_down, paddle_max);
        next.right_paddle_y = step_paddle(
            next.right_paddle_y,
            input.right_up,
            input.right_down,
            paddle_max,
        );

        // Ball motion: fixed step once per tick
        next.ball_x += next.ball_vx;
        next.ball_y += next.ball_vy;

        // Wall bounce: invert vertical velocity when the leading edge crosses
        // the bound. No positional correction beyond the bounce.
        if next.ball_y - arena.ball_radius <= 0.0 && next.ball_vy < 0.0 {
            next.ball_vy = -next.ball_vy;
        } else if next.ball_y + arena.ball_radius >= arena.height && next.ball_vy > 0.0 {
            next.ball_vy = -next.ball_vy;
        }

        // Paddle collision: the return is purely horizontal-sign-based, it
        // ignores where on the paddle the ball struck.
        let ball_top = next.ball_y - arena.ball_radius;
        let ball_bottom = next.ball_y + arena.ball_radius;

        if next.ball_x - arena.ball_radius <= arena.paddle_width
            && ball_bottom >= next.left_paddle_y
            && ball_top <= next.left_paddle_y + arena.paddle_height
        {
            next.ball_vx = next.ball_vx.abs();
        } else if next.ball_x + arena.ball_radius >= arena.width - arena.paddle_width
            && ball_bottom >= next.right_paddle_y
            && ball_top <= next.right_paddle_y + arena.paddle_height
        {
            next.ball_vx = -next.ball_vx.abs();
        }

        // Scoring: the ball passed a side's boundary, the opposing side
        // scores and the ball is re-served toward the conceding side.
        if next.ball_x < 0.0 {
            score_point(&mut next, Side::Right, arena, win_score);
        } else if next.ball_x > arena.width {
            score_point(&mut next, Side::Left, arena, win_score);
        }

        Ok(next)
    }
}

fn step_paddle(y: f32, up: bool, down: bool, max: f32) -> f32 {
    let moved = match (up, down) {
        (true, false) => y - PADDLE_SPEED,
        (false, true) => y + PADDLE_SPEED,
        _ => y,
    };
    moved.clamp(0.0, max)
}

fn score_point(state: &mut PongState, scorer: Side, arena: &ArenaConfig, win_score: u32) {
    let (score, serve_vx) = match scorer {
        Side::Left => (&mut state.score_left, SERVE_SPEED_X),
        Side::Right => (&mut state.score_right, -SERVE_SPEED_X),
    };
    *score += 1;
    let reached = *score;

    state.ball_x = arena.width / 2.0;
    state.ball_y = arena.height / 2.0;
    state.ball_vx = serve_vx;
    state.ball_vy = SERVE_SPEED_Y;

    if reached >= win_score {
        state.winner = Some(scorer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn arena() -> ArenaConfig {
        ArenaConfig::default()
    }

    fn held(left_up: bool, left_down: bool, right_up: bool, right_down: bool) -> TickInput {
        TickInput {
            left_up,
            left_down,
            right_up,
            right_down,
        }
    }

    #[test]
    fn ball_moves_by_velocity_each_tick() {
        let arena = arena();
        let state = PongState::new(&arena);
        let next = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();

        assert_approx_eq!(next.ball_x, state.ball_x + state.ball_vx);
        assert_approx_eq!(next.ball_y, state.ball_y + state.ball_vy);
    }

    #[test]
    fn paddles_stay_clamped_inside_arena() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        let max = arena.height - arena.paddle_height;

        // Hold "up" on both sides far longer than needed to reach the edge
        for _ in 0..200 {
            state = PongEngine::advance(&state, &held(true, false, true, false), &arena, 5)
                .unwrap();
            assert!(state.left_paddle_y >= 0.0 && state.left_paddle_y <= max);
            assert!(state.right_paddle_y >= 0.0 && state.right_paddle_y <= max);
        }
        assert_approx_eq!(state.left_paddle_y, 0.0);

        for _ in 0..200 {
            state = PongEngine::advance(&state, &held(false, true, false, true), &arena, 5)
                .unwrap();
            assert!(state.left_paddle_y >= 0.0 && state.left_paddle_y <= max);
        }
        assert_approx_eq!(state.left_paddle_y, max);
    }

    #[test]
    fn both_flags_held_is_a_no_op() {
        let arena = arena();
        let state = PongState::new(&arena);
        let next = PongEngine::advance(&state, &held(true, true, false, false), &arena, 5)
            .unwrap();
        assert_approx_eq!(next.left_paddle_y, state.left_paddle_y);
    }

    #[test]
    fn top_wall_inverts_vertical_velocity() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        state.ball_y = arena.ball_radius + 1.0;
        state.ball_vy = -SERVE_SPEED_Y;
        // Put the ball mid-field so no paddle or goal is involved
        state.ball_x = arena.width / 2.0;
        state.ball_vx = 0.0;

        let next = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();
        assert!(next.ball_vy > 0.0);
        assert!(next.ball_y >= 0.0 && next.ball_y <= arena.height);
    }

    #[test]
    fn bottom_wall_inverts_vertical_velocity() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        state.ball_y = arena.height - arena.ball_radius - 1.0;
        state.ball_vy = SERVE_SPEED_Y;
        state.ball_x = arena.width / 2.0;
        state.ball_vx = 0.0;

        let next = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();
        assert!(next.ball_vy < 0.0);
        assert!(next.ball_y >= 0.0 && next.ball_y <= arena.height);
    }

    #[test]
    fn left_paddle_returns_ball_when_overlapping() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        state.left_paddle_y = 250.0;
        state.ball_x = arena.paddle_width + arena.ball_radius + 2.0;
        state.ball_y = 300.0;
        state.ball_vx = -SERVE_SPEED_X;
        state.ball_vy = 0.0;

        let next = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();
        assert!(next.ball_vx > 0.0, "ball must be forced outward");
        assert_eq!(next.score_left, 0);
        assert_eq!(next.score_right, 0);
    }

    #[test]
    fn missed_ball_scores_for_the_opposing_side() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        // Paddle far away from the ball's path
        state.left_paddle_y = 0.0;
        state.ball_x = 3.0;
        state.ball_y = 400.0;
        state.ball_vx = -SERVE_SPEED_X;
        state.ball_vy = 0.0;

        let next = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();
        assert_eq!(next.score_right, 1);
        assert_eq!(next.score_left, 0);
        // Ball re-served from center toward the conceding (left) side
        assert_approx_eq!(next.ball_x, arena.width / 2.0);
        assert_approx_eq!(next.ball_y, arena.height / 2.0);
        assert!(next.ball_vx < 0.0);
    }

    #[test]
    fn score_increments_by_exactly_one_per_event() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        state.ball_x = 3.0;
        state.ball_y = 400.0;
        state.left_paddle_y = 0.0;
        state.ball_vx = -SERVE_SPEED_X;
        state.ball_vy = 0.0;

        let before = state.score_right;
        let next = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();
        assert_eq!(next.score_right, before + 1);
    }

    #[test]
    fn reaching_win_score_sets_winner_and_freezes_state() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        state.score_right = 4;
        state.ball_x = 3.0;
        state.ball_y = 400.0;
        state.left_paddle_y = 0.0;
        state.ball_vx = -SERVE_SPEED_X;
        state.ball_vy = 0.0;

        let decided = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap();
        assert_eq!(decided.winner, Some(Side::Right));
        assert_eq!(decided.score_right, 5);

        // Terminal state is idempotent: further advances are bit-identical
        let frozen = PongEngine::advance(&decided, &held(true, false, false, true), &arena, 5)
            .unwrap();
        assert_eq!(frozen, decided);
        let frozen_again =
            PongEngine::advance(&frozen, &TickInput::default(), &arena, 5).unwrap();
        assert_eq!(frozen_again, decided);
    }

    #[test]
    fn non_finite_state_fails_fast() {
        let arena = arena();
        let mut state = PongState::new(&arena);
        state.ball_x = f32::NAN;

        let err = PongEngine::advance(&state, &TickInput::default(), &arena, 5).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { field: "ball_x" }));
    }

    #[test]
    fn non_positive_arena_fails_fast() {
        let mut bad = ArenaConfig::default();
        bad.height = 0.0;
        let state = PongState::new(&ArenaConfig::default());

        let err = PongEngine::advance(&state, &TickInput::default(), &bad, 5).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { field: "height" }));
    }
}
