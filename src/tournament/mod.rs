//! Tournament bracket and scheduling modules

pub mod bracket;
pub mod scheduler;

pub use bracket::{Bracket, Pairing, RngShuffle, Shuffle};
pub use scheduler::{NextMatch, ReportOutcome, SchedulerError, TournamentScheduler};
