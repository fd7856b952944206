use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::question::{self, Question, ROUNDS_PER_GAME};
use crate::scoring::{self, NO_ANSWER, NO_GUESS};

// -- Phases --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Answer,
    Guess,
    Result,
}

// -- Game State Machine --

/// The timing-free half of a room's state machine: round progression,
/// answer/guess collection, and per-round outcomes. Deadlines, delays, and
/// message delivery live with the caller; everything here is synchronous and
/// deterministic under an injected RNG.
///
/// Invariants: `current_round` never exceeds `questions.len()`, the round
/// maps hold at most one entry per player, and a submission is only accepted
/// during its own phase.
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub round_phase: Option<RoundPhase>,
    pub current_round: usize,
    pub questions: Vec<Question>,
    pub answers: HashMap<Uuid, String>,
    pub guesses: HashMap<Uuid, String>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Waiting,
            round_phase: None,
            current_round: 0,
            questions: Vec::new(),
            answers: HashMap::new(),
            guesses: HashMap::new(),
        }
    }

    /// Leave `Waiting`: sample this game's questions and reset the round
    /// counter. The first round is not entered until [`begin_round`].
    ///
    /// [`begin_round`]: GameState::begin_round
    pub fn start(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        if self.phase != GamePhase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        self.questions = question::sample(rng, ROUNDS_PER_GAME);
        self.current_round = 0;
        self.answers.clear();
        self.guesses.clear();
        self.phase = GamePhase::Playing;
        self.round_phase = None;
        Ok(())
    }

    pub fn total_rounds(&self) -> usize {
        self.questions.len()
    }

    /// Advance into the next round's answer phase, clearing the round maps.
    pub fn begin_round(&mut self) -> Result<Question, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotInProgress);
        }
        if self.current_round >= self.questions.len() {
            return Err(GameError::OutOfRounds);
        }
        self.current_round += 1;
        self.answers.clear();
        self.guesses.clear();
        self.round_phase = Some(RoundPhase::Answer);
        Ok(self.questions[self.current_round - 1])
    }

    pub fn current_question(&self) -> Option<Question> {
        self.current_round
            .checked_sub(1)
            .and_then(|i| self.questions.get(i))
            .copied()
    }

    /// Record a player's answer. The first submission wins: duplicates are
    /// rejected so a late resend can neither overwrite the recorded answer
    /// nor re-trigger phase advancement.
    pub fn record_answer(&mut self, player_id: Uuid, answer: String) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotInProgress);
        }
        if self.round_phase != Some(RoundPhase::Answer) {
            return Err(GameError::WrongPhase);
        }
        if self.answers.contains_key(&player_id) {
            return Err(GameError::AlreadyRecorded);
        }
        self.answers.insert(player_id, answer);
        Ok(())
    }

    pub fn all_answered(&self, player_ids: &[Uuid]) -> bool {
        !player_ids.is_empty() && player_ids.iter().all(|id| self.answers.contains_key(id))
    }

    /// Deadline force-fill: players with no recorded answer get the sentinel.
    /// Idempotent against already-recorded entries.
    pub fn fill_missing_answers(&mut self, player_ids: &[Uuid]) {
        for id in player_ids {
            self.answers.entry(*id).or_insert_with(|| NO_ANSWER.into());
        }
    }

    pub fn begin_guess_phase(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotInProgress);
        }
        if self.round_phase != Some(RoundPhase::Answer) {
            return Err(GameError::WrongPhase);
        }
        self.round_phase = Some(RoundPhase::Guess);
        Ok(())
    }

    pub fn record_guess(&mut self, player_id: Uuid, guess: String) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotInProgress);
        }
        if self.round_phase != Some(RoundPhase::Guess) {
            return Err(GameError::WrongPhase);
        }
        if self.guesses.contains_key(&player_id) {
            return Err(GameError::AlreadyRecorded);
        }
        self.guesses.insert(player_id, guess);
        Ok(())
    }

    pub fn all_guessed(&self, player_ids: &[Uuid]) -> bool {
        !player_ids.is_empty() && player_ids.iter().all(|id| self.guesses.contains_key(id))
    }

    pub fn fill_missing_guesses(&mut self, player_ids: &[Uuid]) {
        for id in player_ids {
            self.guesses.entry(*id).or_insert_with(|| NO_GUESS.into());
        }
    }

    pub fn begin_result_phase(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotInProgress);
        }
        if self.round_phase != Some(RoundPhase::Guess) {
            return Err(GameError::WrongPhase);
        }
        self.round_phase = Some(RoundPhase::Result);
        Ok(())
    }

    /// One player's result for the current round. Correctness depends only
    /// on this player's guess against the partner's answer.
    pub fn round_outcome(&self, player_id: Uuid, partner_id: Uuid) -> RoundOutcome {
        let guess = self.guesses.get(&player_id);
        let answer = self.answers.get(&partner_id);
        RoundOutcome {
            correct: scoring::is_match(
                guess.map(String::as_str),
                answer.map(String::as_str),
            ),
            guess: guess.cloned(),
        }
    }

    pub fn is_last_round(&self) -> bool {
        !self.questions.is_empty() && self.current_round >= self.questions.len()
    }

    pub fn finish(&mut self) {
        self.phase = GamePhase::Finished;
        self.round_phase = None;
    }

    /// Play-again / mid-game-departure reset: back to `Waiting` with no
    /// questions and no round in flight.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Waiting;
        self.round_phase = None;
        self.current_round = 0;
        self.questions.clear();
        self.answers.clear();
        self.guesses.clear();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub correct: bool,
    pub guess: Option<String>,
}

// -- Errors --

#[derive(Debug, Clone, thiserror::Error)]
pub enum GameError {
    #[error("game already started")]
    AlreadyStarted,
    #[error("game not in progress")]
    NotInProgress,
    #[error("submission does not belong to the current phase")]
    WrongPhase,
    #[error("no rounds remaining")]
    OutOfRounds,
    #[error("already recorded for this round")]
    AlreadyRecorded,
}
