//! Session controllers: one per practice mode, sharing the `Round` lifecycle.
//!
//! A round moves `Empty → Loading → Active → Answered*`, or `Loading → Failed`.
//! Loading is split into `begin_load` (guarded, returns a ticket) and
//! `finish_load` (applies the result only if the ticket is still current), so
//! the caller can await the content source without holding the controller.
//! Starting a new load or leaving the mode bumps the generation; anything that
//! resolves for an older generation is dropped.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::content::ContentError;

pub mod builder;
pub mod conjugation;
pub mod error_hunt;
pub mod roleplay;
pub mod syntax;
pub mod trigger;

pub use builder::{BuilderStep, SentenceBuilderSession, VerbChoice};
pub use conjugation::ConjugationSession;
pub use error_hunt::ErrorHuntSession;
pub use roleplay::RoleplaySession;
pub use syntax::PuzzleSession;
pub use trigger::{TriggerSession, TriggerStage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  /// Nothing loaded and nothing in flight.
  #[default]
  Empty,
  Loading,
  Active,
  AnsweredCorrect,
  AnsweredIncorrect,
  /// The last fetch or evaluation failed; only a reload is possible.
  Failed,
}

impl Phase {
  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Empty => "empty",
      Phase::Loading => "loading",
      Phase::Active => "active",
      Phase::AnsweredCorrect => "answered_correct",
      Phase::AnsweredIncorrect => "answered_incorrect",
      Phase::Failed => "failed",
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("a request is already in flight")]
  Busy,
  #[error("not accepting this action while {0}")]
  NotAccepting(&'static str),
  #[error("the answer is empty")]
  EmptyInput,
  #[error("unknown option {0}")]
  UnknownOption(String),
  #[error("token {0} is not in that row")]
  UnknownToken(usize),
  #[error("select at least one word first")]
  NothingSelected,
  #[error("no practice mode is open")]
  NoActiveMode,
}

/// Proof that a load (or an evaluation within a round) was started for a
/// given generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
  generation: u64,
}

#[derive(Debug)]
pub struct Round<C> {
  generation: u64,
  phase: Phase,
  challenge: Option<C>,
  error: Option<String>,
}

impl<C> Default for Round<C> {
  fn default() -> Self {
    Self { generation: 0, phase: Phase::Empty, challenge: None, error: None }
  }
}

impl<C> Round<C> {
  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn challenge(&self) -> Option<&C> {
    self.challenge.as_ref()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_current(&self, ticket: Ticket) -> bool {
    ticket.generation == self.generation
  }

  pub fn ticket(&self) -> Ticket {
    Ticket { generation: self.generation }
  }

  /// Discard the current challenge and start a new fetch.
  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    if self.phase == Phase::Loading {
      return Err(SessionError::Busy);
    }
    self.generation += 1;
    self.phase = Phase::Loading;
    self.challenge = None;
    self.error = None;
    Ok(self.ticket())
  }

  /// Apply a fetch result. Returns false when the ticket is stale and the
  /// result was dropped.
  pub fn finish_load(&mut self, ticket: Ticket, result: Result<C, ContentError>) -> bool {
    if !self.is_current(ticket) || self.phase != Phase::Loading {
      debug!(target: "session", ticket = ticket.generation, current = self.generation, "Dropping stale load result");
      return false;
    }
    match result {
      Ok(challenge) => {
        self.challenge = Some(challenge);
        self.phase = Phase::Active;
      }
      Err(e) => self.fail(e.to_string()),
    }
    true
  }

  /// Leave the mode: forget everything and orphan any in-flight call.
  pub fn abandon(&mut self) {
    self.generation += 1;
    self.phase = Phase::Empty;
    self.challenge = None;
    self.error = None;
  }

  pub fn fail(&mut self, message: String) {
    warn!(target: "session", generation = self.generation, error = %message, "Round failed");
    self.phase = Phase::Failed;
    self.error = Some(message);
  }

  /// The challenge, if answers are currently accepted.
  pub fn active(&self) -> Result<&C, SessionError> {
    match (&self.phase, &self.challenge) {
      (Phase::Active, Some(c)) => Ok(c),
      (Phase::Loading, _) => Err(SessionError::Busy),
      (phase, _) => Err(SessionError::NotAccepting(phase.as_str())),
    }
  }

  pub fn settle(&mut self, correct: bool) {
    self.phase = if correct { Phase::AnsweredCorrect } else { Phase::AnsweredIncorrect };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_while_loading_is_rejected() {
    let mut round: Round<u32> = Round::default();
    let t = round.begin_load().unwrap();
    assert_eq!(round.begin_load(), Err(SessionError::Busy));
    assert!(round.finish_load(t, Ok(7)));
    assert_eq!(round.phase(), Phase::Active);
    assert_eq!(round.challenge(), Some(&7));
  }

  #[test]
  fn result_after_abandon_is_dropped() {
    let mut round: Round<u32> = Round::default();
    let t = round.begin_load().unwrap();
    round.abandon();
    assert!(!round.finish_load(t, Ok(1)));
    assert_eq!(round.phase(), Phase::Empty);
    assert_eq!(round.challenge(), None);
  }

  #[test]
  fn only_the_latest_load_takes_effect() {
    let mut round: Round<u32> = Round::default();
    let first = round.begin_load().unwrap();
    round.abandon();
    let second = round.begin_load().unwrap();
    assert!(round.finish_load(second, Ok(2)));
    assert!(!round.finish_load(first, Ok(1)));
    assert_eq!(round.challenge(), Some(&2));
  }

  #[test]
  fn failure_is_distinct_from_a_wrong_answer() {
    let mut round: Round<u32> = Round::default();
    let t = round.begin_load().unwrap();
    assert!(round.finish_load(t, Err(ContentError::Malformed("no verb".into()))));
    assert_eq!(round.phase(), Phase::Failed);
    assert!(round.error().unwrap().contains("no verb"));
    assert_eq!(round.active(), Err(SessionError::NotAccepting("failed")));
    round.begin_load().unwrap();
    assert_eq!(round.error(), None);
  }

  #[test]
  fn answered_round_refuses_a_second_submission() {
    let mut round: Round<u32> = Round::default();
    let t = round.begin_load().unwrap();
    round.finish_load(t, Ok(3));
    assert!(round.active().is_ok());
    round.settle(true);
    assert_eq!(round.active(), Err(SessionError::NotAccepting("answered_correct")));
  }
}
