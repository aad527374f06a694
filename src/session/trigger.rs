//! Trigger Detective: concept cards first, then pick the mood that fits the blank.

use serde::Serialize;
use tracing::info;

use crate::content::ContentError;
use crate::domain::{Mode, TriggerChallenge};
use crate::evaluate::trigger_option_is_correct;
use crate::scoring::ScoreBoard;
use crate::seeds::CONCEPTS;

use super::{Round, SessionError, Ticket};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStage {
  #[default]
  Learn,
  Practice,
}

#[derive(Debug, Default)]
pub struct TriggerSession {
  stage: TriggerStage,
  card: usize,
  round: Round<TriggerChallenge>,
  picked: Option<usize>,
}

impl TriggerSession {
  pub fn stage(&self) -> TriggerStage {
    self.stage
  }

  pub fn card(&self) -> usize {
    self.card
  }

  pub fn round(&self) -> &Round<TriggerChallenge> {
    &self.round
  }

  pub fn picked(&self) -> Option<usize> {
    self.picked
  }

  pub fn next_card(&mut self) -> usize {
    if self.stage == TriggerStage::Learn && self.card + 1 < CONCEPTS.len() {
      self.card += 1;
    }
    self.card
  }

  pub fn prev_card(&mut self) -> usize {
    if self.stage == TriggerStage::Learn {
      self.card = self.card.saturating_sub(1);
    }
    self.card
  }

  /// Switch to practice. The caller follows up with a load.
  pub fn start_practice(&mut self) {
    self.stage = TriggerStage::Practice;
  }

  /// Back to the cards; any round in progress is dropped.
  pub fn back_to_learn(&mut self) {
    self.stage = TriggerStage::Learn;
    self.round.abandon();
    self.picked = None;
  }

  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    if self.stage != TriggerStage::Practice {
      return Err(SessionError::NotAccepting("reading concept cards"));
    }
    let ticket = self.round.begin_load()?;
    self.picked = None;
    Ok(ticket)
  }

  pub fn finish_load(&mut self, ticket: Ticket, result: Result<TriggerChallenge, ContentError>) -> bool {
    self.round.finish_load(ticket, result)
  }

  /// Leaving the mode resets to the first card, as on a fresh visit.
  pub fn abandon(&mut self) {
    self.round.abandon();
    self.stage = TriggerStage::Learn;
    self.card = 0;
    self.picked = None;
  }

  pub fn select(&mut self, index: usize, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    let challenge = self.round.active()?;
    let correct = trigger_option_is_correct(challenge, index)
      .ok_or_else(|| SessionError::UnknownOption(index.to_string()))?;
    info!(target: "session", mode = "trigger_detective", trigger_type = %challenge.trigger_type, index, %correct, "Trigger option picked");
    self.picked = Some(index);
    self.round.settle(correct);
    if correct {
      score.add_points(Mode::TriggerDetective.reward());
    }
    Ok(correct)
  }
}
