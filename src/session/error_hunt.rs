//! Error Hunter: two near-identical sentences, pick the correct one.

use tracing::info;

use crate::content::ContentError;
use crate::domain::{ErrorChallenge, Mode};
use crate::evaluate::error_option_is_correct;
use crate::scoring::ScoreBoard;

use super::{Round, SessionError, Ticket};

#[derive(Debug, Default)]
pub struct ErrorHuntSession {
  round: Round<ErrorChallenge>,
  picked: Option<i64>,
}

impl ErrorHuntSession {
  pub fn round(&self) -> &Round<ErrorChallenge> {
    &self.round
  }

  pub fn picked(&self) -> Option<i64> {
    self.picked
  }

  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    let ticket = self.round.begin_load()?;
    self.picked = None;
    Ok(ticket)
  }

  pub fn finish_load(&mut self, ticket: Ticket, result: Result<ErrorChallenge, ContentError>) -> bool {
    self.round.finish_load(ticket, result)
  }

  pub fn abandon(&mut self) {
    self.round.abandon();
    self.picked = None;
  }

  pub fn select(&mut self, id: i64, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    let challenge = self.round.active()?;
    let correct = error_option_is_correct(challenge, id).ok_or_else(|| SessionError::UnknownOption(id.to_string()))?;
    info!(target: "session", mode = "error_hunter", id, %correct, "Sentence picked");
    self.picked = Some(id);
    self.round.settle(correct);
    if correct {
      score.add_points(Mode::ErrorHunter.reward());
    }
    Ok(correct)
  }
}
