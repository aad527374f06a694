//! Conjugation Dojo: type the subjunctive form of a verb for a given person.

use tracing::info;

use crate::content::ContentError;
use crate::domain::{ConjugationChallenge, Mode};
use crate::evaluate::conjugation_is_correct;
use crate::scoring::ScoreBoard;

use super::{Round, SessionError, Ticket};

#[derive(Debug, Default)]
pub struct ConjugationSession {
  round: Round<ConjugationChallenge>,
  answer: Option<String>,
  hint_shown: bool,
}

impl ConjugationSession {
  pub fn round(&self) -> &Round<ConjugationChallenge> {
    &self.round
  }

  pub fn answer(&self) -> Option<&str> {
    self.answer.as_deref()
  }

  pub fn hint_shown(&self) -> bool {
    self.hint_shown
  }

  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    let ticket = self.round.begin_load()?;
    self.answer = None;
    self.hint_shown = false;
    Ok(ticket)
  }

  pub fn finish_load(&mut self, ticket: Ticket, result: Result<ConjugationChallenge, ContentError>) -> bool {
    self.round.finish_load(ticket, result)
  }

  pub fn abandon(&mut self) {
    self.round.abandon();
    self.answer = None;
    self.hint_shown = false;
  }

  pub fn toggle_hint(&mut self) -> Result<bool, SessionError> {
    self.round.active()?;
    self.hint_shown = !self.hint_shown;
    Ok(self.hint_shown)
  }

  pub fn submit(&mut self, answer: &str, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    let challenge = self.round.active()?;
    if answer.trim().is_empty() {
      return Err(SessionError::EmptyInput);
    }
    let correct = conjugation_is_correct(challenge, answer);
    info!(target: "session", mode = "conjugation_dojo", verb = %challenge.verb, %correct, "Conjugation checked");
    self.answer = Some(answer.trim().to_string());
    self.round.settle(correct);
    if correct {
      score.add_points(Mode::ConjugationDojo.reward());
    }
    Ok(correct)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scoring::MemoryStore;
  use crate::session::Phase;

  fn challenge() -> ConjugationChallenge {
    ConjugationChallenge {
      verb: "tener".into(),
      mood: "Subjuntivo".into(),
      person: "Nosotros".into(),
      tense: "Presente".into(),
      correct_form: "Tengamos".into(),
      hint: "Raíz <b>teng-</b>".into(),
    }
  }

  fn loaded() -> ConjugationSession {
    let mut s = ConjugationSession::default();
    let t = s.begin_load().unwrap();
    assert!(s.finish_load(t, Ok(challenge())));
    s
  }

  #[test]
  fn correct_answer_awards_once() {
    let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
    let mut s = loaded();
    assert_eq!(s.submit(" tengamos ", &mut score), Ok(true));
    assert_eq!(s.round().phase(), Phase::AnsweredCorrect);
    assert_eq!(score.summary().points, 10);
    assert!(s.submit("tengamos", &mut score).is_err());
    assert_eq!(score.summary().points, 10);
  }

  #[test]
  fn wrong_answer_does_not_score() {
    let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
    let mut s = loaded();
    assert_eq!(s.submit("tenga", &mut score), Ok(false));
    assert_eq!(s.round().phase(), Phase::AnsweredIncorrect);
    assert_eq!(s.answer(), Some("tenga"));
    assert_eq!(score.summary().points, 0);
  }

  #[test]
  fn blank_answer_is_rejected_before_checking() {
    let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
    let mut s = loaded();
    assert_eq!(s.submit("   ", &mut score), Err(SessionError::EmptyInput));
    assert_eq!(s.round().phase(), Phase::Active);
  }

  #[test]
  fn hint_resets_on_reload() {
    let mut s = loaded();
    assert_eq!(s.toggle_hint(), Ok(true));
    let t = s.begin_load().unwrap();
    assert!(!s.hint_shown());
    assert_eq!(s.toggle_hint(), Err(SessionError::Busy));
    s.finish_load(t, Ok(challenge()));
    assert!(!s.hint_shown());
  }
}
